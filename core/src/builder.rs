//! Batch index construction.
//!
//! Documents are processed strictly in ascending id order; posting-list
//! appends encode that order into the byte stream, so an out-of-order corpus
//! fails fast instead of producing a corrupt index. All output for one
//! database goes through a single build transaction: articles first, then
//! posting lists, then (positional only) document boundaries, then the
//! base-form dictionary snapshot.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use crate::codec::{self, PostingList, DEFAULT_BASE};
use crate::corpus::{base_forms_for_token, tokenize, Article};
use crate::error::Result;
use crate::storage::SledIndexStore;
use crate::terms::TermIdentifierMap;
use crate::{IndexFlavor, Position, TermId};

#[derive(Debug, Clone, Copy)]
pub struct BuildConfig {
    pub flavor: IndexFlavor,
    /// Delete any existing database before building.
    pub truncate_old: bool,
}

/// Builds the configured index flavor(s) under `index_dir`. Mixed mode
/// builds the traditional and positional databases in sequence.
pub fn build_index(
    index_dir: &Path,
    config: BuildConfig,
    articles: &[Article],
    dictionary: &HashMap<String, Vec<String>>,
    term_map: &TermIdentifierMap,
) -> Result<()> {
    match config.flavor {
        IndexFlavor::Traditional | IndexFlavor::Positional => build_flavor(
            index_dir,
            config.flavor,
            config.truncate_old,
            articles,
            dictionary,
            term_map,
        ),
        IndexFlavor::Mixed => {
            build_flavor(
                index_dir,
                IndexFlavor::Traditional,
                config.truncate_old,
                articles,
                dictionary,
                term_map,
            )?;
            build_flavor(
                index_dir,
                IndexFlavor::Positional,
                config.truncate_old,
                articles,
                dictionary,
                term_map,
            )
        }
    }
}

fn build_flavor(
    index_dir: &Path,
    flavor: IndexFlavor,
    truncate_old: bool,
    articles: &[Article],
    dictionary: &HashMap<String, Vec<String>>,
    term_map: &TermIdentifierMap,
) -> Result<()> {
    tracing::info!(?flavor, articles = articles.len(), "building index");
    let store = SledIndexStore::open(index_dir, flavor, truncate_old)?;
    let mut tx = store.begin_build();

    for article in articles {
        tx.add_article(article)?;
    }

    match flavor {
        IndexFlavor::Traditional => {
            let lists = traditional_posting_lists(articles, dictionary, term_map, DEFAULT_BASE)?;
            tracing::info!(terms = lists.len(), "saving posting lists");
            for (term_id, list) in &lists {
                tx.add_indexed_term(term_id, list)?;
            }
        }
        IndexFlavor::Positional => {
            let (lists, boundaries) = positional_posting_lists(articles, dictionary, term_map)?;
            tracing::info!(terms = lists.len(), "saving posting lists");
            for (term_id, list) in &lists {
                tx.add_indexed_term(term_id, list)?;
            }
            for &boundary in &boundaries {
                tx.add_document_position(boundary)?;
            }
        }
        IndexFlavor::Mixed => unreachable!("mixed builds are split by build_index"),
    }

    for (word, base_forms) in dictionary.iter().collect::<BTreeMap<_, _>>() {
        tx.add_word_base_forms(word, base_forms)?;
    }

    tx.commit()?;
    tracing::info!(?flavor, "index committed");
    Ok(())
}

/// Term -> document-id posting lists. Every distinct base form of a
/// document's title and content receives that document's id once.
pub fn traditional_posting_lists(
    articles: &[Article],
    dictionary: &HashMap<String, Vec<String>>,
    term_map: &TermIdentifierMap,
    base: u32,
) -> Result<BTreeMap<TermId, PostingList>> {
    codec::validate_base(base)?;
    let mut lists: BTreeMap<TermId, PostingList> = BTreeMap::new();
    for article in articles {
        let text = format!("{} {}", article.title, article.content);
        let mut article_terms: BTreeSet<TermId> = BTreeSet::new();
        for word in tokenize(&text) {
            for base_form in base_forms_for_token(dictionary, &word) {
                article_terms.insert(term_map.resolve(&base_form));
            }
        }
        for term_id in article_terms {
            let list = match lists.entry(term_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(PostingList::with_base(base)?),
            };
            list.append_guarded(article.id)?;
        }
    }
    Ok(lists)
}

/// Term -> global-token-position posting lists plus the per-document start
/// boundary table. The counter starts at 1 (posting-list values must be
/// positive) and leaves a one-position gap between documents so a phrase can
/// never straddle a document boundary.
pub fn positional_posting_lists(
    articles: &[Article],
    dictionary: &HashMap<String, Vec<String>>,
    term_map: &TermIdentifierMap,
) -> Result<(BTreeMap<TermId, PostingList>, Vec<Position>)> {
    let mut lists: BTreeMap<TermId, PostingList> = BTreeMap::new();
    let mut boundaries = Vec::with_capacity(articles.len());
    let mut position: Position = 1;
    for article in articles {
        boundaries.push(position);
        let text = format!("{} {}", article.title, article.content);
        for word in tokenize(&text) {
            for base_form in base_forms_for_token(dictionary, &word) {
                let term_id = term_map.resolve(&base_form);
                lists
                    .entry(term_id)
                    .or_default()
                    .append_guarded(position)?;
            }
            position += 1;
        }
        position += 1;
    }
    Ok((lists, boundaries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: u64, title: &str, content: &str) -> Article {
        Article {
            id,
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    fn no_dictionary() -> HashMap<String, Vec<String>> {
        HashMap::new()
    }

    #[test]
    fn traditional_lists_hold_each_document_once() {
        let articles = vec![
            article(1, "Cats", "cats cats cats"),
            article(2, "Dogs", "dogs and cats"),
        ];
        let lists = traditional_posting_lists(
            &articles,
            &no_dictionary(),
            &TermIdentifierMap::identity(),
            DEFAULT_BASE,
        )
        .unwrap();
        assert_eq!(lists["cats"].decode().unwrap().items(), &[1, 2]);
        assert_eq!(lists["dogs"].decode().unwrap().items(), &[2]);
    }

    #[test]
    fn dictionary_maps_words_to_base_forms() {
        let articles = vec![article(1, "Running", "ran")];
        let mut dictionary = HashMap::new();
        dictionary.insert("running".to_string(), vec!["run".to_string()]);
        dictionary.insert("ran".to_string(), vec!["run".to_string()]);
        let lists = traditional_posting_lists(
            &articles,
            &dictionary,
            &TermIdentifierMap::identity(),
            DEFAULT_BASE,
        )
        .unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists["run"].decode().unwrap().items(), &[1]);
    }

    #[test]
    fn positional_lists_leave_a_gap_between_documents() {
        let articles = vec![
            article(1, "a", "b c"),
            article(2, "d", "e"),
        ];
        let (lists, boundaries) = positional_posting_lists(
            &articles,
            &no_dictionary(),
            &TermIdentifierMap::identity(),
        )
        .unwrap();
        // Doc 1 tokens at 1..=3, gap at 4, doc 2 tokens at 5..=6.
        assert_eq!(boundaries, vec![1, 5]);
        assert_eq!(lists["a"].decode().unwrap().items(), &[1]);
        assert_eq!(lists["c"].decode().unwrap().items(), &[3]);
        assert_eq!(lists["d"].decode().unwrap().items(), &[5]);
        assert_eq!(lists["e"].decode().unwrap().items(), &[6]);
    }

    #[test]
    fn clustering_merges_terms_into_one_list() {
        let articles = vec![article(1, "cat", ""), article(2, "dog", "")];
        let mut table = HashMap::new();
        table.insert("cat".to_string(), "7".to_string());
        table.insert("dog".to_string(), "7".to_string());
        let lists = traditional_posting_lists(
            &articles,
            &no_dictionary(),
            &TermIdentifierMap::Clustered(table),
            DEFAULT_BASE,
        )
        .unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists["7"].decode().unwrap().items(), &[1, 2]);
    }
}
