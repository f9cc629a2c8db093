//! Query resolution against the index structures.
//!
//! A query is parsed into parts, each word is expanded to its base forms and
//! term ids, and every part is resolved against the traditional (normal
//! parts) or positional (phrase parts) structures. Part results are
//! intersected, candidates fetched and rated, and the ranked list returned.

use std::collections::HashSet;

use crate::cache::CachingIndexStore;
use crate::corpus::{tokenize, Article};
use crate::error::{IndexError, Result};
use crate::ordered::OrderedSet;
use crate::query::{Query, QueryKind};
use crate::rater::ResultRater;
use crate::storage::IndexStore;
use crate::terms::TermIdentifierMap;
use crate::{DocId, IndexFlavor, Position, TermId};

/// A query word with the term ids its base forms resolve to.
#[derive(Debug, Clone)]
pub struct WordExpansion {
    pub word: String,
    pub term_ids: Vec<TermId>,
}

/// One ranked search hit.
#[derive(Debug, Clone)]
pub struct RatedArticle {
    pub article: Article,
    pub rating: f64,
}

/// Everything a presentation layer needs to render one query's results.
#[derive(Debug)]
pub struct SearchOutcome {
    pub query: Query,
    pub query_term_ids: HashSet<TermId>,
    pub results: Vec<RatedArticle>,
}

enum Stores<S: IndexStore> {
    Traditional(CachingIndexStore<S>),
    Positional(CachingIndexStore<S>),
    Mixed {
        traditional: CachingIndexStore<S>,
        positional: CachingIndexStore<S>,
    },
}

pub struct QueryPlanner<S: IndexStore> {
    term_map: TermIdentifierMap,
    stores: Stores<S>,
}

impl<S: IndexStore> QueryPlanner<S> {
    pub fn traditional(store: S, term_map: TermIdentifierMap) -> Self {
        Self {
            term_map,
            stores: Stores::Traditional(CachingIndexStore::new(store)),
        }
    }

    pub fn positional(store: S, term_map: TermIdentifierMap) -> Self {
        Self {
            term_map,
            stores: Stores::Positional(CachingIndexStore::new(store)),
        }
    }

    pub fn mixed(traditional: S, positional: S, term_map: TermIdentifierMap) -> Self {
        Self {
            term_map,
            stores: Stores::Mixed {
                traditional: CachingIndexStore::new(traditional),
                positional: CachingIndexStore::new(positional),
            },
        }
    }

    pub fn term_map(&self) -> &TermIdentifierMap {
        &self.term_map
    }

    pub fn flavor(&self) -> IndexFlavor {
        match &self.stores {
            Stores::Traditional(_) => IndexFlavor::Traditional,
            Stores::Positional(_) => IndexFlavor::Positional,
            Stores::Mixed { .. } => IndexFlavor::Mixed,
        }
    }

    /// Store serving articles and base forms.
    pub fn docs_store(&self) -> &CachingIndexStore<S> {
        match &self.stores {
            Stores::Traditional(store) => store,
            Stores::Positional(store) => store,
            Stores::Mixed { traditional, .. } => traditional,
        }
    }

    fn traditional_store(&self) -> Result<&CachingIndexStore<S>> {
        match &self.stores {
            Stores::Traditional(store) => Ok(store),
            Stores::Mixed { traditional, .. } => Ok(traditional),
            Stores::Positional(_) => Err(IndexError::Configuration(
                "normal query part requires a traditional index".to_string(),
            )),
        }
    }

    fn positional_store(&self) -> Result<&CachingIndexStore<S>> {
        match &self.stores {
            Stores::Positional(store) => Ok(store),
            Stores::Mixed { positional, .. } => Ok(positional),
            Stores::Traditional(_) => Err(IndexError::Configuration(
                "phrase query part requires a positional index".to_string(),
            )),
        }
    }

    /// Resolves, fetches and ranks. Query-time failures abort only this
    /// query; the caller's loop keeps accepting further queries.
    pub fn search(&self, raw_query: &str) -> Result<SearchOutcome> {
        let query = Query::parse(raw_query, self.flavor());
        let expansions = self.expand(&query.raw_text)?;
        let query_term_ids: HashSet<TermId> = expansions
            .iter()
            .flat_map(|expansion| expansion.term_ids.iter().cloned())
            .collect();

        let matches = self.matching_documents(&query)?;
        let ids: Vec<DocId> = matches.iter().collect();
        let mut fetched = self.docs_store().articles(&ids)?;

        let rater = ResultRater::new(self.docs_store(), &self.term_map, &query_term_ids);
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(article) = fetched.remove(&id) {
                let rating = rater.rate(&article)?;
                results.push(RatedArticle { article, rating });
            }
        }
        // Stable sort keeps ascending-id input order on ties.
        results.sort_by(|a, b| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::debug!(
            query = %query.raw_text,
            hits = results.len(),
            "query resolved"
        );
        Ok(SearchOutcome {
            query,
            query_term_ids,
            results,
        })
    }

    /// Document ids matching every part of the query. Zero resolved parts
    /// yield the empty set.
    pub fn matching_documents(&self, query: &Query) -> Result<OrderedSet> {
        let mut part_sets = Vec::with_capacity(query.parts.len());
        for part in &query.parts {
            let expansions = self.expand(&part.text)?;
            let set = match part.kind {
                QueryKind::Normal => self.resolve_normal(&expansions)?,
                QueryKind::Phrase => self.resolve_phrase(&expansions)?,
            };
            part_sets.push(set);
        }
        Ok(part_sets
            .into_iter()
            .reduce(|a, b| a.intersect(&b))
            .unwrap_or_else(OrderedSet::empty))
    }

    /// Expands whitespace words to base forms (literal-word fallback for
    /// unknown words) and maps each through the term identifier map.
    fn expand(&self, text: &str) -> Result<Vec<WordExpansion>> {
        let words = tokenize(text);
        let dictionary = self.docs_store().base_forms(&words)?;
        let mut expansions = Vec::with_capacity(words.len());
        for word in words {
            let base_forms = match dictionary.get(&word) {
                Some(bases) if !bases.is_empty() => bases.clone(),
                _ => vec![word.clone()],
            };
            let mut term_ids: Vec<TermId> = Vec::new();
            for base in base_forms {
                let term_id = self.term_map.resolve(&base);
                if !term_ids.contains(&term_id) {
                    term_ids.push(term_id);
                }
            }
            expansions.push(WordExpansion { word, term_ids });
        }
        Ok(expansions)
    }

    /// A word matches wherever any of its base forms occurs (union); all
    /// words of the part must be present (intersection).
    fn resolve_normal(&self, expansions: &[WordExpansion]) -> Result<OrderedSet> {
        let store = self.traditional_store()?;
        let lists = store.posting_lists(&collect_term_ids(expansions))?;
        let mut word_sets = Vec::with_capacity(expansions.len());
        for expansion in expansions {
            let mut merged = OrderedSet::empty();
            for term_id in &expansion.term_ids {
                if let Some(list) = lists.get(term_id) {
                    merged = merged.union(&list.decode()?);
                }
            }
            word_sets.push(merged);
        }
        Ok(word_sets
            .into_iter()
            .reduce(|a, b| a.intersect(&b))
            .unwrap_or_else(OrderedSet::empty))
    }

    /// Aligns each phrase word's positions to the phrase start by shifting
    /// them down by the word's ordinal; a position surviving the intersection
    /// is the exact start of a verbatim occurrence.
    fn resolve_phrase(&self, expansions: &[WordExpansion]) -> Result<OrderedSet> {
        let store = self.positional_store()?;
        let lists = store.posting_lists(&collect_term_ids(expansions))?;
        let mut aligned = Vec::with_capacity(expansions.len());
        for (ordinal, expansion) in expansions.iter().enumerate() {
            let mut merged = OrderedSet::empty();
            for term_id in &expansion.term_ids {
                if let Some(list) = lists.get(term_id) {
                    merged = merged.union(&list.decode()?);
                }
            }
            aligned.push(merged.shift_down(ordinal as u64));
        }
        let starts = aligned
            .into_iter()
            .reduce(|a, b| a.intersect(&b))
            .unwrap_or_else(OrderedSet::empty);
        if starts.is_empty() {
            return Ok(OrderedSet::empty());
        }

        let boundaries = store.document_positions()?;
        if boundaries.is_empty() {
            return Ok(OrderedSet::empty());
        }
        let mut doc_ids: Vec<DocId> = Vec::new();
        for position in starts.iter() {
            let doc_id = (owning_document_index(&boundaries, position) + 1) as DocId;
            // Positions ascend, so duplicates from multiple hits in one
            // document are always adjacent.
            if doc_ids.last() != Some(&doc_id) {
                doc_ids.push(doc_id);
            }
        }
        OrderedSet::new(doc_ids)
    }
}

fn collect_term_ids(expansions: &[WordExpansion]) -> Vec<TermId> {
    let mut term_ids: Vec<TermId> = Vec::new();
    for expansion in expansions {
        for term_id in &expansion.term_ids {
            if !term_ids.contains(term_id) {
                term_ids.push(term_id.clone());
            }
        }
    }
    term_ids
}

/// Index of the document owning `position`: the greatest `i` with
/// `boundaries[i] <= position`. A position equal to a boundary belongs to
/// that boundary's document. Ceiling midpoint keeps the two-element range
/// from looping forever.
pub fn owning_document_index(boundaries: &[Position], position: Position) -> usize {
    let mut start = 0;
    let mut end = boundaries.len().saturating_sub(1);
    while start < end {
        let middle = (start + end + 1) / 2;
        if boundaries[middle] > position {
            end = middle - 1;
        } else {
            start = middle;
        }
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_search_resolves_documents() {
        let boundaries = [0, 3, 7];
        assert_eq!(owning_document_index(&boundaries, 0), 0);
        assert_eq!(owning_document_index(&boundaries, 2), 0);
        assert_eq!(owning_document_index(&boundaries, 3), 1);
        assert_eq!(owning_document_index(&boundaries, 6), 1);
        assert_eq!(owning_document_index(&boundaries, 7), 2);
        assert_eq!(owning_document_index(&boundaries, 100), 2);
    }

    #[test]
    fn boundary_search_handles_tiny_tables() {
        assert_eq!(owning_document_index(&[5], 9), 0);
        assert_eq!(owning_document_index(&[1, 4], 3), 0);
        assert_eq!(owning_document_index(&[1, 4], 4), 1);
    }
}
