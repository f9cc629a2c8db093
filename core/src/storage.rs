//! Durable index storage on top of sled.
//!
//! Four trees mirror the four logical tables of the index layout: posting
//! lists keyed by term id, article records keyed by big-endian document id,
//! JSON-encoded base-form lists keyed by word, and the ordered document
//! position table. Traditional and positional indexes live in independently
//! truncatable databases under the same index directory.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::codec::PostingList;
use crate::corpus::Article;
use crate::error::{IndexError, Result};
use crate::{DocId, IndexFlavor, Position, TermId};

const TERMS_TREE: &str = "indexed_terms";
const ARTICLES_TREE: &str = "articles";
const BASE_FORMS_TREE: &str = "word_base_forms";
const POSITIONS_TREE: &str = "document_positions";

/// Batched read contract the query engine depends on.
///
/// Every getter returns a map restricted to the keys that were found;
/// unresolved keys are simply absent, never an error at this layer.
pub trait IndexStore {
    fn posting_lists(&self, term_ids: &[TermId]) -> Result<HashMap<TermId, PostingList>>;
    fn articles(&self, ids: &[DocId]) -> Result<HashMap<DocId, Article>>;
    fn base_forms(&self, words: &[String]) -> Result<HashMap<String, Vec<String>>>;
    /// Ascending per-document start offsets; positional index only.
    fn document_positions(&self) -> Result<Vec<Position>>;
}

/// sled-backed [`IndexStore`] implementation.
pub struct SledIndexStore {
    db: sled::Db,
    terms: sled::Tree,
    articles: sled::Tree,
    base_forms: sled::Tree,
    positions: sled::Tree,
}

impl SledIndexStore {
    /// Opens (or creates) the database for `flavor` under `index_dir`.
    /// With `truncate_old`, any existing database is deleted first.
    pub fn open(index_dir: &Path, flavor: IndexFlavor, truncate_old: bool) -> Result<Self> {
        let path = Self::database_path(index_dir, flavor);
        if truncate_old && path.exists() {
            std::fs::remove_dir_all(&path)?;
        }
        let db = sled::open(&path)?;
        Ok(Self {
            terms: db.open_tree(TERMS_TREE)?,
            articles: db.open_tree(ARTICLES_TREE)?,
            base_forms: db.open_tree(BASE_FORMS_TREE)?,
            positions: db.open_tree(POSITIONS_TREE)?,
            db,
        })
    }

    fn database_path(index_dir: &Path, flavor: IndexFlavor) -> PathBuf {
        match flavor {
            // Mixed-mode sessions read articles and base forms from the
            // traditional database.
            IndexFlavor::Traditional | IndexFlavor::Mixed => index_dir.join("traditional.sled"),
            IndexFlavor::Positional => index_dir.join("positional.sled"),
        }
    }

    /// Starts a scoped build transaction. Nothing is visible to readers
    /// until [`BuildTransaction::commit`] applies every staged write.
    pub fn begin_build(&self) -> BuildTransaction<'_> {
        BuildTransaction {
            store: self,
            terms: sled::Batch::default(),
            articles: sled::Batch::default(),
            base_forms: sled::Batch::default(),
            positions: sled::Batch::default(),
            seen_terms: HashSet::new(),
            seen_articles: HashSet::new(),
            seen_words: HashSet::new(),
            next_position_index: self.positions.len() as u64,
        }
    }
}

impl IndexStore for SledIndexStore {
    fn posting_lists(&self, term_ids: &[TermId]) -> Result<HashMap<TermId, PostingList>> {
        let mut found = HashMap::new();
        for term_id in term_ids {
            if let Some(bytes) = self.terms.get(term_id.as_bytes())? {
                found.insert(term_id.clone(), PostingList::from_bytes(bytes.to_vec())?);
            }
        }
        Ok(found)
    }

    fn articles(&self, ids: &[DocId]) -> Result<HashMap<DocId, Article>> {
        let mut found = HashMap::new();
        for &id in ids {
            if let Some(bytes) = self.articles.get(id.to_be_bytes())? {
                found.insert(id, bincode::deserialize(&bytes)?);
            }
        }
        Ok(found)
    }

    fn base_forms(&self, words: &[String]) -> Result<HashMap<String, Vec<String>>> {
        let mut found = HashMap::new();
        for word in words {
            if let Some(bytes) = self.base_forms.get(word.as_bytes())? {
                found.insert(word.clone(), serde_json::from_slice(&bytes)?);
            }
        }
        Ok(found)
    }

    fn document_positions(&self) -> Result<Vec<Position>> {
        let mut positions = Vec::with_capacity(self.positions.len());
        // Big-endian keys make sled iteration order the insertion order.
        for entry in self.positions.iter() {
            let (_, value) = entry?;
            positions.push(decode_u64(&value, "document position")?);
        }
        Ok(positions)
    }
}

fn decode_u64(bytes: &[u8], what: &str) -> Result<u64> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| IndexError::CorruptStoredValue(what.to_string()))?;
    Ok(u64::from_be_bytes(array))
}

/// Staged build writes, applied all together on commit.
///
/// Each term, article and word may be inserted at most once per build;
/// duplicates fail the whole build instead of silently overwriting.
pub struct BuildTransaction<'a> {
    store: &'a SledIndexStore,
    terms: sled::Batch,
    articles: sled::Batch,
    base_forms: sled::Batch,
    positions: sled::Batch,
    seen_terms: HashSet<TermId>,
    seen_articles: HashSet<DocId>,
    seen_words: HashSet<String>,
    next_position_index: u64,
}

impl BuildTransaction<'_> {
    pub fn add_indexed_term(&mut self, term_id: &str, posting_list: &PostingList) -> Result<()> {
        if !self.seen_terms.insert(term_id.to_string())
            || self.store.terms.contains_key(term_id.as_bytes())?
        {
            return Err(IndexError::DuplicateKey(format!("term '{term_id}'")));
        }
        self.terms.insert(term_id.as_bytes(), posting_list.as_bytes());
        Ok(())
    }

    pub fn add_article(&mut self, article: &Article) -> Result<()> {
        if !self.seen_articles.insert(article.id)
            || self.store.articles.contains_key(article.id.to_be_bytes())?
        {
            return Err(IndexError::DuplicateKey(format!("article {}", article.id)));
        }
        self.articles
            .insert(&article.id.to_be_bytes(), bincode::serialize(article)?);
        Ok(())
    }

    pub fn add_word_base_forms(&mut self, word: &str, base_forms: &[String]) -> Result<()> {
        if !self.seen_words.insert(word.to_string())
            || self.store.base_forms.contains_key(word.as_bytes())?
        {
            return Err(IndexError::DuplicateKey(format!("word '{word}'")));
        }
        self.base_forms
            .insert(word.as_bytes(), serde_json::to_vec(base_forms)?);
        Ok(())
    }

    pub fn add_document_position(&mut self, position: Position) -> Result<()> {
        self.positions.insert(
            &self.next_position_index.to_be_bytes(),
            &position.to_be_bytes(),
        );
        self.next_position_index += 1;
        Ok(())
    }

    /// Applies every staged batch, then flushes. Dropping the transaction
    /// without committing discards all staged writes.
    pub fn commit(self) -> Result<()> {
        self.store.terms.apply_batch(self.terms)?;
        self.store.articles.apply_batch(self.articles)?;
        self.store.base_forms.apply_batch(self.base_forms)?;
        self.store.positions.apply_batch(self.positions)?;
        self.store.db.flush()?;
        Ok(())
    }
}
