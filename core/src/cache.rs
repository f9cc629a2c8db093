//! Read-through memoization over an [`IndexStore`].
//!
//! A long-running query session touches the same terms, words and articles
//! over and over; each distinct (operation, key) pair is resolved against the
//! underlying store at most once per process, in a single batched fetch for
//! all misses of a request. Entries live for the process lifetime, there is
//! no eviction.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;

use crate::codec::PostingList;
use crate::corpus::Article;
use crate::error::{IndexError, Result};
use crate::storage::IndexStore;
use crate::{DocId, Position, TermId};

/// Memoizing decorator. Interior mutability keeps the [`IndexStore`] getters
/// `&self`; the session is single-threaded by contract, so `RefCell` borrows
/// never overlap.
pub struct CachingIndexStore<S: IndexStore> {
    inner: S,
    posting_lists: RefCell<HashMap<TermId, PostingList>>,
    articles: RefCell<HashMap<DocId, Article>>,
    base_forms: RefCell<HashMap<String, Vec<String>>>,
    positions: RefCell<Option<Vec<Position>>>,
}

impl<S: IndexStore> CachingIndexStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            posting_lists: RefCell::new(HashMap::new()),
            articles: RefCell::new(HashMap::new()),
            base_forms: RefCell::new(HashMap::new()),
            positions: RefCell::new(None),
        }
    }
}

/// Resolves a batch of keys against `cache`, fetching every distinct miss in
/// one call. A key the fetch did not return is filled from `default` when one
/// is semantically valid, and is an error otherwise.
fn resolve_batch<K, V>(
    cache: &RefCell<HashMap<K, V>>,
    keys: &[K],
    fetch: impl FnOnce(&[K]) -> Result<HashMap<K, V>>,
    default: Option<fn() -> V>,
) -> Result<HashMap<K, V>>
where
    K: Eq + Hash + Clone + Display,
    V: Clone,
{
    let missing: Vec<K> = {
        let cache = cache.borrow();
        let mut seen = HashSet::new();
        keys.iter()
            .filter(|key| !cache.contains_key(key) && seen.insert((*key).clone()))
            .cloned()
            .collect()
    };

    if !missing.is_empty() {
        let mut fetched = fetch(&missing)?;
        let mut cache = cache.borrow_mut();
        for key in missing {
            let value = match fetched.remove(&key) {
                Some(value) => value,
                None => match default {
                    Some(make_default) => make_default(),
                    None => return Err(IndexError::UnresolvedKey(key.to_string())),
                },
            };
            cache.insert(key, value);
        }
    }

    let cache = cache.borrow();
    let mut resolved = HashMap::with_capacity(keys.len());
    for key in keys {
        let value = cache
            .get(key)
            .cloned()
            .ok_or_else(|| IndexError::UnresolvedKey(key.to_string()))?;
        resolved.insert(key.clone(), value);
    }
    Ok(resolved)
}

impl<S: IndexStore> IndexStore for CachingIndexStore<S> {
    /// A term absent from the index resolves to an empty posting list.
    fn posting_lists(&self, term_ids: &[TermId]) -> Result<HashMap<TermId, PostingList>> {
        resolve_batch(
            &self.posting_lists,
            term_ids,
            |missing| self.inner.posting_lists(missing),
            Some(PostingList::new),
        )
    }

    /// A missing article means the index references a document that was never
    /// stored; there is no sane default.
    fn articles(&self, ids: &[DocId]) -> Result<HashMap<DocId, Article>> {
        resolve_batch(
            &self.articles,
            ids,
            |missing| self.inner.articles(missing),
            None,
        )
    }

    /// A word without a dictionary entry resolves to no base forms.
    fn base_forms(&self, words: &[String]) -> Result<HashMap<String, Vec<String>>> {
        resolve_batch(
            &self.base_forms,
            words,
            |missing| self.inner.base_forms(missing),
            Some(Vec::new),
        )
    }

    fn document_positions(&self) -> Result<Vec<Position>> {
        if let Some(positions) = self.positions.borrow().as_ref() {
            return Ok(positions.clone());
        }
        let fetched = self.inner.document_positions()?;
        *self.positions.borrow_mut() = Some(fetched.clone());
        Ok(fetched)
    }
}
