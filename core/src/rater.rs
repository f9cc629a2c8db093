//! Search-result scoring.

use std::collections::HashSet;

use crate::corpus::{base_forms_for_token, tokenize, Article};
use crate::error::Result;
use crate::storage::IndexStore;
use crate::terms::TermIdentifierMap;
use crate::TermId;

/// Title matches matter far more than body matches.
const TITLE_MATCH_WEIGHT: f64 = 5.0;
const CONTENT_MATCH_WEIGHT: f64 = 3.0;
const TITLE_RUN_WEIGHT: f64 = 2.0;
const CONTENT_RUN_WEIGHT: f64 = 1.0;
/// Soft tie-breaker: lower (older) article ids decay slightly.
const ID_RATING_FALL_RATE: f64 = 1e-5;

/// Scores a candidate article against the query's term ids. Higher is
/// better; the score is used purely as a sort key.
pub struct ResultRater<'a, S: IndexStore> {
    store: &'a S,
    term_map: &'a TermIdentifierMap,
    query_term_ids: &'a HashSet<TermId>,
}

impl<'a, S: IndexStore> ResultRater<'a, S> {
    pub fn new(
        store: &'a S,
        term_map: &'a TermIdentifierMap,
        query_term_ids: &'a HashSet<TermId>,
    ) -> Self {
        Self {
            store,
            term_map,
            query_term_ids,
        }
    }

    pub fn rate(&self, article: &Article) -> Result<f64> {
        let title_matches = self.matched_term_ids_per_token(&article.title)?;
        let content_matches = self.matched_term_ids_per_token(&article.content)?;
        Ok(distinct_matches(&title_matches) as f64 * TITLE_MATCH_WEIGHT
            + distinct_matches(&content_matches) as f64 * CONTENT_MATCH_WEIGHT
            + run_bonus(&title_matches, TITLE_RUN_WEIGHT)
            + run_bonus(&content_matches, CONTENT_RUN_WEIGHT)
            + (-(article.id as f64) * ID_RATING_FALL_RATE).exp())
    }

    /// For each token of `text`, the query term ids it matches (possibly
    /// none). Base forms come through the store so the rater sees the same
    /// normalization the index was built with.
    fn matched_term_ids_per_token(&self, text: &str) -> Result<Vec<Vec<TermId>>> {
        let tokens = tokenize(text);
        let dictionary = self.store.base_forms(&tokens)?;
        Ok(tokens
            .iter()
            .map(|token| {
                base_forms_for_token(&dictionary, token)
                    .into_iter()
                    .map(|base| self.term_map.resolve(&base))
                    .filter(|term_id| self.query_term_ids.contains(term_id))
                    .collect()
            })
            .collect())
    }
}

fn distinct_matches(matches: &[Vec<TermId>]) -> usize {
    matches
        .iter()
        .flatten()
        .collect::<HashSet<_>>()
        .len()
}

/// Rewards consecutive matching tokens super-linearly: each matching token
/// adds `run_length_so_far * weight` before extending the run, so a three
/// word exact phrase outscores three scattered single-word hits.
fn run_bonus(matches: &[Vec<TermId>], weight: f64) -> f64 {
    let mut bonus = 0.0;
    let mut run: u64 = 0;
    for token_matches in matches {
        if token_matches.is_empty() {
            run = 0;
        } else {
            bonus += run as f64 * weight;
            run += 1;
        }
    }
    bonus
}
