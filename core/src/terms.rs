use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{IndexError, Result};
use crate::TermId;

/// Cluster id assigned to terms absent from the clustering table.
pub const DEFAULT_CLUSTER: &str = "0";

/// Maps a normalized term to the key its posting list is stored under.
///
/// `Identity` keeps the full vocabulary; `Clustered` applies a many-to-one
/// table that trades retrieval precision for a smaller index.
#[derive(Debug, Clone)]
pub enum TermIdentifierMap {
    Identity,
    Clustered(HashMap<String, String>),
}

impl TermIdentifierMap {
    pub fn identity() -> Self {
        TermIdentifierMap::Identity
    }

    /// Loads a clustering table from whitespace-delimited `term cluster_id`
    /// lines. Blank lines are ignored.
    pub fn from_clusters_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut clusters = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some(term), Some(cluster)) => {
                    clusters.insert(term.to_string(), cluster.to_string());
                }
                _ => return Err(IndexError::MalformedDictionaryLine(line.to_string())),
            }
        }
        Ok(TermIdentifierMap::Clustered(clusters))
    }

    pub fn resolve(&self, term: &str) -> TermId {
        match self {
            TermIdentifierMap::Identity => term.to_string(),
            TermIdentifierMap::Clustered(clusters) => clusters
                .get(term)
                .cloned()
                .unwrap_or_else(|| DEFAULT_CLUSTER.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_maps_terms_to_themselves() {
        let map = TermIdentifierMap::identity();
        assert_eq!(map.resolve("kangaroo"), "kangaroo");
    }

    #[test]
    fn clustered_maps_unknown_terms_to_default_bucket() {
        let mut table = HashMap::new();
        table.insert("cat".to_string(), "17".to_string());
        let map = TermIdentifierMap::Clustered(table);
        assert_eq!(map.resolve("cat"), "17");
        assert_eq!(map.resolve("dog"), DEFAULT_CLUSTER);
    }
}
