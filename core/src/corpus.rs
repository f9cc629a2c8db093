//! Corpus and base-form dictionary readers.
//!
//! Articles live in a plain-text file, separated by a blank-line pair; each
//! article opens with a `TITLE: <text>` line. The dictionary maps surface
//! words to their morphological base forms, one `base;word;...` line each.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::DocId;

lazy_static! {
    static ref TITLE_RE: Regex = Regex::new(r"^TITLE: (.*)").expect("valid regex");
}

/// A single encyclopedia article. Immutable once created; identity is the
/// 1-based `id` assigned by file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: DocId,
    pub title: String,
    pub content: String,
}

/// Splits text into lowercase whitespace-delimited tokens.
///
/// Phrase alignment relies on indexing and querying tokenizing identically,
/// so this is the only tokenizer in the crate.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| word.to_string())
        .collect()
}

/// Base forms of a single token: the dictionary entry when one exists, the
/// literal token otherwise.
pub fn base_forms_for_token(dictionary: &HashMap<String, Vec<String>>, word: &str) -> Vec<String> {
    match dictionary.get(word) {
        Some(bases) if !bases.is_empty() => bases.clone(),
        _ => vec![word.to_string()],
    }
}

/// Reads the whole corpus, assigning ids 1-based by file order. A malformed
/// article aborts the read; the build must not silently skip entries.
pub fn read_articles(path: &Path) -> Result<Vec<Article>> {
    let text = fs::read_to_string(path)?;
    let mut articles = Vec::new();
    for chunk in text.split("\n\n\n") {
        if chunk.trim().is_empty() {
            continue;
        }
        let id = (articles.len() + 1) as DocId;
        articles.push(parse_article(id, chunk)?);
    }
    Ok(articles)
}

fn parse_article(id: DocId, chunk: &str) -> Result<Article> {
    let mut lines = chunk.lines().skip_while(|line| line.trim().is_empty());
    let first = lines
        .next()
        .ok_or(IndexError::MalformedArticle { ordinal: id })?;
    let captures = TITLE_RE
        .captures(first.trim())
        .ok_or(IndexError::MalformedArticle { ordinal: id })?;
    let content = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    Ok(Article {
        id,
        title: captures[1].to_string(),
        content,
    })
}

/// Reads the base-form dictionary: `base;word;...` lines, first two fields
/// only. Multiple lines may map one surface word to several base forms.
pub fn read_base_forms(path: &Path) -> Result<HashMap<String, Vec<String>>> {
    let text = fs::read_to_string(path)?;
    let mut dictionary: HashMap<String, Vec<String>> = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split(';');
        match (fields.next(), fields.next()) {
            (Some(base), Some(word)) if !base.is_empty() && !word.is_empty() => {
                dictionary
                    .entry(word.to_string())
                    .or_default()
                    .push(base.to_string());
            }
            _ => return Err(IndexError::MalformedDictionaryLine(line.to_string())),
        }
    }
    Ok(dictionary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_articles_with_one_based_ids() {
        let file = write_temp(
            "TITLE: First\nalpha beta\ngamma\n\n\nTITLE: Second\ndelta epsilon\n",
        );
        let articles = read_articles(file.path()).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].id, 1);
        assert_eq!(articles[0].title, "First");
        assert_eq!(articles[0].content, "alpha beta\ngamma");
        assert_eq!(articles[1].id, 2);
        assert_eq!(articles[1].title, "Second");
    }

    #[test]
    fn missing_title_marker_is_fatal() {
        let file = write_temp("First\nalpha beta\n");
        assert!(matches!(
            read_articles(file.path()),
            Err(IndexError::MalformedArticle { ordinal: 1 })
        ));
    }

    #[test]
    fn reads_multi_valued_base_forms() {
        let file = write_temp("run;ran;extra\nrun;running\nrunning;running\n");
        let dictionary = read_base_forms(file.path()).unwrap();
        assert_eq!(dictionary["ran"], vec!["run"]);
        assert_eq!(dictionary["running"], vec!["run", "running"]);
    }

    #[test]
    fn unknown_word_falls_back_to_itself() {
        let dictionary = HashMap::new();
        assert_eq!(base_forms_for_token(&dictionary, "fox"), vec!["fox"]);
    }

    #[test]
    fn tokenize_lowercases_and_splits_on_whitespace() {
        assert_eq!(
            tokenize("The Quick\n Brown  fox"),
            vec!["the", "quick", "brown", "fox"]
        );
    }
}
