//! Raw query text parsing.
//!
//! In mixed mode, every double-quoted substring becomes a phrase part (in
//! order of appearance) and the remaining text, if any, a single trailing
//! normal part. Single-flavor sessions treat the whole query as one part of
//! their native kind.

use lazy_static::lazy_static;
use regex::Regex;

use crate::IndexFlavor;

lazy_static! {
    static ref PHRASE_RE: Regex = Regex::new(r#"(.*?)"(.*?)"(.*)"#).expect("valid regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Bag-of-words match: every word present, any order, any position.
    Normal,
    /// Exact token-adjacency match against the positional index.
    Phrase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPart {
    pub text: String,
    pub kind: QueryKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Lowercased query text with quotes stripped.
    pub raw_text: String,
    pub parts: Vec<QueryPart>,
}

impl Query {
    pub fn parse(raw: &str, flavor: IndexFlavor) -> Query {
        let lowered = raw.to_lowercase();
        let raw_text = lowered.replace('"', " ").trim().to_string();
        let parts = match flavor {
            IndexFlavor::Traditional => single_part(&raw_text, QueryKind::Normal),
            IndexFlavor::Positional => single_part(&raw_text, QueryKind::Phrase),
            IndexFlavor::Mixed => mixed_parts(&lowered),
        };
        Query { raw_text, parts }
    }
}

fn single_part(text: &str, kind: QueryKind) -> Vec<QueryPart> {
    if text.is_empty() {
        return Vec::new();
    }
    vec![QueryPart {
        text: text.to_string(),
        kind,
    }]
}

fn mixed_parts(lowered: &str) -> Vec<QueryPart> {
    let mut remaining = lowered.to_string();
    let mut parts = Vec::new();
    while let Some(captures) = PHRASE_RE.captures(&remaining) {
        let phrase = captures[2].trim().to_string();
        remaining = format!("{} {}", captures[1].trim(), captures[3].trim());
        if !phrase.is_empty() {
            parts.push(QueryPart {
                text: phrase,
                kind: QueryKind::Phrase,
            });
        }
    }
    let leftover = remaining.replace('"', " ");
    let leftover = leftover.trim();
    if !leftover.is_empty() {
        parts.push(QueryPart {
            text: leftover.to_string(),
            kind: QueryKind::Normal,
        });
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traditional_query_is_one_normal_part() {
        let query = Query::parse("Brown Fox", IndexFlavor::Traditional);
        assert_eq!(query.raw_text, "brown fox");
        assert_eq!(
            query.parts,
            vec![QueryPart {
                text: "brown fox".into(),
                kind: QueryKind::Normal
            }]
        );
    }

    #[test]
    fn positional_query_is_one_phrase_part() {
        let query = Query::parse("brown fox", IndexFlavor::Positional);
        assert_eq!(query.parts[0].kind, QueryKind::Phrase);
    }

    #[test]
    fn mixed_query_extracts_phrases_then_normal_remainder() {
        let query = Query::parse(r#"alpha "data structures" beta "fast lookup""#, IndexFlavor::Mixed);
        assert_eq!(
            query.parts,
            vec![
                QueryPart {
                    text: "data structures".into(),
                    kind: QueryKind::Phrase
                },
                QueryPart {
                    text: "fast lookup".into(),
                    kind: QueryKind::Phrase
                },
                QueryPart {
                    text: "alpha beta".into(),
                    kind: QueryKind::Normal
                },
            ]
        );
        assert_eq!(query.raw_text, "alpha  data structures  beta  fast lookup");
    }

    #[test]
    fn empty_query_has_no_parts() {
        assert!(Query::parse("   ", IndexFlavor::Mixed).parts.is_empty());
        assert!(Query::parse("", IndexFlavor::Traditional).parts.is_empty());
    }

    #[test]
    fn empty_phrase_is_dropped() {
        let query = Query::parse(r#""" fox"#, IndexFlavor::Mixed);
        assert_eq!(
            query.parts,
            vec![QueryPart {
                text: "fox".into(),
                kind: QueryKind::Normal
            }]
        );
    }
}
