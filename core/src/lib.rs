pub mod builder;
pub mod cache;
pub mod codec;
pub mod corpus;
pub mod error;
pub mod ordered;
pub mod planner;
pub mod query;
pub mod rater;
pub mod storage;
pub mod terms;

pub use error::{IndexError, Result};

/// 1-based article identifier, assigned by corpus file order.
pub type DocId = u64;
/// Global token offset within the positional index.
pub type Position = u64;
/// Posting-list key: the term itself, or a cluster id when clustering is on.
pub type TermId = String;

/// Which physical index structures a build or a query session operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFlavor {
    /// Document-granularity inverted index (term -> document ids).
    Traditional,
    /// Token-granularity inverted index (term -> global token positions).
    Positional,
    /// Both structures, enabling quoted-phrase parts inside normal queries.
    Mixed,
}
