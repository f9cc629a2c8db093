use thiserror::Error;

/// Error type for index build and query operations.
///
/// Build-time variants abort the whole build; query-time variants abort only
/// the current query. Unknown query terms and empty results are not errors
/// and never surface here.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("appended value {value} must be greater than the last element {last}")]
    NonMonotonicAppend { last: u64, value: u64 },

    #[error("value to be encoded must be positive")]
    NonPositiveValue,

    #[error("coding base must be in 2..=128, got {0}")]
    InvalidBase(u32),

    #[error("corrupt posting bytes: byte {byte} is out of range for base {base}")]
    CorruptPostingBytes { byte: u8, base: u32 },

    #[error("corrupt posting bytes: unterminated trailing value")]
    UnterminatedValue,

    #[error("sequence is not strictly increasing at index {0}")]
    UnorderedSequence(usize),

    #[error("cannot resolve key: {0}")]
    UnresolvedKey(String),

    #[error("duplicate key inserted during build: {0}")]
    DuplicateKey(String),

    #[error("malformed article {ordinal}: missing TITLE marker")]
    MalformedArticle { ordinal: u64 },

    #[error("malformed dictionary line: {0}")]
    MalformedDictionaryLine(String),

    #[error("corrupt stored value for {0}")]
    CorruptStoredValue(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, IndexError>;
