use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the index and scoring layers.
#[derive(Debug, Error)]
pub enum Error {
    /// A lookup key did not normalize to exactly one index term.
    #[error("invalid term {term:?}: expected exactly one index term, got {tokens:?}")]
    InvalidTerm { term: String, tokens: Vec<String> },

    /// The persisted index is missing, partial or unreadable.
    #[error("index cache at {} is unavailable: {reason} (run `build` first)", path.display())]
    CacheUnavailable { path: PathBuf, reason: String },

    /// BM25 parameters outside `k1 >= 0`, `0 <= b <= 1`.
    #[error("invalid BM25 parameters k1={k1}, b={b}: need k1 >= 0 and 0 <= b <= 1")]
    InvalidParameters { k1: f64, b: f64 },

    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("encoding error: {0}")]
    Encode(#[from] bincode::Error),
}

impl Error {
    pub(crate) fn cache_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::CacheUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
