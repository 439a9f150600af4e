//! Error taxonomy shared by the storage, index, and search layers.
//!
//! `NotFound` always surfaces unchanged so callers can map it to a 404.
//! Similarity failures (`DimensionMismatch`) are recovered inside the search
//! pipeline, where an incomparable pair simply scores 0; they only escape
//! when a caller compares two records directly.

use thiserror::Error;

/// Result type alias for shardvec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The identifier is absent from its owning shard.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Malformed record or out-of-range request parameter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Two operands disagree on embedding length or compression state.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The embedded key-value engine or its filesystem failed (I/O,
    /// corruption, closed handle).
    #[error("storage error: {0}")]
    Storage(String),

    /// A record envelope failed to encode or decode.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
