//! Storage errors

use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record not found
    #[error("record not found")]
    NotFound,

    /// Storage layer failure. Always surfaced, never swallowed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
