//! Storage error types.

use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database connection failed after {attempts} attempts: {last}")]
    ConnectExhausted { attempts: u32, last: sqlx::Error },

    #[error("{0}")]
    Other(String),
}

/// Convenience alias for storage results.
pub type StoreResult<T> = Result<T, StoreError>;
