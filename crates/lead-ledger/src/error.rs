//! Error types for the lead ledger.

use thiserror::Error;

/// Errors that can occur in the CRM persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection error.
    #[error("database connection failed: {0}")]
    Connection(String),

    /// Database query error, including failed transactions.
    #[error("database query failed: {0}")]
    Backend(String),

    /// Serialization error at the row boundary.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Related records are missing for a stored evaluation.
    #[error("inconsistent records: {0}")]
    Inconsistent(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
