//! Error types for the storage layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! I/O and JSON errors. The registry only sees [`StoreError`], so every
//! [`DbError`] converts into one at the [`ClaimStore`] boundary.
//!
//! [`ClaimStore`]: bulwark_claims::ClaimStore

use bulwark_claims::StoreError;

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A file in the data directory does not name a claimant record.
    #[error("Invalid record file name: {0}")]
    InvalidFileName(String),
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        Self::Backend(e.to_string())
    }
}
