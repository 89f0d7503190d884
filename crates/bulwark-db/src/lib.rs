//! Durable storage for Bulwark claimant records.
//!
//! Implements the [`ClaimStore`](bulwark_claims::ClaimStore) collaborator
//! on top of the local filesystem. The registry calls it without holding
//! any lock, from tokio's blocking pool.
//!
//! # Modules
//!
//! - [`file_store`] -- [`FileStore`], one JSON record file per claimant
//! - [`error`] -- Shared error types

pub mod error;
pub mod file_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use file_store::FileStore;
