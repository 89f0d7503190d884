//! Display-name resolution and caching.
//!
//! Player names come from the host through a [`NameResolver`], which may
//! hit the network or disk. A claimant caches the result in a
//! [`DisplayName`] until it is explicitly invalidated. Resolution failures
//! never reach the registry: they are logged and replaced with
//! [`PLACEHOLDER_NAME`].

use std::collections::HashMap;
use std::sync::RwLock;

use bulwark_types::ClaimantId;

use crate::sync;

/// Name shown when resolution fails.
pub const PLACEHOLDER_NAME: &str = "Unknown player";

/// Errors a [`NameResolver`] may report.
#[derive(Debug, thiserror::Error)]
pub enum NameError {
    /// The resolver has no name for this identity.
    #[error("no name known for {0}")]
    Unknown(ClaimantId),

    /// The lookup itself failed (network, disk, malformed response).
    #[error("name lookup for {id} failed: {message}")]
    Lookup {
        /// The identity being resolved.
        id: ClaimantId,
        /// Description of the failure.
        message: String,
    },
}

/// Resolves an identity to a human-readable name.
pub trait NameResolver: Send + Sync {
    /// Resolve the current name for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`NameError`] when no name can be produced.
    fn resolve(&self, id: ClaimantId) -> Result<String, NameError>;
}

/// Cache-aside slot for a claimant's display name.
///
/// `Unset` means "not resolved yet", which is distinct from any name value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DisplayName {
    /// No name has been resolved since creation or the last invalidation.
    #[default]
    Unset,
    /// A resolved name.
    Cached(String),
}

impl DisplayName {
    /// The cached name, if any.
    pub fn get(&self) -> Option<&str> {
        match self {
            Self::Unset => None,
            Self::Cached(name) => Some(name),
        }
    }
}

/// A [`NameResolver`] backed by an in-memory table.
///
/// The spawn identity always resolves to the configured spawn name. Other
/// identities resolve only after [`insert`](Self::insert) has recorded a
/// name for them, typically when the player logs in.
#[derive(Debug)]
pub struct StaticNameResolver {
    spawn_name: String,
    names: RwLock<HashMap<ClaimantId, String>>,
}

impl StaticNameResolver {
    /// Create a resolver that names the spawn claimant `spawn_name`.
    pub fn new(spawn_name: impl Into<String>) -> Self {
        Self {
            spawn_name: spawn_name.into(),
            names: RwLock::new(HashMap::new()),
        }
    }

    /// Record or replace the name for `id`.
    pub fn insert(&self, id: ClaimantId, name: impl Into<String>) {
        sync::write(&self.names).insert(id, name.into());
    }
}

impl NameResolver for StaticNameResolver {
    fn resolve(&self, id: ClaimantId) -> Result<String, NameError> {
        if id.is_spawn() {
            return Ok(self.spawn_name.clone());
        }
        sync::read(&self.names)
            .get(&id)
            .cloned()
            .ok_or(NameError::Unknown(id))
    }
}
