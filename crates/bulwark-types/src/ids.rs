//! Type-safe identifier wrapper around [`Uuid`].
//!
//! Players and towns share a single identity space: a [`ClaimantId`] is the
//! only key used for registry lookup and for persistence. Player identities
//! come from the host (account UUIDs); town identities are generated here
//! with UUID v7 when a town is founded.
//!
//! The nil UUID is reserved for the spawn claimant, see [`SPAWN_ID`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for any claim-holder, player or town.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClaimantId(pub Uuid);

impl ClaimantId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }

    /// Whether this is the reserved spawn identity.
    pub fn is_spawn(self) -> bool {
        self == SPAWN_ID
    }
}

impl Default for ClaimantId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ClaimantId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ClaimantId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<ClaimantId> for Uuid {
    fn from(id: ClaimantId) -> Self {
        id.0
    }
}

/// The operator-owned claimant that protects the world spawn.
///
/// Settings resolve to their spawn defaults for this identity, and name
/// resolution never performs a lookup for it.
pub const SPAWN_ID: ClaimantId = ClaimantId(Uuid::nil());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_not_spawn() {
        let id = ClaimantId::new();
        assert_ne!(id.into_inner(), Uuid::nil());
        assert!(!id.is_spawn());
        assert!(SPAWN_ID.is_spawn());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = ClaimantId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<ClaimantId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = ClaimantId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
