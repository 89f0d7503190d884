//! Error types for the `bulwark-claims` crate.
//!
//! Domain-rule violations are returned as [`ClaimError`] values for the
//! command layer to turn into player feedback; they never leave registry
//! state half-mutated. Storage faults surface as [`StoreError`].

use bulwark_types::{ClaimTag, ClaimantId, ClaimantKind};

/// Errors returned by claimant and registry operations.
#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    /// The unit is already owned by a different claimant.
    #[error("{unit} is already claimed by {owner}")]
    AlreadyClaimedByOther {
        /// The contested unit.
        unit: ClaimTag,
        /// Its current owner.
        owner: ClaimantId,
    },

    /// The player has no capacity left for another unit.
    #[error("player {player} has reached their claim limit of {limit}")]
    CapacityExceeded {
        /// The player attempting the claim.
        player: ClaimantId,
        /// The player's total capacity at the time of the attempt.
        limit: i32,
    },

    /// The actor does not own the unit.
    #[error("{actor} does not own {unit}")]
    NotOwner {
        /// The unit.
        unit: ClaimTag,
        /// The claimant that attempted the operation.
        actor: ClaimantId,
    },

    /// The player already belongs to a town.
    #[error("player {player} already belongs to town {town}")]
    AlreadyInTown {
        /// The player.
        player: ClaimantId,
        /// The town they belong to.
        town: ClaimantId,
    },

    /// The player does not belong to any town.
    #[error("player {0} is not in a town")]
    NotInTown(ClaimantId),

    /// The town owner tried to leave their own town.
    #[error("player {player} owns town {town} and cannot leave it")]
    OwnerCannotLeave {
        /// The owning player.
        player: ClaimantId,
        /// The town.
        town: ClaimantId,
    },

    /// No pending invite matches the requested town name.
    #[error("player {player} has no pending invite from a town named {name:?}")]
    NoSuchInvite {
        /// The invited player.
        player: ClaimantId,
        /// The town name that was looked up.
        name: String,
    },

    /// The identity does not refer to a known town.
    #[error("no town with id {0}")]
    NoSuchTown(ClaimantId),

    /// The identity resolved to the other kind of claimant.
    #[error("claimant {id} is a {actual}, expected a {expected}")]
    WrongClaimantType {
        /// The identity.
        id: ClaimantId,
        /// The kind the caller asked for.
        expected: ClaimantKind,
        /// The kind it actually is.
        actual: ClaimantKind,
    },

    /// Writing a claimant record failed. The claimant stays dirty and is
    /// retried on the next persistence cycle.
    #[error("failed to persist claimant {id}: {source}")]
    PersistenceWriteFailed {
        /// The claimant whose record was not written.
        id: ClaimantId,
        /// The underlying store error.
        source: StoreError,
    },

    /// Loading a claimant record failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors reported by a [`ClaimStore`](crate::store::ClaimStore).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend could not complete the read or write.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored record could not be decoded or does not match its key.
    #[error("record for {id} is corrupt: {reason}")]
    Corrupt {
        /// The identity whose record is unreadable.
        id: ClaimantId,
        /// What is wrong with it.
        reason: String,
    },
}
