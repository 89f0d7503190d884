//! Individual claim-holders.
//!
//! On top of the base, a player carries a capacity bonus, a non-owning
//! reference to at most one town, and a set of pending town invites. The
//! invite set is only touched under the player's state mutex: adding an
//! invite and clearing all invites on acceptance are each atomic.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use bulwark_types::{
    ClaimTag, ClaimantDetails, ClaimantId, ClaimantKind, ClaimantRecord, PlayerDetails, Rank,
};

use super::ClaimantBase;
use crate::error::ClaimError;
use crate::sync;

/// Player-specific mutable state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerState {
    /// Units granted on top of the configured base limit.
    pub additional_capacity: i32,
    /// The town the player belongs to, resolved through the registry.
    pub town: Option<ClaimantId>,
    /// Towns that have invited this player. Not persisted.
    pub pending_invites: BTreeSet<ClaimantId>,
}

/// An individual claim-holder.
#[derive(Debug)]
pub struct PlayerClaimant {
    base: ClaimantBase,
    state: Mutex<PlayerState>,
}

impl PlayerClaimant {
    /// Create a clean player with default state.
    pub fn new(id: ClaimantId) -> Self {
        Self {
            base: ClaimantBase::new(id),
            state: Mutex::new(PlayerState::default()),
        }
    }

    /// Rebuild a player from its record.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::WrongClaimantType`] if the record is a town.
    pub fn from_record(record: &ClaimantRecord) -> Result<Self, ClaimError> {
        match &record.details {
            ClaimantDetails::Player(details) => Ok(Self::from_parts(record, details)),
            ClaimantDetails::Town(_) => Err(ClaimError::WrongClaimantType {
                id: record.id,
                expected: ClaimantKind::Player,
                actual: ClaimantKind::Town,
            }),
        }
    }

    pub(crate) fn from_parts(record: &ClaimantRecord, details: &PlayerDetails) -> Self {
        Self {
            base: ClaimantBase::from_record(record, details.friends.clone()),
            state: Mutex::new(PlayerState {
                additional_capacity: details.capacity_bonus,
                town: details.town_id,
                pending_invites: BTreeSet::new(),
            }),
        }
    }

    /// Serialize the player.
    pub fn to_record(&self) -> ClaimantRecord {
        let (town_id, capacity_bonus) = {
            let state = sync::lock(&self.state);
            (state.town, state.additional_capacity)
        };
        self.base.to_record(|friends| {
            ClaimantDetails::Player(PlayerDetails {
                town_id,
                capacity_bonus,
                friends,
            })
        })
    }

    /// The shared base.
    pub const fn base(&self) -> &ClaimantBase {
        &self.base
    }

    /// The player's identity.
    pub const fn id(&self) -> ClaimantId {
        self.base.id()
    }

    /// The rank `other` holds on this player's claims.
    ///
    /// A player always holds [`Rank::MAX`] on their own claims, whatever the
    /// stored table says.
    pub fn friend_rank(&self, other: ClaimantId) -> Rank {
        if other == self.id() {
            return Rank::MAX;
        }
        self.base.friend_rank(other)
    }

    // -----------------------------------------------------------------------
    // Town membership
    // -----------------------------------------------------------------------

    /// The player's town, if any.
    pub fn town(&self) -> Option<ClaimantId> {
        sync::lock(&self.state).town
    }

    /// Replace the player's town reference.
    pub fn set_town(&self, town: Option<ClaimantId>) {
        sync::lock(&self.state).town = town;
        self.base.mark_dirty();
    }

    /// Join `town` if the player has no town yet.
    ///
    /// Check and set happen under one lock. Pending invites are dropped on
    /// success.
    ///
    /// # Errors
    ///
    /// Returns the current town if the player already belongs to one.
    pub(crate) fn try_join_town(&self, town: ClaimantId) -> Result<(), ClaimantId> {
        {
            let mut state = sync::lock(&self.state);
            if let Some(current) = state.town {
                return Err(current);
            }
            state.town = Some(town);
            state.pending_invites.clear();
        }
        self.base.mark_dirty();
        Ok(())
    }

    /// Record an invite from `town`.
    ///
    /// Returns `false` without recording anything if the player is already
    /// in a town.
    pub fn invite_town(&self, town: ClaimantId) -> bool {
        let mut state = sync::lock(&self.state);
        if state.town.is_some() {
            return false;
        }
        state.pending_invites.insert(town);
        true
    }

    /// Accept the pending invite from the town currently named `name`.
    ///
    /// `town_name` resolves a town identity to its current name. It is
    /// called without the player's lock held. On a match the whole invite
    /// set is cleared under the lock and the town is returned; if another
    /// consumer cleared the set first, this returns `None`. With no match
    /// the set is left untouched.
    ///
    /// When several pending towns share `name`, the one with the lowest
    /// identity wins.
    pub fn consume_invite(
        &self,
        name: &str,
        town_name: impl Fn(ClaimantId) -> Option<String>,
    ) -> Option<ClaimantId> {
        let pending = self.pending_invites();
        let matched = pending
            .into_iter()
            .find(|town| town_name(*town).as_deref() == Some(name))?;

        let mut state = sync::lock(&self.state);
        if !state.pending_invites.contains(&matched) {
            return None;
        }
        state.pending_invites.clear();
        Some(matched)
    }

    /// A copy of the pending invites.
    pub fn pending_invites(&self) -> BTreeSet<ClaimantId> {
        sync::lock(&self.state).pending_invites.clone()
    }

    // -----------------------------------------------------------------------
    // Capacity
    // -----------------------------------------------------------------------

    /// Units granted on top of the base limit.
    pub fn additional_capacity(&self) -> i32 {
        sync::lock(&self.state).additional_capacity
    }

    /// Total capacity: `base_limit` plus the bonus, saturating.
    pub fn max_capacity(&self, base_limit: i32) -> i32 {
        base_limit.saturating_add(self.additional_capacity())
    }

    /// Add `delta` to the bonus and return the new total capacity.
    pub fn grant_additional_capacity(&self, delta: i32, base_limit: i32) -> i32 {
        let bonus = {
            let mut state = sync::lock(&self.state);
            state.additional_capacity = state.additional_capacity.saturating_add(delta);
            state.additional_capacity
        };
        self.base.mark_dirty();
        base_limit.saturating_add(bonus)
    }

    /// Whether the player may claim `unit` under `base_limit`.
    ///
    /// An already-owned unit is always claimable. Otherwise the base limit
    /// must be non-zero, and either one more unit fits in the total
    /// capacity or the base limit is non-positive. Because of the leading
    /// zero check, the "non-positive means unlimited" branch only fires for
    /// negative limits.
    pub fn can_claim(&self, unit: &ClaimTag, base_limit: i32) -> bool {
        if self.base.owns(unit) {
            return true;
        }
        let owned = i64::try_from(self.base.owned_count()).unwrap_or(i64::MAX);
        let capacity = i64::from(self.max_capacity(base_limit));
        base_limit != 0 && (owned.saturating_add(1) <= capacity || base_limit <= 0)
    }

    /// The player's friend table.
    pub fn friends(&self) -> BTreeMap<ClaimantId, Rank> {
        self.base.ranks()
    }
}
