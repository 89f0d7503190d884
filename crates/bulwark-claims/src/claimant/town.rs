//! Towns: claimants founded and owned by a player, with a member table.
//!
//! The member table is the base rank table. The owning player always holds
//! [`Rank::Owner`] and cannot be removed or demoted.

use std::collections::BTreeMap;
use std::sync::RwLock;

use bulwark_types::{
    ClaimantDetails, ClaimantId, ClaimantKind, ClaimantRecord, Rank, TownDetails,
};

use super::ClaimantBase;
use crate::error::ClaimError;
use crate::sync;

/// Town-specific mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TownState {
    /// The town's display name. Invites are accepted by this name.
    pub name: String,
    /// The player who owns the town.
    pub owner: ClaimantId,
}

/// A town claim-holder.
#[derive(Debug)]
pub struct TownClaimant {
    base: ClaimantBase,
    state: RwLock<TownState>,
}

impl TownClaimant {
    /// Found a new town owned by `owner`.
    ///
    /// The town starts dirty so the next persistence cycle writes it.
    pub fn found(id: ClaimantId, owner: ClaimantId, name: impl Into<String>) -> Self {
        let town = Self {
            base: ClaimantBase::new(id),
            state: RwLock::new(TownState {
                name: name.into(),
                owner,
            }),
        };
        town.base.set_friend_rank(owner, Rank::Owner);
        town
    }

    /// Rebuild a town from its record.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::WrongClaimantType`] if the record is a player.
    pub fn from_record(record: &ClaimantRecord) -> Result<Self, ClaimError> {
        match &record.details {
            ClaimantDetails::Town(details) => Ok(Self::from_parts(record, details)),
            ClaimantDetails::Player(_) => Err(ClaimError::WrongClaimantType {
                id: record.id,
                expected: ClaimantKind::Town,
                actual: ClaimantKind::Player,
            }),
        }
    }

    pub(crate) fn from_parts(record: &ClaimantRecord, details: &TownDetails) -> Self {
        let mut members = details.members.clone();
        members.insert(details.owner, Rank::Owner);
        Self {
            base: ClaimantBase::from_record(record, members),
            state: RwLock::new(TownState {
                name: details.name.clone(),
                owner: details.owner,
            }),
        }
    }

    /// Serialize the town. The display name is always the town name.
    pub fn to_record(&self) -> ClaimantRecord {
        let TownState { name, owner } = sync::read(&self.state).clone();
        let mut record = self.base.to_record(|members| {
            ClaimantDetails::Town(TownDetails {
                name: name.clone(),
                owner,
                members,
            })
        });
        record.display_name = Some(name);
        record
    }

    /// The shared base.
    pub const fn base(&self) -> &ClaimantBase {
        &self.base
    }

    /// The town's identity.
    pub const fn id(&self) -> ClaimantId {
        self.base.id()
    }

    /// The town's current name.
    pub fn name(&self) -> String {
        sync::read(&self.state).name.clone()
    }

    /// The owning player.
    pub fn owner(&self) -> ClaimantId {
        sync::read(&self.state).owner
    }

    /// Rename the town.
    pub fn rename(&self, name: impl Into<String>) {
        sync::write(&self.state).name = name.into();
        self.base.mark_dirty();
    }

    /// The rank `other` holds in this town. The owner is always [`Rank::Owner`].
    pub fn friend_rank(&self, other: ClaimantId) -> Rank {
        if other == self.owner() {
            return Rank::Owner;
        }
        self.base.friend_rank(other)
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    /// Whether `player` is listed in the member table.
    pub fn is_member(&self, player: ClaimantId) -> bool {
        self.base.rank_of(player).is_some()
    }

    /// A copy of the member table.
    pub fn members(&self) -> BTreeMap<ClaimantId, Rank> {
        self.base.ranks()
    }

    /// Add `player` at `rank`. Returns `false` if they are already a member.
    pub fn add_member(&self, player: ClaimantId, rank: Rank) -> bool {
        self.base.insert_rank_if_absent(player, rank)
    }

    /// Remove `player`. The owner cannot be removed.
    pub fn remove_member(&self, player: ClaimantId) -> bool {
        if player == self.owner() {
            return false;
        }
        self.base.remove_friend(player)
    }

    /// Change an existing member's rank. The owner's rank is fixed.
    pub fn set_member_rank(&self, player: ClaimantId, rank: Rank) -> bool {
        if player == self.owner() {
            return false;
        }
        self.base.update_rank(player, rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn founder_is_owner_and_town_starts_dirty() {
        let founder = ClaimantId::new();
        let town = TownClaimant::found(ClaimantId::new(), founder, "Alpha");
        assert_eq!(town.owner(), founder);
        assert_eq!(town.friend_rank(founder), Rank::Owner);
        assert!(town.is_member(founder));
        assert!(town.base().is_dirty());
    }

    #[test]
    fn owner_cannot_be_removed_or_demoted() {
        let founder = ClaimantId::new();
        let town = TownClaimant::found(ClaimantId::new(), founder, "Alpha");
        assert!(!town.remove_member(founder));
        assert!(!town.set_member_rank(founder, Rank::Ally));
        assert_eq!(town.friend_rank(founder), Rank::Owner);
    }

    #[test]
    fn member_lifecycle() {
        let town = TownClaimant::found(ClaimantId::new(), ClaimantId::new(), "Alpha");
        let member = ClaimantId::new();
        assert_eq!(town.friend_rank(member), Rank::Unrelated);
        assert!(town.add_member(member, Rank::Ally));
        assert!(!town.add_member(member, Rank::Trusted));
        assert_eq!(town.friend_rank(member), Rank::Ally);
        assert!(town.set_member_rank(member, Rank::Trusted));
        assert_eq!(town.friend_rank(member), Rank::Trusted);
        assert!(town.remove_member(member));
        assert!(!town.is_member(member));
        assert!(!town.set_member_rank(member, Rank::Ally));
    }

    #[test]
    fn record_round_trip_keeps_name_and_members() {
        let founder = ClaimantId::new();
        let member = ClaimantId::new();
        let town = TownClaimant::found(ClaimantId::new(), founder, "Alpha");
        town.add_member(member, Rank::Trusted);
        town.rename("Beta");

        let record = town.to_record();
        assert_eq!(record.display_name.as_deref(), Some("Beta"));
        let restored = TownClaimant::from_record(&record);
        assert!(restored.is_ok());
        let Ok(restored) = restored else { return };
        assert_eq!(restored.name(), "Beta");
        assert_eq!(restored.owner(), founder);
        assert_eq!(restored.members(), town.members());
    }

    #[test]
    fn player_record_is_rejected() {
        let player = super::super::PlayerClaimant::new(ClaimantId::new());
        let record = player.to_record();
        assert!(matches!(
            TownClaimant::from_record(&record),
            Err(ClaimError::WrongClaimantType { .. })
        ));
    }
}
