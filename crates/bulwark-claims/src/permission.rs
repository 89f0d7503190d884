//! Permission resolution for protected actions.
//!
//! A pure function of the owner's rank table and requirement overrides:
//! the actor may act when the rank the owner grants them is at least the
//! rank the owner requires for the permission.

use bulwark_types::{ClaimTag, ClaimantId, Permission};

use crate::claimant::Claimant;
use crate::error::ClaimError;
use crate::registry::ClaimRegistry;

/// Whether `actor` may perform `permission` on claims held by `owner`.
pub fn resolve(actor: ClaimantId, owner: &Claimant, permission: Permission) -> bool {
    owner
        .friend_rank(actor)
        .satisfies(owner.permission_rank_requirement(permission))
}

/// Whether `actor` may perform `permission` at `unit`.
///
/// Unclaimed units are open to everyone.
///
/// # Errors
///
/// Returns [`ClaimError::Store`] if the owning claimant cannot be loaded.
pub fn resolve_at(
    registry: &ClaimRegistry,
    actor: ClaimantId,
    unit: &ClaimTag,
    permission: Permission,
) -> Result<bool, ClaimError> {
    let Some(owner) = registry.owner_of(unit) else {
        return Ok(true);
    };
    let owner = registry.get_or_load(owner)?;
    Ok(resolve(actor, &owner, permission))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bulwark_types::Rank;

    use super::*;
    use crate::claimant::{PlayerClaimant, TownClaimant};

    fn player() -> (Arc<PlayerClaimant>, Claimant) {
        let player = Arc::new(PlayerClaimant::new(ClaimantId::new()));
        let claimant = Claimant::Player(Arc::clone(&player));
        (player, claimant)
    }

    #[test]
    fn owner_passes_every_permission() {
        let (player, claimant) = player();
        for permission in Permission::ALL {
            player.base().set_permission_rank(permission, Rank::Owner);
            assert!(resolve(player.id(), &claimant, permission));
        }
    }

    #[test]
    fn strangers_get_only_unrelated_permissions() {
        let (_, claimant) = player();
        let stranger = ClaimantId::new();
        for permission in Permission::ALL {
            let expected = permission.default_rank() == Rank::Unrelated;
            assert_eq!(resolve(stranger, &claimant, permission), expected);
        }
    }

    #[test]
    fn friend_rank_meets_requirement() {
        let (player, claimant) = player();
        let friend = ClaimantId::new();
        player.base().set_friend_rank(friend, Rank::Ally);
        assert!(resolve(friend, &claimant, Permission::Doors));
        assert!(!resolve(friend, &claimant, Permission::Storage));

        player.base().set_permission_rank(Permission::Storage, Rank::Ally);
        assert!(resolve(friend, &claimant, Permission::Storage));
    }

    #[test]
    fn town_owner_passes_and_members_use_their_rank() {
        let founder = ClaimantId::new();
        let member = ClaimantId::new();
        let town = Arc::new(TownClaimant::found(ClaimantId::new(), founder, "Alpha"));
        town.add_member(member, Rank::Trusted);
        let claimant = Claimant::Town(town);

        for permission in Permission::ALL {
            assert!(resolve(founder, &claimant, permission));
        }
        assert!(resolve(member, &claimant, Permission::Blocks));
        assert!(!resolve(ClaimantId::new(), &claimant, Permission::Blocks));
    }
}
