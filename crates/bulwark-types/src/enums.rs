//! Enumeration types for claim protection.
//!
//! [`Rank`] is the trust ladder, [`Permission`] the gated capabilities and
//! [`Setting`] the per-claim toggles. Every permission and setting carries a
//! hard-coded default so that a claimant with no overrides still resolves.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::ids::ClaimantId;

// ---------------------------------------------------------------------------
// Rank
// ---------------------------------------------------------------------------

/// Trust level of one identity towards a claimant.
///
/// The order is an explicit contract: `Unrelated < Ally < Trusted < Owner`,
/// defined by [`Rank::power`]. Comparisons never depend on the position of
/// a variant in this declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    /// Full control of the claim.
    Owner,
    /// Trusted with building and storage.
    Trusted,
    /// Friendly, may use doors and animals.
    Ally,
    /// No relationship; the default for anyone not listed.
    Unrelated,
}

impl Rank {
    /// The lowest rank, granted to identities with no stored entry.
    pub const MIN: Self = Self::Unrelated;

    /// The highest rank.
    pub const MAX: Self = Self::Owner;

    /// Every rank, lowest first.
    pub const ALL: [Self; 4] = [Self::Unrelated, Self::Ally, Self::Trusted, Self::Owner];

    /// Numeric power of the rank. Higher means more trusted.
    pub const fn power(self) -> u8 {
        match self {
            Self::Unrelated => 0,
            Self::Ally => 1,
            Self::Trusted => 2,
            Self::Owner => 3,
        }
    }

    /// Whether this rank meets or exceeds `required`.
    pub const fn satisfies(self, required: Self) -> bool {
        self.power() >= required.power()
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.power().cmp(&other.power())
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// Permission
// ---------------------------------------------------------------------------

/// A capability inside a claim that is gated by rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Interact with, breed, or lead animals.
    Creatures,
    /// Harvest crops and trees.
    Harvest,
    /// Place and break blocks.
    Blocks,
    /// Open containers.
    Storage,
    /// Open doors, gates and trapdoors.
    Doors,
    /// Pick up dropped items.
    Pickup,
    /// Mount vehicles and animals.
    Riding,
    /// Use waystones.
    Waystones,
    /// Trade with villagers.
    Trading,
    /// Use crafting stations.
    Crafting,
}

impl Permission {
    /// Every permission, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Creatures,
        Self::Harvest,
        Self::Blocks,
        Self::Storage,
        Self::Doors,
        Self::Pickup,
        Self::Riding,
        Self::Waystones,
        Self::Trading,
        Self::Crafting,
    ];

    /// The rank required when the claimant has no override.
    pub const fn default_rank(self) -> Rank {
        match self {
            Self::Creatures | Self::Doors | Self::Riding => Rank::Ally,
            Self::Harvest | Self::Blocks | Self::Storage | Self::Pickup | Self::Waystones => {
                Rank::Trusted
            }
            Self::Trading | Self::Crafting => Rank::Unrelated,
        }
    }
}

// ---------------------------------------------------------------------------
// Setting
// ---------------------------------------------------------------------------

/// A boolean toggle that applies to every unit a claimant owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Setting {
    /// Players may damage each other.
    PlayerCombat,
    /// Non-trusted players may hurt tamed animals.
    HurtTamed,
    /// Harvested crops replant themselves.
    CropAutoreplant,
    /// Fire spreads between blocks.
    FireSpread,
    /// TNT destroys blocks.
    TntExplosions,
    /// Creepers destroy blocks.
    CreeperGriefing,
    /// Endermen pick up blocks.
    EndermanGriefing,
    /// Ghast fireballs destroy blocks.
    GhastGriefing,
}

impl Setting {
    /// Every setting, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::PlayerCombat,
        Self::HurtTamed,
        Self::CropAutoreplant,
        Self::FireSpread,
        Self::TntExplosions,
        Self::CreeperGriefing,
        Self::EndermanGriefing,
        Self::GhastGriefing,
    ];

    /// Default for ordinary claimants.
    pub const fn player_default(self) -> bool {
        match self {
            Self::PlayerCombat => true,
            Self::HurtTamed
            | Self::CropAutoreplant
            | Self::FireSpread
            | Self::TntExplosions
            | Self::CreeperGriefing
            | Self::EndermanGriefing
            | Self::GhastGriefing => false,
        }
    }

    /// Default for the spawn claimant.
    pub const fn spawn_default(self) -> bool {
        matches!(self, Self::CropAutoreplant)
    }

    /// Default for the claimant identified by `owner`.
    pub fn default_for(self, owner: ClaimantId) -> bool {
        if owner.is_spawn() {
            self.spawn_default()
        } else {
            self.player_default()
        }
    }
}

// ---------------------------------------------------------------------------
// ClaimantKind
// ---------------------------------------------------------------------------

/// Which kind of claim-holder an identity refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimantKind {
    /// An individual actor.
    Player,
    /// A named group of players.
    Town,
}

impl core::fmt::Display for ClaimantKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Player => f.write_str("player"),
            Self::Town => f.write_str("town"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SPAWN_ID;

    #[test]
    fn rank_order_follows_power_not_declaration() {
        assert!(Rank::Unrelated < Rank::Ally);
        assert!(Rank::Ally < Rank::Trusted);
        assert!(Rank::Trusted < Rank::Owner);
        assert_eq!(Rank::ALL.iter().max(), Some(&Rank::MAX));
        assert_eq!(Rank::ALL.iter().min(), Some(&Rank::MIN));
    }

    #[test]
    fn rank_satisfies_is_reflexive() {
        for rank in Rank::ALL {
            assert!(rank.satisfies(rank));
            assert!(Rank::MAX.satisfies(rank));
        }
        assert!(!Rank::Ally.satisfies(Rank::Trusted));
    }

    #[test]
    fn building_requires_trust() {
        assert_eq!(Permission::Blocks.default_rank(), Rank::Trusted);
        assert_eq!(Permission::Doors.default_rank(), Rank::Ally);
        assert_eq!(Permission::Trading.default_rank(), Rank::Unrelated);
    }

    #[test]
    fn spawn_settings_differ_from_players() {
        let player = ClaimantId::new();
        assert!(Setting::PlayerCombat.default_for(player));
        assert!(!Setting::PlayerCombat.default_for(SPAWN_ID));
        assert!(!Setting::CropAutoreplant.default_for(player));
        assert!(Setting::CropAutoreplant.default_for(SPAWN_ID));
    }

    #[test]
    fn permissions_serialize_as_map_keys() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(Permission::Storage, Rank::Ally);
        let json = serde_json::to_string(&map).unwrap_or_default();
        assert_eq!(json, r#"{"Storage":"Ally"}"#);
    }
}
