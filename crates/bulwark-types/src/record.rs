//! The persisted form of a claimant.
//!
//! One [`ClaimantRecord`] is stored per identity. The base fields are shared
//! by every kind; kind-specific fields live in [`ClaimantDetails`], which is
//! flattened into the record and discriminated by its `kind` field:
//!
//! ```text
//! {
//!   "id": "...", "display_name": "Steve",
//!   "owned_units": [{"world": "overworld", "x": 1, "z": 2}],
//!   "rank_overrides": {"Storage": "Ally"},
//!   "setting_overrides": {"FireSpread": true},
//!   "saved_at": "2026-01-01T00:00:00Z",
//!   "kind": "player", "town_id": null, "capacity_bonus": 5, "friends": {}
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{ClaimantKind, Permission, Rank, Setting};
use crate::ids::ClaimantId;
use crate::tag::ClaimTag;

/// A serialized claimant, base fields plus kind-specific details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimantRecord {
    /// Identity of the claimant.
    pub id: ClaimantId,
    /// Last known display name, if one was resolved.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Every unit the claimant owns, sorted.
    #[serde(default)]
    pub owned_units: Vec<ClaimTag>,
    /// Per-permission rank requirements that replace the defaults.
    #[serde(default)]
    pub rank_overrides: BTreeMap<Permission, Rank>,
    /// Per-setting values that replace the defaults.
    #[serde(default)]
    pub setting_overrides: BTreeMap<Setting, bool>,
    /// When the record was produced.
    pub saved_at: DateTime<Utc>,
    /// Kind-specific fields.
    #[serde(flatten)]
    pub details: ClaimantDetails,
}

impl ClaimantRecord {
    /// The kind of claimant this record describes.
    pub const fn kind(&self) -> ClaimantKind {
        match self.details {
            ClaimantDetails::Player(_) => ClaimantKind::Player,
            ClaimantDetails::Town(_) => ClaimantKind::Town,
        }
    }
}

/// Kind-specific persisted fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClaimantDetails {
    /// Fields stored for a player.
    Player(PlayerDetails),
    /// Fields stored for a town.
    Town(TownDetails),
}

/// Persisted player fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDetails {
    /// The town the player belongs to, if any.
    #[serde(default)]
    pub town_id: Option<ClaimantId>,
    /// Units granted on top of the configured base limit.
    #[serde(default)]
    pub capacity_bonus: i32,
    /// Ranks this player has handed out to other identities.
    #[serde(default)]
    pub friends: BTreeMap<ClaimantId, Rank>,
}

/// Persisted town fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TownDetails {
    /// The town's name, also its display name.
    pub name: String,
    /// The founding player.
    pub owner: ClaimantId,
    /// Member identities and their ranks.
    #[serde(default)]
    pub members: BTreeMap<ClaimantId, Rank>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_record() -> ClaimantRecord {
        let friend = ClaimantId::new();
        let mut friends = BTreeMap::new();
        friends.insert(friend, Rank::Trusted);
        let mut rank_overrides = BTreeMap::new();
        rank_overrides.insert(Permission::Storage, Rank::Ally);
        let mut setting_overrides = BTreeMap::new();
        setting_overrides.insert(Setting::FireSpread, true);
        ClaimantRecord {
            id: ClaimantId::new(),
            display_name: Some(String::from("Steve")),
            owned_units: vec![ClaimTag::new("overworld", 0, 0), ClaimTag::new("overworld", 0, 1)],
            rank_overrides,
            setting_overrides,
            saved_at: Utc::now(),
            details: ClaimantDetails::Player(PlayerDetails {
                town_id: Some(ClaimantId::new()),
                capacity_bonus: 5,
                friends,
            }),
        }
    }

    #[test]
    fn kind_is_written_inline() {
        let record = player_record();
        let value = serde_json::to_value(&record).unwrap_or_default();
        assert_eq!(value.get("kind").and_then(|k| k.as_str()), Some("player"));
        assert_eq!(value.get("capacity_bonus").and_then(serde_json::Value::as_i64), Some(5));
        assert_eq!(record.kind(), ClaimantKind::Player);
    }

    #[test]
    fn player_record_survives_json() {
        let record = player_record();
        let json = serde_json::to_string(&record).unwrap_or_default();
        let restored: Option<ClaimantRecord> = serde_json::from_str(&json).ok();
        assert_eq!(restored, Some(record));
    }

    #[test]
    fn town_record_survives_json() {
        let owner = ClaimantId::new();
        let mut members = BTreeMap::new();
        members.insert(owner, Rank::Owner);
        let record = ClaimantRecord {
            id: ClaimantId::new(),
            display_name: None,
            owned_units: Vec::new(),
            rank_overrides: BTreeMap::new(),
            setting_overrides: BTreeMap::new(),
            saved_at: Utc::now(),
            details: ClaimantDetails::Town(TownDetails {
                name: String::from("Alpha"),
                owner,
                members,
            }),
        };
        let json = serde_json::to_string(&record).unwrap_or_default();
        let restored: Option<ClaimantRecord> = serde_json::from_str(&json).ok();
        assert_eq!(restored.as_ref().map(ClaimantRecord::kind), Some(ClaimantKind::Town));
        assert_eq!(restored, Some(record));
    }

    #[test]
    fn missing_optional_player_fields_default() {
        let id = ClaimantId::new();
        let json = format!(
            r#"{{"id":"{id}","saved_at":"2026-01-01T00:00:00Z","kind":"player"}}"#
        );
        let record: Option<ClaimantRecord> = serde_json::from_str(&json).ok();
        let details = record.map(|r| r.details);
        assert_eq!(details, Some(ClaimantDetails::Player(PlayerDetails::default())));
    }
}
