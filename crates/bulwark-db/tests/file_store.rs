//! Integration tests for the file-backed claimant store.
//!
//! Each test works in its own temporary directory.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use std::collections::BTreeMap;
use std::fs;

use bulwark_claims::{ClaimStore, StoreError};
use bulwark_db::FileStore;
use bulwark_types::{
    ClaimTag, ClaimantDetails, ClaimantId, ClaimantRecord, Permission, PlayerDetails, Rank,
    Setting, TownDetails,
};
use chrono::Utc;

fn player_record(id: ClaimantId) -> ClaimantRecord {
    let mut friends = BTreeMap::new();
    friends.insert(ClaimantId::new(), Rank::Trusted);
    ClaimantRecord {
        id,
        display_name: Some(String::from("Steve")),
        owned_units: vec![ClaimTag::new("overworld", 1, 2), ClaimTag::new("nether", -4, 0)],
        rank_overrides: BTreeMap::from([(Permission::Doors, Rank::Trusted)]),
        setting_overrides: BTreeMap::from([(Setting::FireSpread, true)]),
        saved_at: Utc::now(),
        details: ClaimantDetails::Player(PlayerDetails {
            town_id: Some(ClaimantId::new()),
            capacity_bonus: 7,
            friends,
        }),
    }
}

#[test]
fn missing_record_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    assert_eq!(store.load(ClaimantId::new()).unwrap(), None);
}

#[test]
fn saved_records_load_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();

    let player = player_record(ClaimantId::new());
    let owner = ClaimantId::new();
    let town = ClaimantRecord {
        id: ClaimantId::new(),
        display_name: Some(String::from("Alpha")),
        owned_units: vec![ClaimTag::new("overworld", 0, 0)],
        rank_overrides: BTreeMap::new(),
        setting_overrides: BTreeMap::new(),
        saved_at: Utc::now(),
        details: ClaimantDetails::Town(TownDetails {
            name: String::from("Alpha"),
            owner,
            members: BTreeMap::from([(owner, Rank::Owner)]),
        }),
    };

    store.save(&player).unwrap();
    store.save(&town).unwrap();

    assert_eq!(store.load(player.id).unwrap(), Some(player.clone()));
    assert_eq!(store.load(town.id).unwrap(), Some(town.clone()));

    let mut expected = vec![player.id, town.id];
    expected.sort_unstable();
    assert_eq!(store.list_ids().unwrap(), expected);
}

#[test]
fn saving_again_replaces_the_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let mut record = player_record(ClaimantId::new());
    store.save(&record).unwrap();

    record.owned_units.clear();
    store.save(&record).unwrap();

    assert!(store.load(record.id).unwrap().unwrap().owned_units.is_empty());
    assert_eq!(store.list_ids().unwrap().len(), 1);
}

#[test]
fn unreadable_record_is_reported_as_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let id = ClaimantId::new();
    fs::write(dir.path().join(format!("{id}.json")), b"{ not json").unwrap();

    assert!(matches!(
        store.load(id),
        Err(StoreError::Corrupt { id: bad, .. }) if bad == id
    ));
}

#[test]
fn record_under_the_wrong_name_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let record = player_record(ClaimantId::new());
    let other = ClaimantId::new();
    fs::write(
        dir.path().join(format!("{other}.json")),
        serde_json::to_vec(&record).unwrap(),
    )
    .unwrap();

    assert!(matches!(store.load(other), Err(StoreError::Corrupt { .. })));
}

#[test]
fn foreign_files_are_ignored_when_listing() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path().join("claims")).unwrap();
    let record = player_record(ClaimantId::new());
    store.save(&record).unwrap();
    fs::write(store.root().join("README.json"), b"{}").unwrap();
    fs::write(store.root().join("notes.txt"), b"hello").unwrap();

    assert_eq!(store.list_ids().unwrap(), vec![record.id]);
}
