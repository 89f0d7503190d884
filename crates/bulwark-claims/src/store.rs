//! Persistence collaborator for claimant records.
//!
//! The registry never touches disk directly; it reads and writes whole
//! [`ClaimantRecord`]s through a [`ClaimStore`]. Stores are called without
//! any registry or claimant lock held, so an implementation may block.
//!
//! [`MemoryStore`] keeps records in a map and can be told to fail writes
//! for chosen identities, which the persistence tests rely on. The durable
//! file-backed store lives in the `bulwark-db` crate.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use bulwark_types::{ClaimantId, ClaimantRecord};

use crate::error::StoreError;
use crate::sync;

/// Durable storage for claimant records, one record per identity.
pub trait ClaimStore: Send + Sync {
    /// Load the record for `id`, or `None` if it was never saved.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails or the record is corrupt.
    fn load(&self, id: ClaimantId) -> Result<Option<ClaimantRecord>, StoreError>;

    /// Write `record`, replacing any previous record for the same identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn save(&self, record: &ClaimantRecord) -> Result<(), StoreError>;

    /// List every identity that has a stored record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be enumerated.
    fn list_ids(&self) -> Result<Vec<ClaimantId>, StoreError>;
}

/// An in-memory [`ClaimStore`] with write-failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<ClaimantId, ClaimantRecord>>,
    failing: Mutex<HashSet<ClaimantId>>,
    saves: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing failure injection.
    pub fn insert(&self, record: ClaimantRecord) {
        sync::lock(&self.records).insert(record.id, record);
    }

    /// The stored record for `id`, if any.
    pub fn get(&self, id: ClaimantId) -> Option<ClaimantRecord> {
        sync::lock(&self.records).get(&id).cloned()
    }

    /// Make every subsequent save for `id` fail until [`heal`](Self::heal).
    pub fn fail_saves_for(&self, id: ClaimantId) {
        sync::lock(&self.failing).insert(id);
    }

    /// Stop failing saves for `id`.
    pub fn heal(&self, id: ClaimantId) {
        sync::lock(&self.failing).remove(&id);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::Acquire)
    }
}

impl ClaimStore for MemoryStore {
    fn load(&self, id: ClaimantId) -> Result<Option<ClaimantRecord>, StoreError> {
        Ok(self.get(id))
    }

    fn save(&self, record: &ClaimantRecord) -> Result<(), StoreError> {
        if sync::lock(&self.failing).contains(&record.id) {
            return Err(StoreError::Backend(format!(
                "injected write failure for {}",
                record.id
            )));
        }
        sync::lock(&self.records).insert(record.id, record.clone());
        self.saves.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<ClaimantId>, StoreError> {
        let mut ids: Vec<ClaimantId> = sync::lock(&self.records).keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
