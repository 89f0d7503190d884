//! The claimant registry: single owner of every claimant and of the global
//! unit index.
//!
//! Claimants are loaded on first lookup (from the store if a record exists,
//! else as a fresh player) and cached for the life of the process, or until
//! [`ClaimRegistry::evict_idle`] drops them. Lookups for the same identity
//! always return the same instance.
//!
//! # Locking
//!
//! Lock order is index, then claimant cache, then per-claimant locks. Store
//! I/O and name resolution never run with a registry lock held. Persistence
//! cycles are serialized by their own lock, which is never taken while any
//! other registry lock is held.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use bulwark_types::{ClaimTag, ClaimantId, ClaimantKind, Rank};
use tokio::task::JoinHandle;

use crate::claimant::{Claimant, PlayerClaimant, TownClaimant};
use crate::config::ConfigProvider;
use crate::error::{ClaimError, StoreError};
use crate::name::NameResolver;
use crate::store::ClaimStore;
use crate::sync;

/// Result of a successful [`ClaimRegistry::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The unit was unowned and now belongs to the actor.
    Claimed,
    /// The actor already owned the unit. Nothing changed.
    AlreadyOwned,
}

/// Outcome of one persistence cycle.
#[derive(Debug, Default)]
pub struct PersistReport {
    /// Claimants whose records were written.
    pub saved: Vec<ClaimantId>,
    /// One [`ClaimError::PersistenceWriteFailed`] per failed write.
    pub failed: Vec<ClaimError>,
}

impl PersistReport {
    /// Whether every dirty claimant was written.
    pub const fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owner of all claimants and of the unit → owner index.
pub struct ClaimRegistry {
    store: Arc<dyn ClaimStore>,
    config: Arc<dyn ConfigProvider>,
    names: Arc<dyn NameResolver>,
    index: RwLock<HashMap<ClaimTag, ClaimantId>>,
    claimants: RwLock<HashMap<ClaimantId, Claimant>>,
    persisting: Mutex<()>,
}

impl std::fmt::Debug for ClaimRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // One guard per statement, so the two locks are never held together.
        let indexed_units = sync::read(&self.index).len();
        let claimants = sync::read(&self.claimants).len();
        f.debug_struct("ClaimRegistry")
            .field("claimants", &claimants)
            .field("indexed_units", &indexed_units)
            .finish_non_exhaustive()
    }
}

impl ClaimRegistry {
    /// Create an empty registry over the given collaborators.
    pub fn new(
        store: Arc<dyn ClaimStore>,
        config: Arc<dyn ConfigProvider>,
        names: Arc<dyn NameResolver>,
    ) -> Self {
        Self {
            store,
            config,
            names,
            index: RwLock::new(HashMap::new()),
            claimants: RwLock::new(HashMap::new()),
            persisting: Mutex::new(()),
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// The claimant for `id`, loading it or creating a fresh player on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::Store`] if the stored record cannot be read.
    pub fn get_or_load(&self, id: ClaimantId) -> Result<Claimant, ClaimError> {
        let claimant = self.lookup(id, true)?;
        claimant.ok_or(ClaimError::NoSuchTown(id))
    }

    /// The player for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::WrongClaimantType`] if `id` is a town.
    pub fn get_player(&self, id: ClaimantId) -> Result<Arc<PlayerClaimant>, ClaimError> {
        match self.get_or_load(id)? {
            Claimant::Player(player) => Ok(player),
            Claimant::Town(_) => Err(ClaimError::WrongClaimantType {
                id,
                expected: ClaimantKind::Player,
                actual: ClaimantKind::Town,
            }),
        }
    }

    /// The town for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::NoSuchTown`] if no town exists with this
    /// identity, or [`ClaimError::WrongClaimantType`] if `id` is a player.
    pub fn get_town(&self, id: ClaimantId) -> Result<Arc<TownClaimant>, ClaimError> {
        match self.lookup(id, false)? {
            Some(Claimant::Town(town)) => Ok(town),
            Some(Claimant::Player(_)) => Err(ClaimError::WrongClaimantType {
                id,
                expected: ClaimantKind::Town,
                actual: ClaimantKind::Player,
            }),
            None => Err(ClaimError::NoSuchTown(id)),
        }
    }

    /// Cache, then store, then (if `create` is set) a fresh player.
    fn lookup(&self, id: ClaimantId, create: bool) -> Result<Option<Claimant>, ClaimError> {
        if let Some(claimant) = sync::read(&self.claimants).get(&id) {
            return Ok(Some(claimant.clone()));
        }

        let record = self.store.load(id)?;
        if let Some(stored) = record.as_ref().map(|r| r.id).filter(|stored| *stored != id) {
            return Err(StoreError::Corrupt {
                id,
                reason: format!("record carries id {stored}"),
            }
            .into());
        }
        if record.is_none() && !create {
            return Ok(None);
        }

        let (claimant, inserted) = {
            let mut index = sync::write(&self.index);
            let mut claimants = sync::write(&self.claimants);
            if let Some(existing) = claimants.get(&id) {
                (existing.clone(), false)
            } else {
                let claimant = record.as_ref().map_or_else(
                    || Claimant::Player(Arc::new(PlayerClaimant::new(id))),
                    Claimant::from_record,
                );
                Self::index_units(&mut index, &claimant);
                claimants.insert(id, claimant.clone());
                (claimant, true)
            }
        };

        if inserted {
            tracing::debug!(claimant = %id, kind = %claimant.kind(), stored = record.is_some(), "Claimant loaded");
            if let Claimant::Player(player) = &claimant {
                self.validate_town(player);
            }
        }
        Ok(Some(claimant))
    }

    /// Register a freshly loaded claimant's units. The index wins conflicts.
    fn index_units(index: &mut HashMap<ClaimTag, ClaimantId>, claimant: &Claimant) {
        let base = claimant.base();
        let mut dropped = 0_usize;
        for unit in base.owned_units() {
            match index.get(&unit) {
                Some(owner) if *owner != base.id() => {
                    tracing::warn!(
                        claimant = %base.id(),
                        owner = %owner,
                        unit = %unit,
                        "Loaded unit already indexed to another claimant, dropping it"
                    );
                    base.remove_unit(&unit);
                    dropped = dropped.saturating_add(1);
                }
                _ => {
                    index.insert(unit, base.id());
                }
            }
        }
        if dropped > 0 {
            base.mark_dirty();
        }
    }

    /// Clear a loaded player's town if it no longer lists them.
    fn validate_town(&self, player: &PlayerClaimant) {
        let Some(town_id) = player.town() else {
            return;
        };
        let valid = match self.get_town(town_id) {
            Ok(town) => town.is_member(player.id()),
            Err(ClaimError::Store(e)) => {
                tracing::warn!(player = %player.id(), town = %town_id, error = %e, "Could not verify town membership");
                true
            }
            Err(_) => false,
        };
        if !valid {
            tracing::warn!(player = %player.id(), town = %town_id, "Player's town does not list them, clearing");
            player.set_town(None);
        }
    }

    /// Load every stored claimant. Returns how many were loaded.
    ///
    /// Individual unreadable records are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::Store`] if the store cannot be enumerated.
    pub fn load_all(&self) -> Result<usize, ClaimError> {
        let ids = self.store.list_ids()?;
        let mut loaded = 0_usize;
        for id in ids {
            match self.get_or_load(id) {
                Ok(_) => loaded = loaded.saturating_add(1),
                Err(e) => tracing::warn!(claimant = %id, error = %e, "Skipping unreadable claimant"),
            }
        }
        tracing::info!(loaded, "Claimants loaded from store");
        Ok(loaded)
    }

    /// Number of claimants currently cached.
    pub fn cached_count(&self) -> usize {
        sync::read(&self.claimants).len()
    }

    /// The display name of `id`, resolved through the name collaborator.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::Store`] if the claimant cannot be loaded.
    pub fn display_name(&self, id: ClaimantId) -> Result<String, ClaimError> {
        Ok(self.get_or_load(id)?.display_name(self.names.as_ref()))
    }

    // -----------------------------------------------------------------------
    // Ownership
    // -----------------------------------------------------------------------

    /// Claim `unit` for `actor`.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::AlreadyClaimedByOther`] if another claimant owns it.
    /// - [`ClaimError::CapacityExceeded`] if a player actor has no room left.
    pub fn claim(&self, actor: ClaimantId, unit: ClaimTag) -> Result<ClaimOutcome, ClaimError> {
        let claimant = self.get_or_load(actor)?;
        let base_limit = self.config.base_claim_limit();

        let mut index = sync::write(&self.index);
        match index.get(&unit) {
            Some(owner) if *owner == actor => return Ok(ClaimOutcome::AlreadyOwned),
            Some(owner) => {
                return Err(ClaimError::AlreadyClaimedByOther {
                    unit,
                    owner: *owner,
                });
            }
            None => {}
        }
        if let Claimant::Player(player) = &claimant {
            if !player.can_claim(&unit, base_limit) {
                return Err(ClaimError::CapacityExceeded {
                    player: actor,
                    limit: player.max_capacity(base_limit),
                });
            }
        }

        index.insert(unit.clone(), actor);
        claimant.base().insert_unit(unit.clone());
        claimant.base().mark_dirty();
        drop(index);

        tracing::debug!(claimant = %actor, unit = %unit, "Unit claimed");
        Ok(ClaimOutcome::Claimed)
    }

    /// Release `unit` held by `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::NotOwner`] unless `actor` owns the unit.
    pub fn unclaim(&self, actor: ClaimantId, unit: &ClaimTag) -> Result<(), ClaimError> {
        let claimant = self.get_or_load(actor)?;

        let mut index = sync::write(&self.index);
        if index.get(unit) != Some(&actor) {
            return Err(ClaimError::NotOwner {
                unit: unit.clone(),
                actor,
            });
        }
        index.remove(unit);
        claimant.base().remove_unit(unit);
        claimant.base().mark_dirty();
        drop(index);

        tracing::debug!(claimant = %actor, unit = %unit, "Unit unclaimed");
        Ok(())
    }

    /// The current owner of `unit`, if any.
    pub fn owner_of(&self, unit: &ClaimTag) -> Option<ClaimantId> {
        sync::read(&self.index).get(unit).copied()
    }

    // -----------------------------------------------------------------------
    // Capacity
    // -----------------------------------------------------------------------

    /// Whether `player` may claim `unit` under the current base limit.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::WrongClaimantType`] if `player` is a town.
    pub fn can_claim(&self, player: ClaimantId, unit: &ClaimTag) -> Result<bool, ClaimError> {
        let player = self.get_player(player)?;
        Ok(player.can_claim(unit, self.config.base_claim_limit()))
    }

    /// Grant `delta` extra units to `player`. Returns the new total capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::WrongClaimantType`] if `player` is a town.
    pub fn grant_additional_capacity(
        &self,
        player: ClaimantId,
        delta: i32,
    ) -> Result<i32, ClaimError> {
        let player = self.get_player(player)?;
        let total = player.grant_additional_capacity(delta, self.config.base_claim_limit());
        tracing::info!(player = %player.id(), delta, total, "Claim capacity granted");
        Ok(total)
    }

    // -----------------------------------------------------------------------
    // Towns
    // -----------------------------------------------------------------------

    /// Found a town named `name` owned by `founder`.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::AlreadyInTown`] if the founder already has a town.
    pub fn create_town(
        &self,
        founder: ClaimantId,
        name: &str,
    ) -> Result<Arc<TownClaimant>, ClaimError> {
        let player = self.get_player(founder)?;
        if let Some(town) = player.town() {
            return Err(ClaimError::AlreadyInTown {
                player: founder,
                town,
            });
        }

        let town_id = ClaimantId::new();
        let town = Arc::new(TownClaimant::found(town_id, founder, name));
        sync::write(&self.claimants).insert(town_id, Claimant::Town(Arc::clone(&town)));

        if let Err(current) = player.try_join_town(town_id) {
            sync::write(&self.claimants).remove(&town_id);
            return Err(ClaimError::AlreadyInTown {
                player: founder,
                town: current,
            });
        }

        tracing::info!(town = %town_id, founder = %founder, name, "Town founded");
        Ok(town)
    }

    /// Record an invite from `town` to `player`.
    ///
    /// Returns `false` if the player already belongs to a town.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::NoSuchTown`] if `town` is not a town, or
    /// [`ClaimError::WrongClaimantType`] if `player` is a town.
    pub fn invite_town(&self, player: ClaimantId, town: ClaimantId) -> Result<bool, ClaimError> {
        let town = self.get_town(town)?;
        let player = self.get_player(player)?;
        let invited = player.invite_town(town.id());
        tracing::debug!(player = %player.id(), town = %town.id(), invited, "Town invite");
        Ok(invited)
    }

    /// Consume the pending invite from the town currently named `name`.
    ///
    /// Clears all of the player's pending invites on a match.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::WrongClaimantType`] if `player` is a town.
    pub fn consume_invite(
        &self,
        player: ClaimantId,
        name: &str,
    ) -> Result<Option<ClaimantId>, ClaimError> {
        let player = self.get_player(player)?;
        Ok(player.consume_invite(name, |town| self.town_name(town)))
    }

    fn town_name(&self, town: ClaimantId) -> Option<String> {
        self.get_town(town).ok().map(|town| town.name())
    }

    /// Accept the invite from the town named `name` and join it as an ally.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::AlreadyInTown`] if the player already has a town.
    /// - [`ClaimError::NoSuchInvite`] if no pending invite matches `name`.
    pub fn accept_invite(
        &self,
        player: ClaimantId,
        name: &str,
    ) -> Result<Arc<TownClaimant>, ClaimError> {
        let member = self.get_player(player)?;
        if let Some(town) = member.town() {
            return Err(ClaimError::AlreadyInTown { player, town });
        }
        let town_id = member
            .consume_invite(name, |town| self.town_name(town))
            .ok_or_else(|| ClaimError::NoSuchInvite {
                player,
                name: name.to_owned(),
            })?;
        let town = self.get_town(town_id)?;

        member
            .try_join_town(town_id)
            .map_err(|current| ClaimError::AlreadyInTown {
                player,
                town: current,
            })?;
        town.add_member(player, Rank::Ally);

        tracing::info!(player = %player, town = %town_id, "Player joined town");
        Ok(town)
    }

    /// Remove `player` from their town. Returns the town they left.
    ///
    /// A dangling town reference is simply cleared.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::NotInTown`] if the player has no town.
    /// - [`ClaimError::OwnerCannotLeave`] if the player owns the town.
    pub fn leave_town(&self, player: ClaimantId) -> Result<ClaimantId, ClaimError> {
        let member = self.get_player(player)?;
        let town_id = member.town().ok_or(ClaimError::NotInTown(player))?;

        match self.get_town(town_id) {
            Ok(town) => {
                if town.owner() == player {
                    return Err(ClaimError::OwnerCannotLeave {
                        player,
                        town: town_id,
                    });
                }
                town.remove_member(player);
            }
            Err(ClaimError::NoSuchTown(_) | ClaimError::WrongClaimantType { .. }) => {
                tracing::warn!(player = %player, town = %town_id, "Leaving a town that no longer exists");
            }
            Err(e) => return Err(e),
        }
        member.set_town(None);

        tracing::info!(player = %player, town = %town_id, "Player left town");
        Ok(town_id)
    }

    // -----------------------------------------------------------------------
    // Persistence and cache maintenance
    // -----------------------------------------------------------------------

    /// Write every dirty claimant through the store.
    ///
    /// Records are snapshotted first; all locks are released before any
    /// write. A failed write is logged and reported, leaves the claimant
    /// dirty, and does not stop the batch.
    ///
    /// Cycles never overlap: a call made while another cycle is writing
    /// waits for it, so an older snapshot cannot land after a newer one.
    pub fn persist(&self) -> PersistReport {
        let _cycle = sync::lock(&self.persisting);
        let dirty: Vec<Claimant> = sync::read(&self.claimants)
            .values()
            .filter(|claimant| claimant.is_dirty())
            .cloned()
            .collect();

        let snapshots: Vec<_> = dirty
            .into_iter()
            .map(|claimant| {
                let generation = claimant.base().generation();
                let record = claimant.to_record();
                (claimant, generation, record)
            })
            .collect();

        let mut report = PersistReport::default();
        for (claimant, generation, record) in snapshots {
            match self.store.save(&record) {
                Ok(()) => {
                    claimant.base().mark_saved(generation);
                    report.saved.push(record.id);
                }
                Err(e) => {
                    tracing::warn!(claimant = %record.id, error = %e, "Failed to persist claimant, will retry");
                    report.failed.push(ClaimError::PersistenceWriteFailed {
                        id: record.id,
                        source: e,
                    });
                }
            }
        }

        if !report.saved.is_empty() || !report.failed.is_empty() {
            tracing::info!(
                saved = report.saved.len(),
                failed = report.failed.len(),
                "Persistence cycle complete"
            );
        }
        report
    }

    /// Run [`persist`](Self::persist) on tokio's blocking pool.
    pub fn spawn_persist(self: &Arc<Self>) -> JoinHandle<PersistReport> {
        let registry = Arc::clone(self);
        tokio::task::spawn_blocking(move || registry.persist())
    }

    /// Drop idle claimants from the cache. Returns how many were dropped.
    ///
    /// Idle claimants own no units, have nothing unsaved, and are not
    /// referenced outside the registry. Their records stay in the store.
    pub fn evict_idle(&self) -> usize {
        let mut claimants = sync::write(&self.claimants);
        let before = claimants.len();
        claimants.retain(|_, claimant| !claimant.is_idle());
        let evicted = before.saturating_sub(claimants.len());
        drop(claimants);

        if evicted > 0 {
            tracing::debug!(evicted, "Evicted idle claimants");
        }
        evicted
    }
}
