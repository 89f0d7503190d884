//! Claim-holders: the shared base and the player/town variants.
//!
//! Every claim-holder is a [`ClaimantBase`] composed into either a
//! [`PlayerClaimant`] or a [`TownClaimant`]. The registry hands them out as
//! the [`Claimant`] sum type, which wraps an [`Arc`] so that repeated lookups
//! return the same instance.
//!
//! # Dirty tracking
//!
//! The base keeps two counters: `generation`, bumped after every mutation,
//! and `saved_generation`, advanced after a successful write of a snapshot
//! taken at some generation. A claimant is dirty while the two differ, so a
//! mutation that lands while a write is in flight keeps it dirty.
//!
//! # Locking
//!
//! Methods take at most one claimant lock at a time and release it before
//! returning. Mutations call [`ClaimantBase::mark_dirty`] after the guarded
//! write, never before.

mod player;
mod town;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use bulwark_types::{
    ClaimTag, ClaimantDetails, ClaimantId, ClaimantKind, ClaimantRecord, Permission, Rank,
    Setting,
};
use chrono::Utc;

use crate::name::{self, DisplayName, NameResolver};
use crate::sync;

pub use player::{PlayerClaimant, PlayerState};
pub use town::{TownClaimant, TownState};

// ---------------------------------------------------------------------------
// ClaimantBase
// ---------------------------------------------------------------------------

/// Lock-guarded state shared by every kind of claimant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseState {
    /// Ranks granted to other identities (friends for players, members for towns).
    pub ranks: BTreeMap<ClaimantId, Rank>,
    /// Per-permission rank requirements that replace the defaults.
    pub rank_overrides: BTreeMap<Permission, Rank>,
    /// Per-setting values that replace the defaults.
    pub setting_overrides: BTreeMap<Setting, bool>,
    /// Units this claimant owns. Mirrors the registry index.
    pub owned: BTreeSet<ClaimTag>,
}

/// Identity, name cache, dirty flag and shared state of a claimant.
#[derive(Debug)]
pub struct ClaimantBase {
    id: ClaimantId,
    generation: AtomicU64,
    saved_generation: AtomicU64,
    name: Mutex<DisplayName>,
    state: RwLock<BaseState>,
}

impl ClaimantBase {
    /// Create a clean base with no overrides, ranks or units.
    pub fn new(id: ClaimantId) -> Self {
        Self::with_state(id, DisplayName::Unset, BaseState::default())
    }

    fn with_state(id: ClaimantId, name: DisplayName, state: BaseState) -> Self {
        Self {
            id,
            generation: AtomicU64::new(0),
            saved_generation: AtomicU64::new(0),
            name: Mutex::new(name),
            state: RwLock::new(state),
        }
    }

    /// Rebuild the base half of a claimant from its record.
    ///
    /// `ranks` comes from the kind-specific details (friends or members).
    pub(crate) fn from_record(record: &ClaimantRecord, ranks: BTreeMap<ClaimantId, Rank>) -> Self {
        let name = record
            .display_name
            .clone()
            .map_or(DisplayName::Unset, DisplayName::Cached);
        let state = BaseState {
            ranks,
            rank_overrides: record.rank_overrides.clone(),
            setting_overrides: record.setting_overrides.clone(),
            owned: record.owned_units.iter().cloned().collect(),
        };
        Self::with_state(record.id, name, state)
    }

    /// Produce a record from the base state under a single read lock.
    ///
    /// `details` receives a copy of the rank table and builds the
    /// kind-specific half of the record.
    pub(crate) fn to_record(
        &self,
        details: impl FnOnce(BTreeMap<ClaimantId, Rank>) -> ClaimantDetails,
    ) -> ClaimantRecord {
        let display_name = self.cached_name();
        let state = sync::read(&self.state);
        ClaimantRecord {
            id: self.id,
            display_name,
            owned_units: state.owned.iter().cloned().collect(),
            rank_overrides: state.rank_overrides.clone(),
            setting_overrides: state.setting_overrides.clone(),
            saved_at: Utc::now(),
            details: details(state.ranks.clone()),
        }
    }

    /// The claimant's identity.
    pub const fn id(&self) -> ClaimantId {
        self.id
    }

    // -----------------------------------------------------------------------
    // Dirty tracking
    // -----------------------------------------------------------------------

    /// Whether in-memory state is newer than the last successful write.
    pub fn is_dirty(&self) -> bool {
        self.generation.load(Ordering::Acquire) != self.saved_generation.load(Ordering::Acquire)
    }

    /// Record that state changed and needs to be persisted.
    pub fn mark_dirty(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// The current mutation generation. Read before taking a snapshot.
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Record that a snapshot taken at `generation` was written.
    pub(crate) fn mark_saved(&self, generation: u64) {
        self.saved_generation.fetch_max(generation, Ordering::AcqRel);
    }

    // -----------------------------------------------------------------------
    // Permissions and settings
    // -----------------------------------------------------------------------

    /// The rank required for `permission`: the override if set, else the default.
    pub fn permission_rank_requirement(&self, permission: Permission) -> Rank {
        sync::read(&self.state)
            .rank_overrides
            .get(&permission)
            .copied()
            .unwrap_or_else(|| permission.default_rank())
    }

    /// Override the rank required for `permission`.
    pub fn set_permission_rank(&self, permission: Permission, rank: Rank) {
        sync::write(&self.state).rank_overrides.insert(permission, rank);
        self.mark_dirty();
    }

    /// Drop the override for `permission`. Returns whether one existed.
    pub fn clear_permission_rank(&self, permission: Permission) -> bool {
        let removed = sync::write(&self.state)
            .rank_overrides
            .remove(&permission)
            .is_some();
        if removed {
            self.mark_dirty();
        }
        removed
    }

    /// The value of `setting`: the override if set, else the contextual default.
    pub fn setting_value(&self, setting: Setting) -> bool {
        sync::read(&self.state)
            .setting_overrides
            .get(&setting)
            .copied()
            .unwrap_or_else(|| setting.default_for(self.id))
    }

    /// Override the value of `setting`.
    pub fn set_setting(&self, setting: Setting, value: bool) {
        sync::write(&self.state).setting_overrides.insert(setting, value);
        self.mark_dirty();
    }

    /// Drop the override for `setting`. Returns whether one existed.
    pub fn clear_setting(&self, setting: Setting) -> bool {
        let removed = sync::write(&self.state)
            .setting_overrides
            .remove(&setting)
            .is_some();
        if removed {
            self.mark_dirty();
        }
        removed
    }

    // -----------------------------------------------------------------------
    // Rank table
    // -----------------------------------------------------------------------

    /// The stored rank for `other`, if any.
    pub fn rank_of(&self, other: ClaimantId) -> Option<Rank> {
        sync::read(&self.state).ranks.get(&other).copied()
    }

    /// The stored rank for `other`, or [`Rank::MIN`] if absent.
    pub fn friend_rank(&self, other: ClaimantId) -> Rank {
        self.rank_of(other).unwrap_or(Rank::MIN)
    }

    /// Store `rank` for `other`, replacing any previous entry.
    pub fn set_friend_rank(&self, other: ClaimantId, rank: Rank) {
        sync::write(&self.state).ranks.insert(other, rank);
        self.mark_dirty();
    }

    /// Remove the entry for `other`. Returns whether one existed.
    pub fn remove_friend(&self, other: ClaimantId) -> bool {
        let removed = sync::write(&self.state).ranks.remove(&other).is_some();
        if removed {
            self.mark_dirty();
        }
        removed
    }

    /// Insert `rank` for `other` only if no entry exists.
    pub(crate) fn insert_rank_if_absent(&self, other: ClaimantId, rank: Rank) -> bool {
        let inserted = {
            let mut state = sync::write(&self.state);
            if state.ranks.contains_key(&other) {
                false
            } else {
                state.ranks.insert(other, rank);
                true
            }
        };
        if inserted {
            self.mark_dirty();
        }
        inserted
    }

    /// Replace the rank for `other` only if an entry exists.
    pub(crate) fn update_rank(&self, other: ClaimantId, rank: Rank) -> bool {
        let updated = match sync::write(&self.state).ranks.get_mut(&other) {
            Some(entry) => {
                *entry = rank;
                true
            }
            None => false,
        };
        if updated {
            self.mark_dirty();
        }
        updated
    }

    /// A copy of the full rank table.
    pub fn ranks(&self) -> BTreeMap<ClaimantId, Rank> {
        sync::read(&self.state).ranks.clone()
    }

    // -----------------------------------------------------------------------
    // Owned units
    // -----------------------------------------------------------------------

    /// Whether this claimant owns `unit`.
    pub fn owns(&self, unit: &ClaimTag) -> bool {
        sync::read(&self.state).owned.contains(unit)
    }

    /// Number of owned units.
    pub fn owned_count(&self) -> usize {
        sync::read(&self.state).owned.len()
    }

    /// A sorted copy of the owned units.
    pub fn owned_units(&self) -> Vec<ClaimTag> {
        sync::read(&self.state).owned.iter().cloned().collect()
    }

    /// Add `unit` to the owned set. Only the registry calls this, under
    /// the index lock; it does not mark dirty.
    pub(crate) fn insert_unit(&self, unit: ClaimTag) -> bool {
        sync::write(&self.state).owned.insert(unit)
    }

    /// Remove `unit` from the owned set. Registry-only, like [`Self::insert_unit`].
    pub(crate) fn remove_unit(&self, unit: &ClaimTag) -> bool {
        sync::write(&self.state).owned.remove(unit)
    }

    // -----------------------------------------------------------------------
    // Display name
    // -----------------------------------------------------------------------

    /// The cached display name, without resolving.
    pub fn cached_name(&self) -> Option<String> {
        sync::lock(&self.name).get().map(str::to_owned)
    }

    /// The display name, resolving and caching it on a miss.
    ///
    /// The resolver runs without the cache lock held. Failures degrade to
    /// the placeholder, which is not cached so the next read retries.
    pub fn display_name(&self, resolver: &dyn NameResolver) -> String {
        if let Some(name) = self.cached_name() {
            return name;
        }
        match resolver.resolve(self.id) {
            Ok(resolved) => {
                *sync::lock(&self.name) = DisplayName::Cached(resolved.clone());
                resolved
            }
            Err(e) => {
                tracing::warn!(claimant = %self.id, error = %e, "Name resolution failed, using placeholder");
                name::PLACEHOLDER_NAME.to_owned()
            }
        }
    }

    /// Store a known display name.
    pub fn set_cached_name(&self, name: impl Into<String>) {
        *sync::lock(&self.name) = DisplayName::Cached(name.into());
    }

    /// Forget the cached name so the next read resolves again.
    pub fn invalidate_name(&self) {
        *sync::lock(&self.name) = DisplayName::Unset;
    }
}

// ---------------------------------------------------------------------------
// Claimant
// ---------------------------------------------------------------------------

/// A claim-holder handle as returned by the registry.
///
/// Cloning is cheap and yields a handle to the same instance.
#[derive(Debug, Clone)]
pub enum Claimant {
    /// An individual player.
    Player(Arc<PlayerClaimant>),
    /// A town.
    Town(Arc<TownClaimant>),
}

impl Claimant {
    /// Rebuild a claimant from its persisted record.
    pub fn from_record(record: &ClaimantRecord) -> Self {
        match &record.details {
            ClaimantDetails::Player(details) => {
                Self::Player(Arc::new(PlayerClaimant::from_parts(record, details)))
            }
            ClaimantDetails::Town(details) => {
                Self::Town(Arc::new(TownClaimant::from_parts(record, details)))
            }
        }
    }

    /// Serialize the claimant: base fields plus kind-specific fields.
    pub fn to_record(&self) -> ClaimantRecord {
        match self {
            Self::Player(player) => player.to_record(),
            Self::Town(town) => town.to_record(),
        }
    }

    /// The shared base.
    pub fn base(&self) -> &ClaimantBase {
        match self {
            Self::Player(player) => player.base(),
            Self::Town(town) => town.base(),
        }
    }

    /// The claimant's identity.
    pub fn id(&self) -> ClaimantId {
        self.base().id()
    }

    /// Which kind of claimant this is.
    pub const fn kind(&self) -> ClaimantKind {
        match self {
            Self::Player(_) => ClaimantKind::Player,
            Self::Town(_) => ClaimantKind::Town,
        }
    }

    /// The rank `other` holds with this claimant.
    pub fn friend_rank(&self, other: ClaimantId) -> Rank {
        match self {
            Self::Player(player) => player.friend_rank(other),
            Self::Town(town) => town.friend_rank(other),
        }
    }

    /// See [`ClaimantBase::permission_rank_requirement`].
    pub fn permission_rank_requirement(&self, permission: Permission) -> Rank {
        self.base().permission_rank_requirement(permission)
    }

    /// See [`ClaimantBase::setting_value`].
    pub fn setting_value(&self, setting: Setting) -> bool {
        self.base().setting_value(setting)
    }

    /// Whether the claimant has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.base().is_dirty()
    }

    /// The display name: the town name for towns, the resolved name for players.
    pub fn display_name(&self, resolver: &dyn NameResolver) -> String {
        match self {
            Self::Player(player) => player.base().display_name(resolver),
            Self::Town(town) => town.name(),
        }
    }

    /// The player variant, if this is one.
    pub const fn as_player(&self) -> Option<&Arc<PlayerClaimant>> {
        match self {
            Self::Player(player) => Some(player),
            Self::Town(_) => None,
        }
    }

    /// The town variant, if this is one.
    pub const fn as_town(&self) -> Option<&Arc<TownClaimant>> {
        match self {
            Self::Player(_) => None,
            Self::Town(town) => Some(town),
        }
    }

    /// Whether both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Player(a), Self::Player(b)) => Arc::ptr_eq(a, b),
            (Self::Town(a), Self::Town(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether the registry may drop this entry from its cache.
    ///
    /// Idle means: no units, nothing unsaved, no transient state that is
    /// not persisted (pending invites), and no handles outside the registry.
    pub(crate) fn is_idle(&self) -> bool {
        let unreferenced = match self {
            Self::Player(player) => {
                Arc::strong_count(player) == 1 && player.pending_invites().is_empty()
            }
            Self::Town(town) => Arc::strong_count(town) == 1,
        };
        unreferenced && !self.is_dirty() && self.base().owned_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::StaticNameResolver;

    #[test]
    fn overrides_replace_defaults() {
        let base = ClaimantBase::new(ClaimantId::new());
        assert_eq!(base.permission_rank_requirement(Permission::Storage), Rank::Trusted);
        base.set_permission_rank(Permission::Storage, Rank::Ally);
        assert_eq!(base.permission_rank_requirement(Permission::Storage), Rank::Ally);
        assert!(base.clear_permission_rank(Permission::Storage));
        assert!(!base.clear_permission_rank(Permission::Storage));
        assert_eq!(base.permission_rank_requirement(Permission::Storage), Rank::Trusted);

        assert!(base.setting_value(Setting::PlayerCombat));
        base.set_setting(Setting::PlayerCombat, false);
        assert!(!base.setting_value(Setting::PlayerCombat));
    }

    #[test]
    fn mutations_mark_dirty_until_saved() {
        let base = ClaimantBase::new(ClaimantId::new());
        assert!(!base.is_dirty());
        base.set_friend_rank(ClaimantId::new(), Rank::Ally);
        assert!(base.is_dirty());
        let generation = base.generation();
        base.mark_saved(generation);
        assert!(!base.is_dirty());
    }

    #[test]
    fn mutation_after_snapshot_stays_dirty() {
        let base = ClaimantBase::new(ClaimantId::new());
        base.set_setting(Setting::FireSpread, true);
        let generation = base.generation();
        base.set_setting(Setting::TntExplosions, true);
        base.mark_saved(generation);
        assert!(base.is_dirty());
    }

    #[test]
    fn absent_friend_is_lowest_rank() {
        let base = ClaimantBase::new(ClaimantId::new());
        let stranger = ClaimantId::new();
        assert_eq!(base.rank_of(stranger), None);
        assert_eq!(base.friend_rank(stranger), Rank::MIN);
    }

    #[test]
    fn display_name_is_cached_until_invalidated() {
        let id = ClaimantId::new();
        let base = ClaimantBase::new(id);
        let resolver = StaticNameResolver::new("Spawn");
        assert_eq!(base.display_name(&resolver), name::PLACEHOLDER_NAME);
        assert_eq!(base.cached_name(), None);

        resolver.insert(id, "Steve");
        assert_eq!(base.display_name(&resolver), "Steve");
        resolver.insert(id, "Alex");
        assert_eq!(base.display_name(&resolver), "Steve");

        base.invalidate_name();
        assert_eq!(base.display_name(&resolver), "Alex");
    }

    #[test]
    fn handles_compare_by_instance() {
        let player = Arc::new(PlayerClaimant::new(ClaimantId::new()));
        let a = Claimant::Player(Arc::clone(&player));
        let b = Claimant::Player(player);
        let other = Claimant::Player(Arc::new(PlayerClaimant::new(a.id())));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&other));
    }
}
