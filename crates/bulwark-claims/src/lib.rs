//! Claim ownership, trust ranks and towns for Bulwark.
//!
//! This crate owns every claimant and the global unit index, and decides
//! whether an actor may perform a protected action inside a claim.
//!
//! # Modules
//!
//! - [`claimant`] -- [`ClaimantBase`] and the [`PlayerClaimant`] /
//!   [`TownClaimant`] variants behind the [`Claimant`] handle.
//! - [`registry`] -- [`ClaimRegistry`]: lookup, claim/unclaim, towns,
//!   persistence and cache eviction.
//! - [`permission`] -- [`resolve`](permission::resolve) and
//!   [`resolve_at`](permission::resolve_at).
//! - [`store`] -- the [`ClaimStore`] collaborator and [`MemoryStore`].
//! - [`name`] -- the [`NameResolver`] collaborator and name caching.
//! - [`config`] -- the [`ConfigProvider`] collaborator.
//! - [`error`] -- [`ClaimError`] and [`StoreError`].

pub mod claimant;
pub mod config;
pub mod error;
pub mod name;
pub mod permission;
pub mod registry;
pub mod store;

mod sync;

pub use claimant::{
    BaseState, Claimant, ClaimantBase, PlayerClaimant, PlayerState, TownClaimant, TownState,
};
pub use config::{ConfigProvider, DEFAULT_BASE_CLAIM_LIMIT, SharedClaimLimit};
pub use error::{ClaimError, StoreError};
pub use name::{DisplayName, NameError, NameResolver, PLACEHOLDER_NAME, StaticNameResolver};
pub use registry::{ClaimOutcome, ClaimRegistry, PersistReport};
pub use store::{ClaimStore, MemoryStore};
