//! Shared type definitions for the Bulwark claim protection engine.
//!
//! This crate holds the plain value types that every other crate in the
//! workspace speaks: identifiers, claim tags, the rank ladder, permission and
//! setting kinds, and the persisted claimant record.
//!
//! # Modules
//!
//! - [`ids`] -- [`ClaimantId`] and the reserved [`SPAWN_ID`]
//! - [`enums`] -- [`Rank`], [`Permission`], [`Setting`], [`ClaimantKind`]
//! - [`tag`] -- [`ClaimTag`], the smallest ownable unit
//! - [`record`] -- [`ClaimantRecord`], the persisted form of a claimant

pub mod enums;
pub mod ids;
pub mod record;
pub mod tag;

// Re-export all public types at crate root for convenience.
pub use enums::{ClaimantKind, Permission, Rank, Setting};
pub use ids::{ClaimantId, SPAWN_ID};
pub use record::{ClaimantDetails, ClaimantRecord, PlayerDetails, TownDetails};
pub use tag::{ClaimTag, UNIT_SIZE};
