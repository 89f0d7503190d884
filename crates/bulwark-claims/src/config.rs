//! Claim limit configuration as seen by the core.
//!
//! The core only reads one value, the per-player base claim limit. It is
//! read on every capacity check because operators may change it while the
//! server runs.
//!
//! | Value | Meaning |
//! |-------|---------|
//! | `0` | Claiming is disabled for players |
//! | `> 0` | Each player may own this many units plus their bonus |
//! | `< 0` | Unlimited |

use std::sync::atomic::{AtomicI32, Ordering};

/// Base claim limit used when no configuration overrides it.
pub const DEFAULT_BASE_CLAIM_LIMIT: i32 = 40;

/// Source of the configured base claim limit.
pub trait ConfigProvider: Send + Sync {
    /// The current base claim limit per player.
    fn base_claim_limit(&self) -> i32;
}

/// A runtime-adjustable base claim limit.
///
/// Backed by an atomic so the operator can change it from any thread
/// without locking the registry.
#[derive(Debug)]
pub struct SharedClaimLimit {
    limit: AtomicI32,
}

impl SharedClaimLimit {
    /// Create a provider starting at `limit`.
    pub const fn new(limit: i32) -> Self {
        Self {
            limit: AtomicI32::new(limit),
        }
    }

    /// Replace the limit. Takes effect on the next capacity check.
    pub fn set(&self, limit: i32) {
        self.limit.store(limit, Ordering::Release);
    }
}

impl Default for SharedClaimLimit {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_CLAIM_LIMIT)
    }
}

impl ConfigProvider for SharedClaimLimit {
    fn base_claim_limit(&self) -> i32 {
        self.limit.load(Ordering::Acquire)
    }
}
