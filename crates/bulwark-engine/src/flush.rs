//! Periodic persistence loop.
//!
//! Every interval the loop runs one persistence cycle on tokio's blocking
//! pool and then evicts idle claimants. When the shutdown future resolves
//! it runs a final cycle and returns.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bulwark_claims::{ClaimRegistry, PersistReport};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Shortest allowed interval between cycles.
pub const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Totals across every cycle the loop ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Cycles run, including the final one.
    pub cycles: u64,
    /// Records written.
    pub saved: usize,
    /// Writes that failed (each is retried on a later cycle).
    pub failed: usize,
    /// Claimants evicted from the cache.
    pub evicted: usize,
    /// Writes still failing after the final cycle.
    pub failed_at_shutdown: usize,
}

impl FlushSummary {
    fn record(&mut self, report: &PersistReport) {
        self.cycles = self.cycles.saturating_add(1);
        self.saved = self.saved.saturating_add(report.saved.len());
        self.failed = self.failed.saturating_add(report.failed.len());
    }
}

/// Run persistence cycles every `interval` until `shutdown` resolves.
///
/// Intervals below [`MIN_FLUSH_INTERVAL`] are raised to it.
pub async fn run_flush_loop(
    registry: Arc<ClaimRegistry>,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> FlushSummary {
    let period = interval.max(MIN_FLUSH_INTERVAL);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut summary = FlushSummary::default();
    let interval_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
    info!(interval_ms, "Flush loop starting");

    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => break,
            _ = ticker.tick() => {
                if let Some(report) = flush_once(&registry).await {
                    summary.record(&report);
                }
                summary.evicted = summary.evicted.saturating_add(registry.evict_idle());
            }
        }
    }

    info!("Shutdown requested, running final flush");
    if let Some(report) = flush_once(&registry).await {
        summary.record(&report);
        summary.failed_at_shutdown = report.failed.len();
        for failure in &report.failed {
            warn!(error = %failure, "Record not persisted before shutdown");
        }
    }

    info!(
        cycles = summary.cycles,
        saved = summary.saved,
        failed = summary.failed,
        evicted = summary.evicted,
        "Flush loop stopped"
    );
    summary
}

/// Run one persistence cycle off the async workers.
async fn flush_once(registry: &Arc<ClaimRegistry>) -> Option<PersistReport> {
    match registry.spawn_persist().await {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::error!(error = %e, "Persistence task did not complete");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use bulwark_claims::{ClaimStore, MemoryStore, SharedClaimLimit, StaticNameResolver};
    use bulwark_types::{ClaimTag, ClaimantId};

    use super::*;

    fn registry(store: &Arc<MemoryStore>) -> Arc<ClaimRegistry> {
        Arc::new(ClaimRegistry::new(
            Arc::clone(store) as Arc<dyn ClaimStore>,
            Arc::new(SharedClaimLimit::new(10)),
            Arc::new(StaticNameResolver::new("Spawn")),
        ))
    }

    #[tokio::test]
    async fn final_flush_runs_on_immediate_shutdown() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry(&store);
        let actor = ClaimantId::new();
        assert!(registry.claim(actor, ClaimTag::new("overworld", 0, 0)).is_ok());

        let summary = run_flush_loop(Arc::clone(&registry), MIN_FLUSH_INTERVAL, async {}).await;

        assert_eq!(summary.cycles, 1);
        assert_eq!(summary.saved, 1);
        assert_eq!(summary.failed_at_shutdown, 0);
        assert!(store.get(actor).is_some());
    }

    #[tokio::test]
    async fn periodic_cycles_persist_and_retry() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry(&store);
        let actor = ClaimantId::new();
        assert!(registry.claim(actor, ClaimTag::new("overworld", 1, 1)).is_ok());
        store.fail_saves_for(actor);

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(run_flush_loop(
            Arc::clone(&registry),
            Duration::from_millis(1),
            async move {
                let _ = rx.await;
            },
        ));

        tokio::time::sleep(Duration::from_millis(250)).await;
        store.heal(actor);
        let _ = tx.send(());
        let summary = handle.await.ok().unwrap_or_default();

        assert!(summary.cycles >= 2);
        assert!(summary.failed >= 1);
        assert_eq!(summary.failed_at_shutdown, 0);
        assert!(store.get(actor).is_some());
    }
}
