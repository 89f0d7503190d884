//! Bulwark claim service binary.
//!
//! Wires the claim registry to its collaborators, loads every stored
//! claimant, and keeps the store in sync with a periodic flush loop until
//! the process is interrupted.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `bulwark-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Open the record store
//! 4. Build the registry and load stored claimants
//! 5. Run the flush loop until Ctrl-C
//! 6. Log the result

mod config;
mod error;
mod flush;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bulwark_claims::{ClaimRegistry, ClaimStore, SharedClaimLimit, StaticNameResolver};
use bulwark_db::FileStore;
use bulwark_types::SPAWN_ID;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::BulwarkConfig;
use crate::error::EngineError;

/// Configuration file looked up in the working directory.
const CONFIG_FILE: &str = "bulwark-config.yaml";

/// Application entry point for the claim service.
///
/// # Errors
///
/// Returns an error if configuration, storage, or the initial load fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so note the source.
    let loaded = load_config()?;
    let from_file = loaded.is_some();
    let config = loaded.unwrap_or_else(|| {
        let mut config = BulwarkConfig::default();
        config.storage.apply_env_overrides();
        config
    });

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("bulwark-engine starting");
    if !from_file {
        info!("Config file not found, using defaults");
    }
    info!(
        base_claim_limit = config.claims.base_claim_limit,
        spawn_name = config.claims.spawn_name,
        data_dir = %config.storage.data_dir.display(),
        flush_interval_ms = config.storage.flush_interval_ms,
        "Configuration loaded"
    );

    // 3. Open the record store.
    let store = FileStore::open(&config.storage.data_dir).map_err(EngineError::from)?;

    // 4. Build the registry and load stored claimants.
    let registry = Arc::new(ClaimRegistry::new(
        Arc::new(store) as Arc<dyn ClaimStore>,
        Arc::new(SharedClaimLimit::new(config.claims.base_claim_limit)),
        Arc::new(StaticNameResolver::new(config.claims.spawn_name)),
    ));
    let loaded = registry.load_all().map_err(EngineError::from)?;
    let spawn_name = registry.display_name(SPAWN_ID).map_err(EngineError::from)?;
    info!(claimants = loaded, spawn = spawn_name, "Registry ready");

    // 5. Run the flush loop until interrupted.
    let interval = Duration::from_millis(config.storage.flush_interval_ms);
    let summary = flush::run_flush_loop(registry, interval, shutdown_signal()).await;

    // 6. Log results.
    if summary.failed_at_shutdown > 0 {
        warn!(
            unsaved = summary.failed_at_shutdown,
            "Some claimants were not persisted before shutdown"
        );
    }
    info!(
        cycles = summary.cycles,
        saved = summary.saved,
        "bulwark-engine shutdown complete"
    );

    Ok(())
}

/// Load the engine configuration from `bulwark-config.yaml`.
///
/// Returns `None` when the file does not exist.
fn load_config() -> Result<Option<BulwarkConfig>, EngineError> {
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        Ok(Some(BulwarkConfig::from_file(config_path)?))
    } else {
        Ok(None)
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed, resolves at once.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
    }
}
