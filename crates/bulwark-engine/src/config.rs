//! Configuration loading and typed config structures for the Bulwark engine.
//!
//! The configuration lives in `bulwark-config.yaml` in the working
//! directory. Every field has a default, so a missing file or a partial
//! file is valid.

use std::path::{Path, PathBuf};

use bulwark_claims::DEFAULT_BASE_CLAIM_LIMIT;
use serde::Deserialize;

/// Environment variable that overrides `storage.data_dir`.
pub const DATA_DIR_ENV: &str = "BULWARK_DATA_DIR";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `bulwark-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BulwarkConfig {
    /// Claim limits and the spawn claimant.
    #[serde(default)]
    pub claims: ClaimsConfig,

    /// Record storage and flush cadence.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BulwarkConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `BULWARK_DATA_DIR` overrides `storage.data_dir` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.storage.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Claim limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClaimsConfig {
    /// Units each player may own before bonuses. `0` disables claiming,
    /// negative values are unlimited.
    #[serde(default = "default_base_claim_limit")]
    pub base_claim_limit: i32,

    /// Display name of the spawn claimant.
    #[serde(default = "default_spawn_name")]
    pub spawn_name: String,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self {
            base_claim_limit: default_base_claim_limit(),
            spawn_name: default_spawn_name(),
        }
    }
}

/// Record storage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON record per claimant.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Milliseconds between persistence cycles.
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

impl StorageConfig {
    /// Override the data directory with `BULWARK_DATA_DIR` when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var(DATA_DIR_ENV).filter(|val| !val.is_empty()) {
            self.data_dir = PathBuf::from(val);
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            flush_interval_ms: default_flush_interval_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_base_claim_limit() -> i32 {
    DEFAULT_BASE_CLAIM_LIMIT
}

fn default_spawn_name() -> String {
    "Spawn".to_owned()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/claims")
}

const fn default_flush_interval_ms() -> u64 {
    30_000
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = BulwarkConfig::default();
        assert_eq!(config.claims.base_claim_limit, DEFAULT_BASE_CLAIM_LIMIT);
        assert_eq!(config.claims.spawn_name, "Spawn");
        assert_eq!(config.storage.flush_interval_ms, 30_000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
claims:
  base_claim_limit: -1
  spawn_name: "World Spawn"

storage:
  data_dir: "/var/lib/bulwark"
  flush_interval_ms: 5000

logging:
  level: "debug"
"#;
        let config = BulwarkConfig::parse(yaml).ok();
        assert!(config.is_some());
        let Some(config) = config else { return };
        assert_eq!(config.claims.base_claim_limit, -1);
        assert_eq!(config.claims.spawn_name, "World Spawn");
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/bulwark"));
        assert_eq!(config.storage.flush_interval_ms, 5000);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let yaml = "claims:\n  base_claim_limit: 0\n";
        let config = BulwarkConfig::parse(yaml).ok();
        assert!(config.is_some());
        let Some(config) = config else { return };
        assert_eq!(config.claims.base_claim_limit, 0);
        assert_eq!(config.claims.spawn_name, "Spawn");
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = BulwarkConfig::parse("claims: [unterminated");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn data_dir_env_override() {
        let mut storage = StorageConfig::default();
        storage.apply_overrides_from(|_| None);
        assert_eq!(storage.data_dir, default_data_dir());

        storage.apply_overrides_from(|key| (key == DATA_DIR_ENV).then(|| "/srv/claims".to_owned()));
        assert_eq!(storage.data_dir, PathBuf::from("/srv/claims"));

        storage.apply_overrides_from(|_| Some(String::new()));
        assert_eq!(storage.data_dir, PathBuf::from("/srv/claims"));
    }
}
