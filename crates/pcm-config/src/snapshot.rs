//! Configuration snapshots for fit reports and reproducibility.
//!
//! A snapshot records the exact configuration a fit ran with, so a catalogue
//! can be traced back to the settings that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::miner::MinerConfig;
use crate::resolve::{resolve_config, ConfigPath, ConfigSource};
use crate::validate::{validate_miner_config, ValidationResult};

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// SHA-256 hash of the config file content (None for defaults).
    #[serde(default)]
    pub config_hash: Option<String>,

    /// Path the config was loaded from.
    #[serde(default)]
    pub config_path: Option<String>,

    /// Source of the configuration.
    pub config_source: String,

    /// Effective values after CLI overrides.
    pub effective: MinerConfig,
}

impl ConfigSnapshot {
    /// Create a new snapshot from the effective config.
    pub fn new(config: &MinerConfig, resolved: &ConfigPath, raw_json: Option<&str>) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            config_hash: raw_json.map(hash_content),
            config_path: resolved.path.as_ref().map(|p| p.display().to_string()),
            config_source: resolved.source.to_string(),
            effective: config.clone(),
        }
    }

    /// Replace the effective config (after CLI overrides were applied).
    pub fn with_effective(mut self, config: &MinerConfig) -> Self {
        self.effective = config.clone();
        self
    }

    /// Whether built-in defaults were used (no file found).
    pub fn is_default(&self) -> bool {
        self.config_path.is_none()
    }
}

/// A loaded configuration together with its provenance.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: MinerConfig,
    pub snapshot: ConfigSnapshot,
}

/// Resolve, read, parse and validate the miner configuration.
///
/// Falls back to `MinerConfig::default()` when no file is found.
pub fn load_config(cli_path: Option<&Path>) -> ValidationResult<LoadedConfig> {
    let resolved = resolve_config(cli_path);
    let (config, raw) = match resolved.path.as_deref() {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                crate::ValidationError::IoError(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                ))
            })?;
            (MinerConfig::from_json(&raw)?, Some(raw))
        }
        None => {
            debug_assert_eq!(resolved.source, ConfigSource::BuiltinDefault);
            (MinerConfig::default(), None)
        }
    };
    validate_miner_config(&config)?;
    let snapshot = ConfigSnapshot::new(&config, &resolved, raw.as_deref());
    Ok(LoadedConfig { config, snapshot })
}

/// Compute SHA-256 hash of content.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_content_is_stable() {
        let a = hash_content(r#"{"max_length": 10}"#);
        let b = hash_content(r#"{"max_length": 10}"#);
        let c = hash_content(r#"{"max_length": 11}"#);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_snapshot_for_defaults() {
        let config = MinerConfig::default();
        let snapshot = ConfigSnapshot::new(&config, &ConfigPath::default(), None);
        assert!(snapshot.is_default());
        assert!(snapshot.config_hash.is_none());
        assert_eq!(snapshot.config_source, "builtin default");
        assert_eq!(snapshot.effective, config);
    }

    #[test]
    fn test_load_config_from_cli_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("miner.json");
        std::fs::write(&path, r#"{"max_length": 6, "keep_residuals": true}"#).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.config.max_length, 6);
        assert!(loaded.config.keep_residuals);
        assert!(loaded.snapshot.config_hash.is_some());
        assert_eq!(loaded.snapshot.config_source, "CLI argument");
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("miner.json");
        std::fs::write(&path, r#"{"max_length": 1}"#).unwrap();

        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_with_effective_overrides() {
        let snapshot = ConfigSnapshot::new(&MinerConfig::default(), &ConfigPath::default(), None)
            .with_effective(&MinerConfig::default().with_overlap(true));
        assert!(snapshot.effective.overlap);
    }
}
