//! Miner configuration (miner.json).
//!
//! Every field has a default so a partial file, or no file at all, yields a
//! usable configuration.

use serde::{Deserialize, Serialize};

use crate::validate::{validate_miner_config, ValidationError, ValidationResult};

/// Default ceiling on candidate run length.
pub const DEFAULT_MAX_LENGTH: usize = 20;

/// Shortest run that may form a cycle.
pub const MIN_CYCLE_LENGTH: usize = 2;

/// Fit configuration for the periodic cycle miner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Schema version of the configuration file.
    pub schema_version: String,

    /// Longest candidate run considered (bounds worst-case work).
    pub max_length: usize,

    /// Preferred minimum cycle length. When no cycle this long is worth its
    /// bits, generation falls back to shorter runs down to 2.
    pub min_length: usize,

    /// Allow selected cycles to share occurrences (greedy, approximate cover).
    pub overlap: bool,

    /// Keep residual occurrences queryable after the fit.
    pub keep_residuals: bool,

    /// Mine labels concurrently.
    pub parallel: bool,
}

impl Default for MinerConfig {
    fn default() -> Self {
        MinerConfig {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            max_length: DEFAULT_MAX_LENGTH,
            min_length: MIN_CYCLE_LENGTH,
            overlap: false,
            keep_residuals: false,
            parallel: true,
        }
    }
}

impl MinerConfig {
    /// Load miner config from a JSON file.
    pub fn from_file(path: &std::path::Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }

    /// Parse miner config from a JSON string.
    pub fn from_json(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Parse and semantically validate.
    pub fn load(path: &std::path::Path) -> ValidationResult<Self> {
        let config = Self::from_file(path)?;
        validate_miner_config(&config)?;
        Ok(config)
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn with_overlap(mut self, overlap: bool) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn with_keep_residuals(mut self, keep: bool) -> Self {
        self.keep_residuals = keep;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
