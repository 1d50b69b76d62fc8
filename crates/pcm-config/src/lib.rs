//! Periodic cycle miner configuration loading and validation.
//!
//! This crate provides:
//! - The typed `MinerConfig` struct (miner.json)
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation
//! - Config snapshots for fit reports

pub mod miner;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use miner::MinerConfig;
pub use resolve::{resolve_config, ConfigPath, ConfigSource};
pub use snapshot::{load_config, ConfigSnapshot, LoadedConfig};
pub use validate::{validate_miner_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
