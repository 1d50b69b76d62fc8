//! Fuzz target for miner.json configuration parsing.
//!
//! Parsing and validation should only ever return errors.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pcm_config::{validate_miner_config, MinerConfig};

fuzz_target!(|data: &str| {
    if let Ok(config) = MinerConfig::from_json(data) {
        let _ = validate_miner_config(&config);
    }
});
