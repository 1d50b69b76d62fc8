//! Fuzz target for CSV event log parsing.
//!
//! Tests that `parse_log` handles arbitrary text without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pcm_core::input::{parse_log, InputFormat};

fuzz_target!(|data: &str| {
    let _ = parse_log(data, InputFormat::Csv);
});
