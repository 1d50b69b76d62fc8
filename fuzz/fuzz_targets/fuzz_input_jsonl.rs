//! Fuzz target for JSON and JSONL event log parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pcm_core::input::{parse_log, InputFormat};

fuzz_target!(|data: &str| {
    let _ = parse_log(data, InputFormat::Jsonl);
    let _ = parse_log(data, InputFormat::Json);
});
