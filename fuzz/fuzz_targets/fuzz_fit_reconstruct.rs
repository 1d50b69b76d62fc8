//! Fuzz target for the full fit pipeline.
//!
//! Any valid log must fit without panicking and reconstruct to its
//! deduplicated self.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pcm_common::{EventLog, Occurrence};
use pcm_core::{MinerConfig, PeriodicCycleMiner};

#[derive(Debug, Arbitrary)]
struct Input {
    events: Vec<(i32, u8)>,
    max_length: u8,
    overlap: bool,
}

fuzz_target!(|input: Input| {
    if input.events.is_empty() || input.events.len() > 512 {
        return;
    }
    let occurrences: Vec<Occurrence> = input
        .events
        .iter()
        .map(|(t, l)| Occurrence::new(i64::from(*t), format!("l{}", l % 4)))
        .collect();
    let Ok(log) = EventLog::from_unsorted(occurrences) else {
        return;
    };

    let config = MinerConfig::default()
        .with_max_length(usize::from(input.max_length % 30).max(2))
        .with_overlap(input.overlap)
        .with_parallel(false);
    let model = PeriodicCycleMiner::new(config)
        .fit(&log)
        .expect("valid log and config must fit");

    let mut expected = log.into_inner();
    expected.sort();
    expected.dedup();
    assert_eq!(model.reconstruct().as_slice(), expected.as_slice());
});
