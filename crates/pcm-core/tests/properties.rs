//! Property-based tests for the miner's invariants.

use proptest::prelude::*;

use pcm_common::{EventLog, Occurrence};
use pcm_core::cost::CostModel;
use pcm_core::shift::{decode_timestamps, encode_shifts, trim_trailing_zeros};
use pcm_core::{MinerConfig, PeriodicCycleMiner};

/// Small multi-label logs with clustered, partly periodic timestamps.
fn arb_log() -> impl Strategy<Value = Vec<(i64, String)>> {
    let label = prop::sample::select(vec!["a", "b", "c"]).prop_map(str::to_string);
    let periodic = (0i64..50, 1i64..200, 2usize..10, -3i64..=3, label.clone()).prop_map(
        |(start, period, len, jitter, label)| {
            (0..len as i64)
                .map(|i| (start + i * period + if i % 2 == 0 { jitter } else { 0 }, label.clone()))
                .collect::<Vec<_>>()
        },
    );
    let noise = prop::collection::vec((0i64..2_000, label), 0..10);
    (prop::collection::vec(periodic, 0..4), noise).prop_map(|(chunks, noise)| {
        chunks.into_iter().flatten().chain(noise).collect()
    })
}

fn to_log(pairs: &[(i64, String)]) -> Option<EventLog> {
    let occurrences = pairs
        .iter()
        .map(|(t, l)| Occurrence::new(*t, l.as_str()))
        .collect();
    EventLog::from_unsorted(occurrences).ok()
}

fn dedup(log: &EventLog) -> Vec<Occurrence> {
    let mut out = log.as_slice().to_vec();
    out.sort();
    out.dedup();
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reconstruct_round_trips(pairs in arb_log(), overlap in any::<bool>(), parallel in any::<bool>()) {
        prop_assume!(!pairs.is_empty());
        let log = to_log(&pairs).unwrap();
        let config = MinerConfig::default()
            .with_overlap(overlap)
            .with_parallel(parallel)
            .with_keep_residuals(true);
        let model = PeriodicCycleMiner::new(config).fit(&log).unwrap();

        let reconstructed = model.reconstruct();
        let expected = dedup(&log);
        prop_assert_eq!(reconstructed.as_slice(), expected.as_slice());
    }

    #[test]
    fn disjoint_covers_partition_occurrences(pairs in arb_log()) {
        prop_assume!(!pairs.is_empty());
        let log = to_log(&pairs).unwrap();
        let model = PeriodicCycleMiner::new(MinerConfig::default().with_keep_residuals(true))
            .fit(&log)
            .unwrap();

        let covered: usize = model.discover(false).iter().map(|r| r.length).sum();
        let residuals = model.residuals().unwrap().len();
        prop_assert_eq!(covered + residuals, model.occurrence_count());
        prop_assert!(model.total_bits() <= model.baseline_bits() + 1e-9);
    }

    #[test]
    fn cycles_respect_length_bounds(pairs in arb_log(), max_length in 2usize..8) {
        prop_assume!(!pairs.is_empty());
        let log = to_log(&pairs).unwrap();
        let model = PeriodicCycleMiner::new(MinerConfig::default().with_max_length(max_length))
            .fit(&log)
            .unwrap();

        for row in model.discover(true) {
            prop_assert!(row.length >= 2 && row.length <= max_length);
            prop_assert!(row.period > 0);
            let shifts = row.shifts.unwrap();
            prop_assert!(shifts.len() < row.length);
            prop_assert_ne!(shifts.last(), Some(&0));
        }
    }

    #[test]
    fn cycle_cost_grows_with_shift_magnitude(
        shifts in prop::collection::vec(-50i64..50, 1..10),
        idx in any::<prop::sample::Index>(),
        bump in 1i64..20,
    ) {
        let model = CostModel::new(100_000, 50).for_label(20);
        let length = shifts.len() + 1;
        let i = idx.index(shifts.len());

        let mut larger = shifts.clone();
        larger[i] = if shifts[i] >= 0 { shifts[i] + bump } else { shifts[i] - bump };

        let base = model.cycle_cost(length, 100, &shifts).shift_bits;
        let grown = model.cycle_cost(length, 100, &larger).shift_bits;
        prop_assert!(grown > base);
    }

    #[test]
    fn shift_codec_round_trips(
        start in -1_000_000i64..1_000_000,
        gaps in prop::collection::vec(1i64..10_000, 1..20),
    ) {
        let mut gaps = gaps;
        gaps.sort_unstable();
        let period = gaps[(gaps.len() - 1) / 2];
        let mut ts = vec![start];
        for g in &gaps {
            let next = ts[ts.len() - 1] + g;
            ts.push(next);
        }

        let shifts = encode_shifts(&ts, period).unwrap();
        let external = trim_trailing_zeros(&shifts);
        prop_assert_eq!(decode_timestamps(start, ts.len(), period, external), ts);
    }
}
