//! End-to-end mining scenarios through the public API.

use pcm_common::{Error, EventLog, Occurrence};
use pcm_core::{Diagnostic, MinerConfig, PeriodicCycleMiner};

fn log(pairs: &[(i64, &str)]) -> EventLog {
    EventLog::from_unsorted(pairs.iter().map(|(t, l)| Occurrence::new(*t, *l)).collect())
        .expect("valid log")
}

fn single(label: &str, ts: &[i64]) -> EventLog {
    EventLog::from_pairs(ts.iter().map(|t| (*t, label))).expect("valid log")
}

fn dedup(log: &EventLog) -> Vec<Occurrence> {
    let mut out = log.as_slice().to_vec();
    out.sort();
    out.dedup();
    out
}

// ============================================================================
// Cover selection
// ============================================================================

#[test]
fn two_regimes_split_into_two_exact_cycles() {
    let input = single("poll", &[0, 60, 120, 180, 240, 1000, 1090, 1180, 1270]);
    let model = PeriodicCycleMiner::default().fit(&input).unwrap();
    let rows = model.discover(true);

    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].start, rows[0].length, rows[0].period), (0, 5, 60));
    assert_eq!((rows[1].start, rows[1].length, rows[1].period), (1000, 4, 90));
    assert_eq!(rows[0].cycle_index, 0);
    assert_eq!(rows[1].cycle_index, 1);
    assert!(rows.iter().all(|r| r.shifts.as_deref() == Some(&[][..])));
    assert!((model.total_bits() - 43.35770828893628).abs() < 1e-9);
}

#[test]
fn noisy_daily_job_keeps_outlier_as_residual() {
    let input = single("backup", &[0, 1439, 2879, 4320, 5762, 10080]);
    let model = PeriodicCycleMiner::new(MinerConfig::default().with_keep_residuals(true))
        .fit(&input)
        .unwrap();

    let rows = model.discover(true);
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].start, rows[0].length), (0, 5));
    assert_eq!(rows[0].period, 1440);
    assert_eq!(rows[0].shifts, Some(vec![-1, 0, 1, 2]));
    assert_eq!(
        model.residuals().unwrap(),
        vec![Occurrence::new(10080, "backup")]
    );
    assert!((model.total_bits() - 50.24494974762512).abs() < 1e-9);
}

#[test]
fn labels_are_mined_independently_and_reported_in_order() {
    let input = log(&[
        (0, "zeta"),
        (10, "zeta"),
        (20, "zeta"),
        (30, "zeta"),
        (5, "alpha"),
        (105, "alpha"),
        (205, "alpha"),
        (305, "alpha"),
    ]);
    let model = PeriodicCycleMiner::default().fit(&input).unwrap();
    let labels: Vec<String> = model
        .discover(false)
        .iter()
        .map(|r| r.label.to_string())
        .collect();
    assert_eq!(labels, vec!["alpha", "zeta"]);
    assert_eq!(model.cycles(&"alpha".into())[0].period, 100);
    assert_eq!(model.cycles(&"zeta".into())[0].period, 10);
}

#[test]
fn discover_is_idempotent() {
    let input = single("a", &[0, 1439, 2879, 4320, 5762, 10080]);
    let model = PeriodicCycleMiner::default().fit(&input).unwrap();
    assert_eq!(model.discover(true), model.discover(true));
    assert_eq!(model.discover(false), model.discover(false));
}

// ============================================================================
// Edge cases
// ============================================================================

#[test]
fn empty_log_is_an_input_error() {
    let err = PeriodicCycleMiner::default()
        .fit(&EventLog::default())
        .unwrap_err();
    assert!(matches!(err, Error::EmptyLog));
}

#[test]
fn single_occurrence_labels_are_residual() {
    let input = log(&[(0, "a"), (100, "b")]);
    let model = PeriodicCycleMiner::new(MinerConfig::default().with_keep_residuals(true))
        .fit(&input)
        .unwrap();
    assert_eq!(model.cycle_count(), 0);
    assert_eq!(model.residuals().unwrap().len(), 2);
    assert_eq!(model.reconstruct(), input);
}

#[test]
fn duplicates_are_merged_and_reported() {
    let input = log(&[(0, "a"), (0, "a"), (0, "a"), (60, "a"), (120, "a"), (180, "a")]);
    let model = PeriodicCycleMiner::default().fit(&input).unwrap();

    let duplicate = model
        .diagnostics()
        .iter()
        .find_map(|d| match d {
            Diagnostic::DuplicateOccurrence {
                timestamp, count, ..
            } => Some((*timestamp, *count)),
            _ => None,
        })
        .expect("duplicate reported");
    assert_eq!(duplicate, (0, 3));
    assert_eq!(model.occurrence_count(), 4);
    assert_eq!(model.reconstruct().as_slice(), dedup(&input).as_slice());
}

#[test]
fn early_stop_is_reported_and_shorter_cycles_used() {
    let input = single("a", &[0, 100, 200, 5000, 9000]);
    let config = MinerConfig::default().with_min_length(6);
    let model = PeriodicCycleMiner::new(config).fit(&input).unwrap();

    assert!(model
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Diagnostic::EarlyStopped { requested_min_length: 6, .. })));
    let rows = model.discover(false);
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].start, rows[0].length, rows[0].period), (0, 3, 100));
}

#[test]
fn max_length_caps_cycle_length() {
    let ts: Vec<i64> = (0..12).map(|i| i * 50).collect();
    let input = single("tick", &ts);
    let model = PeriodicCycleMiner::new(MinerConfig::default().with_max_length(4))
        .fit(&input)
        .unwrap();
    assert!(model.discover(false).iter().all(|r| r.length <= 4));
    assert_eq!(model.reconstruct(), input);
}

// ============================================================================
// Modes
// ============================================================================

#[test]
fn overlap_mode_still_reconstructs_exactly() {
    let input = single("a", &[0, 37, 100, 161, 200, 244, 300, 389, 400, 500]);
    let model = PeriodicCycleMiner::new(MinerConfig::default().with_overlap(true))
        .fit(&input)
        .unwrap();
    assert!(model.is_approximate());
    assert!(model
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Diagnostic::ApproximateCover { .. })));
    assert_eq!(model.reconstruct(), input);
}

#[test]
fn overlap_mode_accepts_unbounded_max_length() {
    let input = single("a", &[0, 10, 20, 30]);
    let config = MinerConfig::default()
        .with_max_length(usize::MAX)
        .with_overlap(true);
    let model = PeriodicCycleMiner::new(config).fit(&input).unwrap();

    let rows = model.discover(false);
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].start, rows[0].length, rows[0].period), (0, 4, 10));
    assert_eq!(model.reconstruct(), input);
}

#[test]
fn parallel_and_sequential_fits_agree() {
    let mut pairs = Vec::new();
    for (k, label) in ["cron", "heartbeat", "rotate", "sync"].iter().enumerate() {
        let period = 60 * (k as i64 + 1);
        for i in 0..8 {
            pairs.push((i * period + (i % 3) - 1, *label));
        }
        pairs.push((10_000 + k as i64, *label));
    }
    let input = log(&pairs);

    let parallel = PeriodicCycleMiner::new(MinerConfig::default().with_parallel(true))
        .fit(&input)
        .unwrap();
    let sequential = PeriodicCycleMiner::new(MinerConfig::default().with_parallel(false))
        .fit(&input)
        .unwrap();

    assert_eq!(parallel.discover(true), sequential.discover(true));
    assert_eq!(parallel.summaries(), sequential.summaries());
    assert_eq!(parallel.diagnostics(), sequential.diagnostics());
}
