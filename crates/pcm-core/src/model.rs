//! The miner and its fitted model.
//!
//! [`PeriodicCycleMiner::fit`] runs the whole pipeline: index the log, then
//! for every label generate candidates, price them and select a cover.
//! Labels are independent and are mined in parallel with rayon; results are
//! merged only after every worker has finished, so the output does not
//! depend on scheduling.
//!
//! The resulting [`FittedModel`] is an immutable snapshot. It answers
//! `discover`, `residuals` and `reconstruct` without recomputation.

use std::collections::BTreeMap;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use pcm_common::{Error, EventLabel, EventLog, Occurrence, Result, Timestamp};
use pcm_config::{validate_miner_config, MinerConfig, ValidationError};

use crate::candidate::{generate, GenerationParams};
use crate::cost::{CostModel, LabelCostModel};
use crate::diagnostics::Diagnostic;
use crate::index::EventIndex;
use crate::logging::{event_names, Stage};
use crate::select::{select_disjoint, select_overlapping, Selection};
use crate::shift::{decode_timestamps, trim_trailing_zeros};

/// A discovered cycle.
///
/// `timestamps()[i] = start + i·period + Σ shifts[0..i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub label: EventLabel,
    pub start: Timestamp,
    pub length: usize,
    pub period: i64,
    /// Full-length corrections, one per gap.
    pub shifts: Vec<i64>,
    /// Description length in bits.
    pub bits: f64,
}

impl Cycle {
    /// Decode the occurrences this cycle stands for.
    pub fn timestamps(&self) -> Vec<Timestamp> {
        decode_timestamps(self.start, self.length, self.period, &self.shifts)
    }

    /// Timestamp of the last occurrence.
    pub fn end(&self) -> Timestamp {
        self.timestamps().last().copied().unwrap_or(self.start)
    }

    /// Shifts as exposed externally: trailing zeros omitted.
    pub fn external_shifts(&self) -> &[i64] {
        trim_trailing_zeros(&self.shifts)
    }

    /// True when every gap equals the period.
    pub fn is_exact(&self) -> bool {
        self.shifts.iter().all(|s| *s == 0)
    }
}

/// One row of [`FittedModel::discover`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRow {
    pub label: EventLabel,
    /// Zero-based index of the cycle within its label.
    pub cycle_index: usize,
    pub start: Timestamp,
    pub length: usize,
    pub period: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shifts: Option<Vec<i64>>,
}

/// Per-label outcome of a fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSummary {
    pub label: EventLabel,
    pub occurrences: usize,
    pub cycles: usize,
    pub residuals: usize,
    /// Description length of the chosen cover.
    pub bits: f64,
    /// Description length with every occurrence residual.
    pub baseline_bits: f64,
}

impl LabelSummary {
    /// Fraction of the baseline saved by the chosen cover.
    pub fn compression_ratio(&self) -> f64 {
        if self.baseline_bits <= 0.0 {
            return 0.0;
        }
        1.0 - self.bits / self.baseline_bits
    }
}

/// Result of mining a single label.
#[derive(Debug, Clone)]
struct LabelOutcome {
    label: EventLabel,
    cycles: Vec<Cycle>,
    residuals: Vec<Timestamp>,
    summary: LabelSummary,
    diagnostics: Vec<Diagnostic>,
    approximate: bool,
}

/// The periodic cycle miner.
#[derive(Debug, Clone, Default)]
pub struct PeriodicCycleMiner {
    config: MinerConfig,
}

impl PeriodicCycleMiner {
    pub fn new(config: MinerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Fit the model to an event log.
    ///
    /// Fails on an empty log or an invalid configuration. Duplicates,
    /// labels without cycles and early-stopped generation are recorded as
    /// diagnostics and never fail the fit.
    #[instrument(skip_all, fields(occurrences = log.len()))]
    pub fn fit(&self, log: &EventLog) -> Result<FittedModel> {
        validate_miner_config(&self.config).map_err(config_error)?;
        let started = Instant::now();

        let index = EventIndex::build(log)?;
        tracing::info!(
            target: event_names::FIT_STARTED,
            stage = %Stage::Index,
            labels = index.label_count(),
            occurrences = index.total(),
            time_span = index.span(),
            overlap = self.config.overlap,
            parallel = self.config.parallel,
            "fitting {} labels",
            index.label_count()
        );
        for duplicate in index.duplicates() {
            duplicate.emit();
        }

        let cost = index.cost_model();
        let params = GenerationParams {
            max_length: self.config.max_length,
            min_length: self.config.min_length,
            overlap: self.config.overlap,
        };

        let labels: Vec<(&EventLabel, &[Timestamp])> = index.labels().collect();
        let outcomes: Vec<LabelOutcome> = if self.config.parallel {
            labels
                .par_iter()
                .map(|(label, ts)| mine_label(label, ts, &cost, &params))
                .collect()
        } else {
            labels
                .iter()
                .map(|(label, ts)| mine_label(label, ts, &cost, &params))
                .collect()
        };

        let model = FittedModel::assemble(self.config.clone(), &index, outcomes);
        tracing::info!(
            target: event_names::FIT_FINISHED,
            stage = %Stage::Select,
            cycles = model.cycle_count(),
            residuals = model.residual_count(),
            total_bits = model.total_bits(),
            baseline_bits = model.baseline_bits(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fit complete"
        );
        Ok(model)
    }
}

fn config_error(err: ValidationError) -> Error {
    match err {
        ValidationError::InvalidValue { field, message } => Error::InvalidConfig { field, message },
        other => Error::Config(other.to_string()),
    }
}

/// Generate, price and select for one label. Pure: safe to run on any
/// worker.
fn mine_label(
    label: &EventLabel,
    timestamps: &[Timestamp],
    cost: &CostModel,
    params: &GenerationParams,
) -> LabelOutcome {
    let label_cost: LabelCostModel = cost.for_label(timestamps.len());
    let residual_bits = label_cost.residual_bits();

    let candidates = generate(timestamps, &label_cost, params);
    let mut diagnostics = Vec::new();
    if candidates.early_stopped() {
        diagnostics.push(Diagnostic::EarlyStopped {
            label: label.clone(),
            requested_min_length: params.min_length,
        });
    }

    let selection: Selection = if params.overlap {
        select_overlapping(timestamps.len(), &candidates, residual_bits)
    } else {
        select_disjoint(timestamps.len(), &candidates, residual_bits)
    };

    let cycles: Vec<Cycle> = selection
        .cycles
        .iter()
        .map(|c| Cycle {
            label: label.clone(),
            start: timestamps[c.first()],
            length: c.len(),
            period: c.period,
            shifts: c.shifts.clone(),
            bits: c.cost,
        })
        .collect();
    let residuals: Vec<Timestamp> = selection
        .residual_positions()
        .map(|i| timestamps[i])
        .collect();

    if cycles.is_empty() {
        diagnostics.push(Diagnostic::NoCyclesDiscovered {
            label: label.clone(),
        });
    } else if selection.approximate {
        diagnostics.push(Diagnostic::ApproximateCover {
            label: label.clone(),
        });
    }

    tracing::debug!(
        target: event_names::LABEL_MINED,
        stage = %Stage::Generate,
        label = label.as_str(),
        occurrences = timestamps.len(),
        candidates = candidates.len(),
        cycles = cycles.len(),
        residuals = residuals.len(),
        bits = selection.total_bits,
        "label mined"
    );

    let summary = LabelSummary {
        label: label.clone(),
        occurrences: timestamps.len(),
        cycles: cycles.len(),
        residuals: residuals.len(),
        bits: selection.total_bits,
        baseline_bits: label_cost.baseline_bits(),
    };

    LabelOutcome {
        label: label.clone(),
        cycles,
        residuals,
        summary,
        diagnostics,
        approximate: selection.approximate,
    }
}

/// Immutable result of a fit.
#[derive(Debug, Clone, Serialize)]
pub struct FittedModel {
    config: MinerConfig,
    catalogue: BTreeMap<EventLabel, Vec<Cycle>>,
    residuals: BTreeMap<EventLabel, Vec<Timestamp>>,
    diagnostics: Vec<Diagnostic>,
    summaries: Vec<LabelSummary>,
    approximate: bool,
}

impl FittedModel {
    fn assemble(config: MinerConfig, index: &EventIndex, outcomes: Vec<LabelOutcome>) -> Self {
        let mut catalogue = BTreeMap::new();
        let mut residuals = BTreeMap::new();
        let mut diagnostics: Vec<Diagnostic> = index.duplicates().to_vec();
        let mut summaries = Vec::with_capacity(outcomes.len());
        let mut approximate = false;

        for outcome in outcomes {
            for diagnostic in &outcome.diagnostics {
                diagnostic.emit();
            }
            diagnostics.extend(outcome.diagnostics);
            approximate |= outcome.approximate;
            summaries.push(outcome.summary);
            catalogue.insert(outcome.label.clone(), outcome.cycles);
            residuals.insert(outcome.label, outcome.residuals);
        }

        Self {
            config,
            catalogue,
            residuals,
            diagnostics,
            summaries,
            approximate,
        }
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Discovered cycles, grouped by label (lexicographic) and ordered by
    /// start within a label. With `shifts`, each row carries its
    /// corrections with trailing zeros omitted.
    pub fn discover(&self, shifts: bool) -> Vec<CycleRow> {
        self.catalogue
            .iter()
            .flat_map(|(label, cycles)| {
                cycles
                    .iter()
                    .enumerate()
                    .map(move |(cycle_index, cycle)| CycleRow {
                        label: label.clone(),
                        cycle_index,
                        start: cycle.start,
                        length: cycle.length,
                        period: cycle.period,
                        shifts: shifts.then(|| cycle.external_shifts().to_vec()),
                    })
            })
            .collect()
    }

    /// Occurrences not covered by any cycle, ordered by (timestamp, label).
    ///
    /// Fails with [`Error::ResidualsNotKept`] unless the miner was configured
    /// with `keep_residuals`.
    pub fn residuals(&self) -> Result<Vec<Occurrence>> {
        if !self.config.keep_residuals {
            return Err(Error::ResidualsNotKept);
        }
        let mut out: Vec<Occurrence> = self
            .residuals
            .iter()
            .flat_map(|(label, ts)| ts.iter().map(|t| Occurrence::new(*t, label.clone())))
            .collect();
        out.sort();
        Ok(out)
    }

    /// Rebuild the deduplicated log from cycles and residuals.
    pub fn reconstruct(&self) -> EventLog {
        let mut out: Vec<Occurrence> = Vec::with_capacity(self.occurrence_count());
        for (label, cycles) in &self.catalogue {
            let mut seen: Vec<Timestamp> = cycles.iter().flat_map(Cycle::timestamps).collect();
            if let Some(res) = self.residuals.get(label) {
                seen.extend_from_slice(res);
            }
            // Overlapping cycles may share occurrences.
            seen.sort_unstable();
            seen.dedup();
            out.extend(seen.into_iter().map(|t| Occurrence::new(t, label.clone())));
        }
        out.sort();
        EventLog::from_sorted_unchecked(out)
    }

    /// Label → cycles, ordered by start within each label.
    pub fn catalogue(&self) -> &BTreeMap<EventLabel, Vec<Cycle>> {
        &self.catalogue
    }

    pub fn cycles(&self, label: &EventLabel) -> &[Cycle] {
        self.catalogue.get(label).map_or(&[], Vec::as_slice)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn summaries(&self) -> &[LabelSummary] {
        &self.summaries
    }

    /// Description length of the chosen covers, summed over labels.
    pub fn total_bits(&self) -> f64 {
        self.summaries.iter().map(|s| s.bits).sum()
    }

    /// Description length with every occurrence residual.
    pub fn baseline_bits(&self) -> f64 {
        self.summaries.iter().map(|s| s.baseline_bits).sum()
    }

    /// True when any label was covered by the greedy overlapping selector.
    pub fn is_approximate(&self) -> bool {
        self.approximate
    }

    pub fn cycle_count(&self) -> usize {
        self.catalogue.values().map(Vec::len).sum()
    }

    pub fn residual_count(&self) -> usize {
        self.residuals.values().map(Vec::len).sum()
    }

    /// Deduplicated occurrences the model was fitted on.
    pub fn occurrence_count(&self) -> usize {
        self.summaries.iter().map(|s| s.occurrences).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit(pairs: &[(i64, &str)], config: MinerConfig) -> FittedModel {
        let log = EventLog::from_pairs(pairs.iter().copied()).unwrap();
        PeriodicCycleMiner::new(config).fit(&log).unwrap()
    }

    fn fit_label(label: &str, ts: &[i64], config: MinerConfig) -> FittedModel {
        let log = EventLog::from_pairs(ts.iter().map(|t| (*t, label))).unwrap();
        PeriodicCycleMiner::new(config).fit(&log).unwrap()
    }

    #[test]
    fn test_noise_tolerance() {
        let model = fit_label(
            "backup",
            &[0, 1439, 2879, 4320, 5762, 10080],
            MinerConfig::default().with_keep_residuals(true),
        );
        let rows = model.discover(true);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].start, 0);
        assert_eq!(rows[0].length, 5);
        assert!((1439..=1441).contains(&rows[0].period));
        let shifts = rows[0].shifts.clone().unwrap();
        assert!(shifts.iter().any(|s| *s != 0));
        assert!(shifts.iter().sum::<i64>().abs() <= 2);
        assert_eq!(
            model.residuals().unwrap(),
            vec![Occurrence::new(10080, "backup")]
        );
    }

    #[test]
    fn test_residuals_require_keep_flag() {
        let model = fit_label("a", &[0, 10, 20], MinerConfig::default());
        assert!(matches!(model.residuals(), Err(Error::ResidualsNotKept)));
        // Reconstruction does not depend on the flag.
        assert_eq!(model.reconstruct().len(), 3);
    }

    #[test]
    fn test_shifts_omitted_without_flag() {
        let model = fit_label("a", &[0, 60, 120, 180], MinerConfig::default());
        let rows = model.discover(false);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].shifts.is_none());
        let rows = model.discover(true);
        assert_eq!(rows[0].shifts, Some(vec![]));
    }

    #[test]
    fn test_single_occurrence_labels_have_no_cycles() {
        let model = fit(&[(0, "a"), (5, "b"), (9, "c")], MinerConfig::default());
        assert!(model.discover(false).is_empty());
        assert_eq!(model.diagnostics().len(), 3);
        assert!(model
            .diagnostics()
            .iter()
            .all(|d| matches!(d, Diagnostic::NoCyclesDiscovered { .. })));
    }

    #[test]
    fn test_empty_log_is_error() {
        let err = PeriodicCycleMiner::default()
            .fit(&EventLog::default())
            .unwrap_err();
        assert!(matches!(err, Error::EmptyLog));
    }

    #[test]
    fn test_invalid_config_is_error() {
        let log = EventLog::from_pairs([(0, "a")]).unwrap();
        let err = PeriodicCycleMiner::new(MinerConfig::default().with_max_length(1))
            .fit(&log)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { ref field, .. } if field == "max_length"));
    }

    #[test]
    fn test_summaries_and_bits() {
        let model = fit_label(
            "a",
            &[0, 60, 120, 180, 240, 1000, 1090, 1180, 1270],
            MinerConfig::default(),
        );
        let summary = &model.summaries()[0];
        assert_eq!(summary.occurrences, 9);
        assert_eq!(summary.cycles, 2);
        assert_eq!(summary.residuals, 0);
        assert!(model.total_bits() < model.baseline_bits());
        assert!(summary.compression_ratio() > 0.0);
        assert!(!model.is_approximate());
    }

    #[test]
    fn test_cycle_timestamps_decode() {
        let cycle = Cycle {
            label: "a".into(),
            start: 0,
            length: 5,
            period: 1440,
            shifts: vec![-1, 0, 1, 2],
            bits: 0.0,
        };
        assert_eq!(cycle.timestamps(), vec![0, 1439, 2879, 4320, 5762]);
        assert_eq!(cycle.end(), 5762);
        assert!(!cycle.is_exact());
    }
}
