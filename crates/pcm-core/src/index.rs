//! Event index: the per-label view of an event log.
//!
//! Splits a log into one strictly increasing timestamp sequence per label,
//! merging duplicate (label, timestamp) pairs on the way. Labels iterate in
//! lexicographic order so every downstream stage is deterministic.

use std::collections::BTreeMap;

use pcm_common::{Error, EventLabel, EventLog, Result, Timestamp};

use crate::cost::CostModel;
use crate::diagnostics::Diagnostic;

/// Per-label sorted unique timestamps, plus the log-wide parameters the
/// cost model needs.
#[derive(Debug, Clone)]
pub struct EventIndex {
    labels: BTreeMap<EventLabel, Vec<Timestamp>>,
    total: usize,
    span: u64,
    duplicates: Vec<Diagnostic>,
}

impl EventIndex {
    /// Build the index. Fails with [`Error::EmptyLog`] on an empty log.
    pub fn build(log: &EventLog) -> Result<Self> {
        let (first, last) = log.time_bounds().ok_or(Error::EmptyLog)?;

        let mut labels: BTreeMap<EventLabel, Vec<Timestamp>> = BTreeMap::new();
        // (label, timestamp) -> number of copies seen beyond the first
        let mut merged: BTreeMap<(EventLabel, Timestamp), usize> = BTreeMap::new();

        for occ in log {
            let series = labels.entry(occ.label.clone()).or_default();
            // The log is time-ordered, so a duplicate is always the tail.
            if series.last() == Some(&occ.timestamp) {
                *merged
                    .entry((occ.label.clone(), occ.timestamp))
                    .or_insert(1) += 1;
                continue;
            }
            series.push(occ.timestamp);
        }

        let total = labels.values().map(Vec::len).sum();
        let duplicates = merged
            .into_iter()
            .map(|((label, timestamp), count)| Diagnostic::DuplicateOccurrence {
                label,
                timestamp,
                count,
            })
            .collect();

        Ok(Self {
            labels,
            total,
            span: last.abs_diff(first),
            duplicates,
        })
    }

    /// Labels with their timestamps, in lexicographic label order.
    pub fn labels(&self) -> impl Iterator<Item = (&EventLabel, &[Timestamp])> {
        self.labels.iter().map(|(l, ts)| (l, ts.as_slice()))
    }

    pub fn timestamps(&self, label: &EventLabel) -> Option<&[Timestamp]> {
        self.labels.get(label).map(Vec::as_slice)
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of deduplicated occurrences.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Global time range `t_max − t_min`.
    pub fn span(&self) -> u64 {
        self.span
    }

    /// One `DuplicateOccurrence` per merged (label, timestamp) pair.
    pub fn duplicates(&self) -> &[Diagnostic] {
        &self.duplicates
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel::new(self.span, self.total as u64)
    }
}
