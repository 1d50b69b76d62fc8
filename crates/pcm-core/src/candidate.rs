//! Candidate cycle generation.
//!
//! For one label's sorted timestamps, enumerates runs that could be
//! described as a cycle more cheaply than as residuals:
//!
//! - contiguous runs `[s, e]` of length `2..=max_length`, stored in a table
//!   keyed by (run end, run length) for the selector's DP;
//! - with overlap enabled, non-contiguous *chains* that follow a period
//!   through the sequence while skipping foreign occurrences.
//!
//! Every candidate's period is the lower median of its gaps. A candidate
//! is kept only if it is *acceptable*: strictly cheaper than leaving its
//! occurrences residual.

use std::collections::BTreeSet;

use pcm_common::Timestamp;
use pcm_config::miner::MIN_CYCLE_LENGTH;
use pcm_math::cmp_bits;

use crate::cost::LabelCostModel;
use crate::shift::{encode_shifts, fit_period};

/// A candidate cycle over a label's occurrences.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Strictly increasing indices into the label's timestamps.
    pub positions: Vec<usize>,
    pub period: i64,
    /// One correction per gap.
    pub shifts: Vec<i64>,
    /// Description length in bits.
    pub cost: f64,
}

impl Candidate {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn first(&self) -> usize {
        self.positions.first().copied().unwrap_or(0)
    }

    pub fn last(&self) -> usize {
        self.positions.last().copied().unwrap_or(0)
    }

    pub fn cost_per_occurrence(&self) -> f64 {
        self.cost / self.len().max(1) as f64
    }

    pub fn is_contiguous(&self) -> bool {
        is_run(&self.positions)
    }
}

/// Generation parameters for a single label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    pub max_length: usize,
    pub min_length: usize,
    pub overlap: bool,
}

/// Acceptable candidates of one label.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    /// `by_end[e]` holds the contiguous candidates ending at `e`, ascending
    /// by length.
    by_end: Vec<Vec<Candidate>>,
    chains: Vec<Candidate>,
    early_stopped: bool,
}

impl CandidateSet {
    /// Contiguous candidate covering `end + 1 − length ..= end`.
    pub fn get(&self, end: usize, length: usize) -> Option<&Candidate> {
        let row = self.by_end.get(end)?;
        row.binary_search_by_key(&length, Candidate::len)
            .ok()
            .map(|i| &row[i])
    }

    /// Contiguous candidates ending at `end`, ascending by length.
    pub fn ending_at(&self, end: usize) -> &[Candidate] {
        self.by_end.get(end).map_or(&[], Vec::as_slice)
    }

    pub fn contiguous(&self) -> impl Iterator<Item = &Candidate> {
        self.by_end.iter().flatten()
    }

    pub fn chains(&self) -> &[Candidate] {
        &self.chains
    }

    pub fn all(&self) -> impl Iterator<Item = &Candidate> {
        self.contiguous().chain(self.chains.iter())
    }

    pub fn len(&self) -> usize {
        self.by_end.iter().map(Vec::len).sum::<usize>() + self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when no candidate reached the requested minimum length and
    /// shorter runs were generated instead.
    pub fn early_stopped(&self) -> bool {
        self.early_stopped
    }
}

/// Generate the acceptable candidates of one label.
pub fn generate(
    timestamps: &[Timestamp],
    cost: &LabelCostModel,
    params: &GenerationParams,
) -> CandidateSet {
    let n = timestamps.len();
    let mut set = CandidateSet {
        by_end: vec![Vec::new(); n],
        ..CandidateSet::default()
    };
    if n < MIN_CYCLE_LENGTH || params.max_length < MIN_CYCLE_LENGTH {
        return set;
    }

    let max_length = params.max_length;
    let min_length = params.min_length.clamp(MIN_CYCLE_LENGTH, max_length);

    let found = generate_lengths(timestamps, cost, params, min_length, max_length, &mut set);
    if found == 0 && min_length > MIN_CYCLE_LENGTH {
        set.early_stopped = true;
        generate_lengths(
            timestamps,
            cost,
            params,
            MIN_CYCLE_LENGTH,
            min_length - 1,
            &mut set,
        );
    }
    set
}

/// One generation pass over lengths `lo..=hi`. Returns how many acceptable
/// candidates were added.
fn generate_lengths(
    timestamps: &[Timestamp],
    cost: &LabelCostModel,
    params: &GenerationParams,
    lo: usize,
    hi: usize,
    set: &mut CandidateSet,
) -> usize {
    let mut added = 0;
    for end in 1..timestamps.len() {
        let row = &mut set.by_end[end];
        // Longest first, then stored ascending for lookup.
        for length in (lo..=hi.min(end + 1)).rev() {
            let positions: Vec<usize> = (end + 1 - length..=end).collect();
            if let Some(candidate) = evaluate(timestamps, positions, cost) {
                row.push(candidate);
                added += 1;
            }
        }
        row.sort_by_key(Candidate::len);
    }

    if params.overlap {
        added += generate_chains(timestamps, cost, lo, hi, &mut set.chains);
    }
    added
}

/// Chains: from anchor `i` and partner `j` (within the next `max_length − 1`
/// positions) follow period `t[j] − t[i]`, each time taking the occurrence
/// nearest to `last + p` as long as it deviates by at most `p / 4`.
/// Every non-contiguous prefix whose length lies in `lo..=hi` is evaluated.
fn generate_chains(
    timestamps: &[Timestamp],
    cost: &LabelCostModel,
    lo: usize,
    hi: usize,
    chains: &mut Vec<Candidate>,
) -> usize {
    let n = timestamps.len();
    let mut seen: BTreeSet<Vec<usize>> = chains.iter().map(|c| c.positions.clone()).collect();
    let mut added = 0;

    for anchor in 0..n {
        let partner_limit = anchor.saturating_add(hi).min(n);
        for partner in anchor + 1..partner_limit {
            let Some(period) = timestamps[partner].checked_sub(timestamps[anchor]) else {
                continue;
            };
            let tolerance = period / 4;
            let mut chain = vec![anchor, partner];

            loop {
                if chain.len() >= lo && !is_run(&chain) && seen.insert(chain.clone()) {
                    if let Some(candidate) = evaluate(timestamps, chain.clone(), cost) {
                        chains.push(candidate);
                        added += 1;
                    }
                }
                if chain.len() >= hi {
                    break;
                }
                let last = chain[chain.len() - 1];
                match nearest_after(timestamps, last, period) {
                    Some((next, deviation)) if deviation <= tolerance => chain.push(next),
                    _ => break,
                }
            }
        }
    }
    added
}

/// Index after `last` whose timestamp is nearest to `t[last] + period`,
/// with its absolute deviation. Ties go to the earlier occurrence.
fn nearest_after(timestamps: &[Timestamp], last: usize, period: i64) -> Option<(usize, i64)> {
    let target = timestamps[last].checked_add(period)?;
    let tail = &timestamps[last + 1..];
    let split = last + 1 + tail.partition_point(|t| *t < target);

    let deviation = |i: usize| timestamps[i].abs_diff(target).min(i64::MAX as u64) as i64;
    let before = (split > last + 1).then(|| split - 1);
    let after = (split < timestamps.len()).then_some(split);

    match (before, after) {
        (Some(b), Some(a)) => {
            if deviation(a) < deviation(b) {
                Some((a, deviation(a)))
            } else {
                Some((b, deviation(b)))
            }
        }
        (Some(i), None) | (None, Some(i)) => Some((i, deviation(i))),
        (None, None) => None,
    }
}

fn is_run(positions: &[usize]) -> bool {
    positions.windows(2).all(|w| w[1] == w[0] + 1)
}

/// Fit period and shifts for `positions` and keep the candidate if it beats
/// the residual encoding.
fn evaluate(
    timestamps: &[Timestamp],
    positions: Vec<usize>,
    cost: &LabelCostModel,
) -> Option<Candidate> {
    let points: Vec<Timestamp> = positions.iter().map(|&i| timestamps[i]).collect();
    let gaps = crate::shift::gaps(&points)?;
    let period = fit_period(&gaps)?;
    let shifts = encode_shifts(&points, period)?;
    let bits = cost.cycle_cost(points.len(), period, &shifts).total();

    if cmp_bits(bits, cost.residual_cover_bits(points.len())).is_lt() {
        Some(Candidate {
            positions,
            period,
            shifts,
            cost: bits,
        })
    } else {
        None
    }
}
