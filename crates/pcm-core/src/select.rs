//! Cycle selection.
//!
//! Non-overlapping covers are chosen by an exact DP over the label's sorted
//! positions:
//!
//! ```text
//! best[0] = 0
//! best[i] = min(best[i-1] + residual, min_r best[i-r] + cost(end = i-1, r))
//! ```
//!
//! Ties (within [`BITS_TOLERANCE`](pcm_math::BITS_TOLERANCE)) prefer the
//! longer step, a residual counting as length 1. Because every step ending
//! at `i` competes, the longer step is also the one starting earlier.
//!
//! Overlapping covers are chosen greedily and are approximate.

use std::cmp::Ordering;

use pcm_math::cmp_bits;

use crate::candidate::{Candidate, CandidateSet};

/// Chosen cycles of one label and the resulting description length.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Selected cycles, ordered by first position.
    pub cycles: Vec<Candidate>,
    /// `covered[i]` is true when occurrence `i` belongs to a selected cycle.
    pub covered: Vec<bool>,
    /// Total bits: cycles plus residuals.
    pub total_bits: f64,
    /// True when produced by the greedy overlapping selector.
    pub approximate: bool,
}

impl Selection {
    pub fn residual_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.covered
            .iter()
            .enumerate()
            .filter(|(_, c)| !**c)
            .map(|(i, _)| i)
    }

    pub fn residual_count(&self) -> usize {
        self.covered.iter().filter(|c| !**c).count()
    }
}

/// Exact minimum-cost cover of `n` occurrences by disjoint contiguous cycles
/// and residuals.
pub fn select_disjoint(n: usize, candidates: &CandidateSet, residual_bits: f64) -> Selection {
    let mut best = vec![0.0f64; n + 1];
    // Step length used to reach i (1 = residual).
    let mut step = vec![1usize; n + 1];

    for i in 1..=n {
        let mut best_cost = best[i - 1] + residual_bits;
        let mut best_len = 1;
        for candidate in candidates.ending_at(i - 1) {
            let len = candidate.len();
            let cost = best[i - len] + candidate.cost;
            match cmp_bits(cost, best_cost) {
                Ordering::Less => {
                    best_cost = cost;
                    best_len = len;
                }
                Ordering::Equal if len > best_len => {
                    best_cost = cost;
                    best_len = len;
                }
                _ => {}
            }
        }
        best[i] = best_cost;
        step[i] = best_len;
    }

    let mut covered = vec![false; n];
    let mut cycles = Vec::new();
    let mut i = n;
    while i > 0 {
        let len = step[i];
        if len > 1 {
            if let Some(candidate) = candidates.get(i - 1, len) {
                covered[i - len..i].iter_mut().for_each(|c| *c = true);
                cycles.push(candidate.clone());
            }
        }
        i -= len;
    }
    cycles.reverse();

    Selection {
        cycles,
        covered,
        total_bits: best[n],
        approximate: false,
    }
}

/// Greedy cover allowing cycles to share occurrences.
///
/// Candidates are visited by ascending cost per occurrence (ties: longer,
/// then earlier start). A candidate is taken when its cost is strictly below
/// the residual cost of the occurrences it newly covers.
pub fn select_overlapping(n: usize, candidates: &CandidateSet, residual_bits: f64) -> Selection {
    let order = greedy_order(candidates.all());

    let mut covered = vec![false; n];
    let mut cycles = Vec::new();
    let mut cycle_bits = 0.0;

    for candidate in order {
        let fresh = candidate.positions.iter().filter(|&&p| !covered[p]).count();
        if fresh == 0 {
            continue;
        }
        if cmp_bits(candidate.cost, fresh as f64 * residual_bits).is_lt() {
            for &p in &candidate.positions {
                covered[p] = true;
            }
            cycle_bits += candidate.cost;
            cycles.push(candidate.clone());
        }
    }
    cycles.sort_by(|a, b| a.positions.cmp(&b.positions));

    let residuals = covered.iter().filter(|c| !**c).count();
    Selection {
        cycles,
        covered,
        total_bits: cycle_bits + residuals as f64 * residual_bits,
        approximate: true,
    }
}

fn greedy_order<'a>(candidates: impl Iterator<Item = &'a Candidate>) -> Vec<&'a Candidate> {
    let mut order: Vec<&Candidate> = candidates.collect();
    order.sort_by(|a, b| {
        cmp_bits(a.cost_per_occurrence(), b.cost_per_occurrence())
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| a.positions.cmp(&b.positions))
    });
    order
}
