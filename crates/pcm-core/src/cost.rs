//! MDL cost model.
//!
//! Every quantity is a code length in bits. A cycle is worth keeping only
//! when describing it costs fewer bits than listing its occurrences one by
//! one as residuals.
//!
//! With `span` the global time range of the log, `N` the total number of
//! deduplicated occurrences and `n` the label's count:
//!
//! | Part            | Bits                                   |
//! |-----------------|----------------------------------------|
//! | length          | `log2(n)`                              |
//! | period          | `log2(⌊span / (r − 1)⌋ + 1)`           |
//! | start           | `log2(span − (r − 1)·p + 1)`           |
//! | shifts          | `Σ 2·log2(1 + 2|s|)`                   |
//! | residual (each) | `log2(span + 1) + log2(N / n)`         |
//!
//! The label name is charged per residual only; a cycle amortizes it.

use serde::Serialize;

use pcm_math::{
    corrections_code_length, frequency_code_length, range_code_length, uniform_code_length,
};

/// Log-wide parameters shared by every label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostModel {
    span: u64,
    total: u64,
}

impl CostModel {
    /// `span` is `t_max − t_min`; `total` the deduplicated occurrence count.
    pub fn new(span: u64, total: u64) -> Self {
        Self { span, total }
    }

    pub fn span(&self) -> u64 {
        self.span
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Cost model for a label with `count` occurrences.
    pub fn for_label(&self, count: usize) -> LabelCostModel {
        LabelCostModel {
            span: self.span,
            total: self.total,
            count: count as u64,
        }
    }
}

/// Cost model bound to a single label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelCostModel {
    span: u64,
    total: u64,
    count: u64,
}

impl LabelCostModel {
    /// Bits to name this label among all occurrences.
    pub fn label_bits(&self) -> f64 {
        frequency_code_length(self.count, self.total)
    }

    /// Bits to store one occurrence of this label as a residual.
    pub fn residual_bits(&self) -> f64 {
        range_code_length(self.span) + self.label_bits()
    }

    /// Bits to store `occurrences` residuals.
    pub fn residual_cover_bits(&self, occurrences: usize) -> f64 {
        occurrences as f64 * self.residual_bits()
    }

    /// Bits of the all-residual description of the label.
    pub fn baseline_bits(&self) -> f64 {
        self.count as f64 * self.residual_bits()
    }

    /// Cost of a cycle of `length` occurrences with the given period and
    /// shift corrections.
    pub fn cycle_cost(&self, length: usize, period: i64, shifts: &[i64]) -> CycleCost {
        let steps = length.saturating_sub(1).max(1) as u64;
        let extent = (period.max(0) as u64).saturating_mul(steps);
        CycleCost {
            length_bits: uniform_code_length(self.count),
            period_bits: range_code_length(self.span / steps),
            start_bits: range_code_length(self.span.saturating_sub(extent)),
            shift_bits: corrections_code_length(shifts),
        }
    }
}

/// Breakdown of a cycle's description length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleCost {
    pub length_bits: f64,
    pub period_bits: f64,
    pub start_bits: f64,
    pub shift_bits: f64,
}

impl CycleCost {
    pub fn total(&self) -> f64 {
        self.length_bits + self.period_bits + self.start_bits + self.shift_bits
    }
}
