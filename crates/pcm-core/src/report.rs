//! Fit reports.
//!
//! A [`FitReport`] is the payload `pcm fit` writes to stdout. It bundles the
//! cycle catalogue with provenance (fit ID, config snapshot) so a result can
//! be traced back to the settings that produced it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pcm_common::{FitId, Occurrence, SCHEMA_VERSION};
use pcm_config::ConfigSnapshot;

use crate::diagnostics::{Diagnostic, Severity};
use crate::model::{CycleRow, FittedModel, LabelSummary};

/// Outcome of a fit as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitStatus {
    /// At least one label has a cycle.
    CyclesFound,
    /// Every occurrence ended up residual.
    NoCycles,
}

/// Full report for one `fit` invocation.
#[derive(Debug, Clone, Serialize)]
pub struct FitReport {
    pub schema_version: String,
    pub fit_id: FitId,
    pub generated_at: DateTime<Utc>,
    pub status: FitStatus,
    pub config: ConfigSnapshot,
    pub occurrences: usize,
    pub total_bits: f64,
    pub baseline_bits: f64,
    /// True when the greedy overlapping selector produced any cover.
    pub approximate: bool,
    pub cycles: Vec<CycleRow>,
    /// Present only when residuals were kept at fit time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residuals: Option<Vec<Occurrence>>,
    pub summaries: Vec<LabelSummary>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FitReport {
    /// Build a report from a fitted model.
    pub fn new(fit_id: FitId, model: &FittedModel, config: ConfigSnapshot, shifts: bool) -> Self {
        let cycles = model.discover(shifts);
        let status = if cycles.is_empty() {
            FitStatus::NoCycles
        } else {
            FitStatus::CyclesFound
        };
        FitReport {
            schema_version: SCHEMA_VERSION.to_string(),
            fit_id,
            generated_at: Utc::now(),
            status,
            config,
            occurrences: model.occurrence_count(),
            total_bits: model.total_bits(),
            baseline_bits: model.baseline_bits(),
            approximate: model.is_approximate(),
            cycles,
            residuals: model.residuals().ok(),
            summaries: model.summaries().to_vec(),
            diagnostics: model.diagnostics().to_vec(),
        }
    }

    pub fn has_cycles(&self) -> bool {
        self.status == FitStatus::CyclesFound
    }

    /// Fraction of the all-residual description length saved.
    pub fn savings(&self) -> f64 {
        if self.baseline_bits <= 0.0 {
            return 0.0;
        }
        1.0 - self.total_bits / self.baseline_bits
    }

    fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Warn)
            .count()
    }

    /// One JSON object per line: a header record, then one record per cycle,
    /// residual and diagnostic.
    pub fn to_jsonl(&self) -> String {
        let header = serde_json::json!({
            "type": "fit",
            "schema_version": self.schema_version,
            "fit_id": self.fit_id,
            "generated_at": self.generated_at.to_rfc3339(),
            "status": self.status,
            "occurrences": self.occurrences,
            "cycles": self.cycles.len(),
            "total_bits": self.total_bits,
            "baseline_bits": self.baseline_bits,
            "approximate": self.approximate,
        });
        let mut lines = vec![header.to_string()];
        for row in &self.cycles {
            lines.push(tagged("cycle", row));
        }
        for occ in self.residuals.iter().flatten() {
            lines.push(tagged("residual", occ));
        }
        for diagnostic in &self.diagnostics {
            lines.push(tagged("diagnostic", diagnostic));
        }
        lines.join("\n")
    }

    /// One-line status for quick checks.
    pub fn to_summary(&self) -> String {
        format!(
            "[{}] {}: {} cycles over {} labels, {} occurrences, {:.1}/{:.1} bits ({:.0}% saved), {} warnings{}",
            self.fit_id,
            match self.status {
                FitStatus::CyclesFound => "cycles found",
                FitStatus::NoCycles => "no cycles",
            },
            self.cycles.len(),
            self.summaries.len(),
            self.occurrences,
            self.total_bits,
            self.baseline_bits,
            self.savings() * 100.0,
            self.warning_count(),
            if self.approximate { ", approximate" } else { "" },
        )
    }

    /// Human-readable Markdown rendering.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# pcm fit\n\n");
        out.push_str(&format!("Fit: {}\n", self.fit_id));
        out.push_str(&format!(
            "Generated: {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.push_str(&format!("Config: {}\n", self.config.config_source));
        out.push_str(&format!(
            "Description length: {:.2} bits (baseline {:.2}, {:.0}% saved)\n",
            self.total_bits,
            self.baseline_bits,
            self.savings() * 100.0
        ));
        if self.approximate {
            out.push_str("Cover: approximate (overlapping cycles)\n");
        }

        out.push_str("\n## Cycles\n\n");
        if self.cycles.is_empty() {
            out.push_str("✗ No cycles discovered\n");
        } else {
            let with_shifts = self.cycles.iter().any(|r| r.shifts.is_some());
            if with_shifts {
                out.push_str("| Label | # | Start | Length | Period | Shifts |\n");
                out.push_str("|-------|---|-------|--------|--------|--------|\n");
            } else {
                out.push_str("| Label | # | Start | Length | Period |\n");
                out.push_str("|-------|---|-------|--------|--------|\n");
            }
            for row in &self.cycles {
                out.push_str(&format!(
                    "| {} | {} | {} | {} | {} |",
                    row.label, row.cycle_index, row.start, row.length, row.period
                ));
                if let Some(shifts) = &row.shifts {
                    let joined: Vec<String> = shifts.iter().map(i64::to_string).collect();
                    out.push_str(&format!(" [{}] |", joined.join(", ")));
                }
                out.push('\n');
            }
        }

        out.push_str("\n## Labels\n\n");
        out.push_str("| Label | Occurrences | Cycles | Residuals | Bits | Baseline |\n");
        out.push_str("|-------|-------------|--------|-----------|------|----------|\n");
        for s in &self.summaries {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {:.2} | {:.2} |\n",
                s.label, s.occurrences, s.cycles, s.residuals, s.bits, s.baseline_bits
            ));
        }

        if let Some(residuals) = &self.residuals {
            out.push_str(&format!("\n## Residuals ({})\n\n", residuals.len()));
            for occ in residuals {
                out.push_str(&format!("- {} {}\n", occ.timestamp, occ.label));
            }
        }

        if !self.diagnostics.is_empty() {
            out.push_str("\n## Diagnostics\n\n");
            for d in &self.diagnostics {
                let symbol = match d.severity() {
                    Severity::Warn => "⚠",
                    Severity::Info => "ℹ",
                };
                out.push_str(&format!("{} {}\n", symbol, d.message()));
            }
        }
        out
    }
}

fn tagged<T: Serialize>(kind: &str, value: &T) -> String {
    let mut v = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
    match v.as_object_mut() {
        Some(obj) => {
            obj.insert("type".to_string(), serde_json::json!(kind));
            v.to_string()
        }
        None => serde_json::json!({ "type": kind, "value": v }).to_string(),
    }
}
