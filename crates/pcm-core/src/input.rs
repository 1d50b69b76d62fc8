//! Event log ingestion.
//!
//! Three encodings are accepted:
//! - `json`: an array of `{"timestamp": .., "label": ..}` objects
//! - `jsonl`: one such object per line
//! - `csv`: `timestamp,label` records with optional header, RFC 4180
//!   quoting and `#` comment lines
//!
//! Records need not be time-ordered; they are stably sorted before the log
//! is validated.

use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use pcm_common::{Error, EventLog, Occurrence, Result};

/// Encoding of an event log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    #[default]
    Json,
    Jsonl,
    Csv,
}

impl InputFormat {
    /// Guess the format from a file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(InputFormat::Json),
            "jsonl" | "ndjson" => Some(InputFormat::Jsonl),
            "csv" | "txt" => Some(InputFormat::Csv),
            _ => None,
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Json => write!(f, "json"),
            InputFormat::Jsonl => write!(f, "jsonl"),
            InputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Read and validate an event log from a file.
pub fn read_log(path: &Path, format: InputFormat) -> Result<EventLog> {
    let content = std::fs::read_to_string(path)?;
    parse_log(&content, format)
}

/// Parse and validate an event log from text.
pub fn parse_log(content: &str, format: InputFormat) -> Result<EventLog> {
    let occurrences = match format {
        InputFormat::Json => parse_json(content)?,
        InputFormat::Jsonl => parse_jsonl(content)?,
        InputFormat::Csv => parse_csv(content)?,
    };
    EventLog::from_unsorted(occurrences)
}

fn parse_json(content: &str) -> Result<Vec<Occurrence>> {
    serde_json::from_str::<Vec<Occurrence>>(content).map_err(|e| Error::MalformedRecord {
        line: e.line(),
        reason: e.to_string(),
    })
}

fn parse_jsonl(content: &str) -> Result<Vec<Occurrence>> {
    let mut out = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let occ: Occurrence =
            serde_json::from_str(trimmed).map_err(|e| Error::MalformedRecord {
                line: idx + 1,
                reason: e.to_string(),
            })?;
        out.push(occ);
    }
    Ok(out)
}

fn parse_csv(content: &str) -> Result<Vec<Occurrence>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(content.as_bytes());

    let mut out = Vec::new();
    let mut record = csv::StringRecord::new();
    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => return Err(csv_error(&e, reader.position().line())),
        }
        let line = record_line(&record, reader.position().line());
        if out.is_empty() && is_header(&record) {
            continue;
        }
        let occ: Occurrence = record.deserialize(None).map_err(|e| Error::MalformedRecord {
            line,
            reason: deserialize_reason(&e, &record),
        })?;
        if occ.label.as_str().is_empty() {
            return Err(Error::MalformedRecord {
                line,
                reason: "empty label".to_string(),
            });
        }
        out.push(occ);
    }
    Ok(out)
}

fn is_header(record: &csv::StringRecord) -> bool {
    record.len() == 2
        && record[0].eq_ignore_ascii_case("timestamp")
        && record[1].eq_ignore_ascii_case("label")
}

fn record_line(record: &csv::StringRecord, fallback: u64) -> usize {
    record.position().map_or(fallback, csv::Position::line) as usize
}

fn csv_error(err: &csv::Error, fallback: u64) -> Error {
    Error::MalformedRecord {
        line: err.position().map_or(fallback, csv::Position::line) as usize,
        reason: err.to_string(),
    }
}

fn deserialize_reason(err: &csv::Error, record: &csv::StringRecord) -> String {
    if record.len() != 2 {
        return format!("expected `timestamp,label`, found {} field(s)", record.len());
    }
    match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } if err.field() == Some(0) => {
            format!("invalid timestamp '{}'", &record[0])
        }
        _ => err.to_string(),
    }
}
