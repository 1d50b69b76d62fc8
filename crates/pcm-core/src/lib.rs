//! Periodic cycle miner core library.
//!
//! Discovers periodic cycles in timestamped event logs by minimum
//! description length: each label's occurrences are covered by cycles
//! (start, length, period, shift corrections) plus residuals, choosing the
//! cover with the fewest total bits.
//!
//! # Example
//!
//! ```ignore
//! use pcm_core::{MinerConfig, PeriodicCycleMiner};
//! use pcm_common::EventLog;
//!
//! let log = EventLog::from_pairs([(0, "backup"), (1440, "backup"), (2880, "backup")])?;
//! let model = PeriodicCycleMiner::new(MinerConfig::default()).fit(&log)?;
//! for row in model.discover(true) {
//!     println!("{} every {}", row.label, row.period);
//! }
//! assert_eq!(model.reconstruct(), log);
//! ```

pub mod candidate;
pub mod cost;
pub mod diagnostics;
pub mod exit_codes;
pub mod index;
pub mod input;
pub mod logging;
pub mod model;
pub mod report;
pub mod select;
pub mod shift;

pub use diagnostics::{Diagnostic, Severity};
pub use exit_codes::ExitCode;
pub use input::{parse_log, read_log, InputFormat};
pub use model::{Cycle, CycleRow, FittedModel, LabelSummary, PeriodicCycleMiner};
pub use pcm_config::MinerConfig;
pub use report::{FitReport, FitStatus};
