//! Periodic cycle miner CLI entry point.
//!
//! stdout carries command payloads only; logs and errors go to stderr.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use pcm_common::error::format_error_human;
use pcm_common::{Error, EventLog, FitId, Occurrence, OutputFormat, StructuredError, SCHEMA_VERSION};
use pcm_config::{load_config, validate_miner_config, ConfigSnapshot, MinerConfig, ValidationError};
use pcm_core::exit_codes::ExitCode;
use pcm_core::input::{parse_log, read_log, InputFormat};
use pcm_core::log_event;
use pcm_core::logging::config::ENV_LOG_FORMAT;
use pcm_core::logging::{
    event_names, generate_run_id, get_host_id, init_logging, LogConfig, LogContext, LogFormat,
    Stage,
};
use pcm_core::model::PeriodicCycleMiner;
use pcm_core::report::FitReport;

#[derive(Parser)]
#[command(name = "pcm")]
#[command(author, version, about = "Discover periodic cycles in event logs", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to miner.json (overrides PCM_CONFIG and config directories)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease log verbosity (-q warn, -qq error, -qqq off)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,

    /// Log format on stderr (human or jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the miner and report cycles, residuals and diagnostics
    Fit(FitArgs),

    /// Fit the miner and rebuild the log from its cycles and residuals
    Reconstruct(ReconstructArgs),

    /// Validate the resolved configuration
    Check,

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Event log path (`-` reads stdin)
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Event log encoding (defaults to the file extension, else json)
    #[arg(long, value_enum)]
    input_format: Option<InputFormat>,
}

#[derive(Args, Debug)]
struct MiningArgs {
    /// Longest cycle considered
    #[arg(long)]
    max_length: Option<usize>,

    /// Shortest cycle generated after an early stop
    #[arg(long)]
    min_length: Option<usize>,

    /// Allow cycles of one label to share occurrences
    #[arg(long)]
    overlap: bool,

    /// Mine labels one at a time
    #[arg(long)]
    sequential: bool,
}

impl MiningArgs {
    /// Layer CLI overrides on top of the loaded configuration.
    fn apply(&self, mut config: MinerConfig) -> MinerConfig {
        if let Some(n) = self.max_length {
            config = config.with_max_length(n);
        }
        if let Some(n) = self.min_length {
            config = config.with_min_length(n);
        }
        if self.overlap {
            config = config.with_overlap(true);
        }
        if self.sequential {
            config = config.with_parallel(false);
        }
        config
    }
}

#[derive(Args, Debug)]
struct FitArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    mining: MiningArgs,

    /// Keep residual occurrences in the report
    #[arg(long)]
    keep_residuals: bool,

    /// Include shift corrections in cycle rows
    #[arg(long)]
    shifts: bool,
}

#[derive(Args, Debug)]
struct ReconstructArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    mining: MiningArgs,
}

fn main() {
    let cli = Cli::parse();

    init_logging(&log_config(&cli.global));

    let ctx = LogContext::new(generate_run_id(), get_host_id());
    let command = match &cli.command {
        Commands::Fit(_) => "fit",
        Commands::Reconstruct(_) => "reconstruct",
        Commands::Check => "check",
        Commands::Version => "version",
    };
    let span = tracing::info_span!(
        "run",
        run_id = %ctx.run_id,
        host_id = %ctx.host_id,
        stage = %Stage::Init
    );
    let _enter = span.enter();
    log_event!(ctx, DEBUG, event_names::RUN_STARTED, Stage::Init, "pcm started", command = command);

    let exit_code = match &cli.command {
        Commands::Fit(args) => run_fit(&cli.global, &ctx, args),
        Commands::Reconstruct(args) => run_reconstruct(&cli.global, &ctx, args),
        Commands::Check => run_check(&cli.global, &ctx),
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_FINISHED,
        Stage::Report,
        "pcm finished",
        exit_code = exit_code.as_i32()
    );
    std::process::exit(exit_code.as_i32());
}

/// Log settings: env first, then flags. Machine output formats default to
/// JSONL logs unless a log format was chosen explicitly.
fn log_config(global: &GlobalOpts) -> LogConfig {
    let mut config = LogConfig::from_env(None, global.log_format);
    if global.log_format.is_none() && std::env::var(ENV_LOG_FORMAT).is_err() {
        config.format = if global.format.is_machine() {
            LogFormat::Jsonl
        } else {
            LogFormat::Human
        };
    }
    config.level = config.level.adjust(global.verbose, global.quiet);
    config
}

// ============================================================================
// Commands
// ============================================================================

fn run_fit(global: &GlobalOpts, ctx: &LogContext, args: &FitArgs) -> ExitCode {
    let (config, snapshot) = match load_miner_config(global, ctx, &args.mining, args.keep_residuals)
    {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let log = match load_input(ctx, &args.input) {
        Ok(log) => log,
        Err(e) => return output_error(global, ctx, &e),
    };

    let fit_id = FitId::new();
    let ctx = ctx.clone().with_fit_id(fit_id.0.clone());
    let span = tracing::info_span!("fit", fit_id = %fit_id);
    let _enter = span.enter();

    let model = match PeriodicCycleMiner::new(config).fit(&log) {
        Ok(model) => model,
        Err(e) => return output_error(global, &ctx, &e),
    };
    let report = FitReport::new(fit_id, &model, snapshot, args.shifts);

    let rendered = match global.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report).map_err(Error::from),
        OutputFormat::Jsonl => Ok(report.to_jsonl()),
        OutputFormat::Summary => Ok(report.to_summary()),
        OutputFormat::Exitcode => Ok(String::new()),
        OutputFormat::Md => Ok(report.to_markdown()),
    };
    match rendered {
        Ok(text) if !text.is_empty() => println!("{}", text),
        Ok(_) => {}
        Err(e) => return output_error(global, &ctx, &e),
    }

    log_event!(
        ctx,
        INFO,
        event_names::REPORT_WRITTEN,
        Stage::Report,
        "fit report written",
        cycles = report.cycles.len() as u64,
        total_bits = report.total_bits
    );

    if report.has_cycles() {
        ExitCode::Clean
    } else {
        ExitCode::NoCycles
    }
}

#[derive(Serialize)]
struct ReconstructResponse<'a> {
    schema_version: &'static str,
    fit_id: &'a FitId,
    generated_at: String,
    status: &'static str,
    /// Occurrences in the input, duplicates included.
    input_occurrences: usize,
    duplicates_merged: usize,
    cycles: usize,
    residuals: usize,
    /// Whether the rebuilt log equals the deduplicated input.
    exact: bool,
    occurrences: &'a [Occurrence],
}

fn run_reconstruct(global: &GlobalOpts, ctx: &LogContext, args: &ReconstructArgs) -> ExitCode {
    let (config, _snapshot) = match load_miner_config(global, ctx, &args.mining, false) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let log = match load_input(ctx, &args.input) {
        Ok(log) => log,
        Err(e) => return output_error(global, ctx, &e),
    };

    let fit_id = FitId::new();
    let ctx = ctx.clone().with_fit_id(fit_id.0.clone());
    let span = tracing::info_span!("fit", fit_id = %fit_id);
    let _enter = span.enter();

    let model = match PeriodicCycleMiner::new(config).fit(&log) {
        Ok(model) => model,
        Err(e) => return output_error(global, &ctx, &e),
    };
    let rebuilt = model.reconstruct();
    let expected = deduplicated(&log);
    let exact = rebuilt.as_slice() == expected.as_slice();

    log_event!(
        ctx,
        INFO,
        event_names::RECONSTRUCT_FINISHED,
        Stage::Reconstruct,
        "log rebuilt from catalogue",
        occurrences = rebuilt.len() as u64,
        exact = exact
    );

    let response = ReconstructResponse {
        schema_version: SCHEMA_VERSION,
        fit_id: &fit_id,
        generated_at: chrono::Utc::now().to_rfc3339(),
        status: if exact { "ok" } else { "mismatch" },
        input_occurrences: log.len(),
        duplicates_merged: log.len() - expected.len(),
        cycles: model.cycle_count(),
        residuals: model.residual_count(),
        exact,
        occurrences: rebuilt.as_slice(),
    };

    match global.format {
        OutputFormat::Json => match serde_json::to_string_pretty(&response) {
            Ok(text) => println!("{}", text),
            Err(e) => return output_error(global, &ctx, &Error::from(e)),
        },
        OutputFormat::Jsonl => {
            for occ in rebuilt.iter() {
                match serde_json::to_string(occ) {
                    Ok(line) => println!("{}", line),
                    Err(e) => return output_error(global, &ctx, &Error::from(e)),
                }
            }
        }
        OutputFormat::Summary => {
            println!(
                "[{}] {}: {} occurrences from {} cycles and {} residuals",
                fit_id,
                if exact { "exact" } else { "mismatch" },
                rebuilt.len(),
                response.cycles,
                response.residuals
            );
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# pcm reconstruct");
            println!();
            println!("Fit: {}", fit_id);
            println!(
                "{} Rebuilt {} occurrences from {} cycles and {} residuals",
                if exact { "✓" } else { "✗" },
                rebuilt.len(),
                response.cycles,
                response.residuals
            );
            println!();
            println!("| Timestamp | Label |");
            println!("|-----------|-------|");
            for occ in rebuilt.iter() {
                println!("| {} | {} |", occ.timestamp, occ.label);
            }
        }
    }

    if exact {
        ExitCode::Clean
    } else {
        let err = Error::Mining("reconstructed log differs from the input".to_string());
        output_error(global, &ctx, &err)
    }
}

fn run_check(global: &GlobalOpts, ctx: &LogContext) -> ExitCode {
    let loaded = match load_config(global.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => return output_config_error(global, ctx, &e),
    };
    let snapshot = loaded.snapshot;

    let response = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "status": "ok",
        "config": snapshot,
    });

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => match serde_json::to_string_pretty(&response) {
            Ok(text) => println!("{}", text),
            Err(e) => return output_error(global, ctx, &Error::from(e)),
        },
        OutputFormat::Summary => {
            println!(
                "config ok: {} (max_length {}, overlap {})",
                snapshot.config_source, snapshot.effective.max_length, snapshot.effective.overlap
            );
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# pcm check");
            println!();
            println!("✓ Configuration valid");
            println!("Source: {}", snapshot.config_source);
            if let Some(path) = &snapshot.config_path {
                println!("Path: {}", path);
            }
            if let Some(hash) = &snapshot.config_hash {
                println!("SHA-256: {}", hash);
            }
            let c = &snapshot.effective;
            println!();
            println!("| Setting | Value |");
            println!("|---------|-------|");
            println!("| max_length | {} |", c.max_length);
            println!("| min_length | {} |", c.min_length);
            println!("| overlap | {} |", c.overlap);
            println!("| keep_residuals | {} |", c.keep_residuals);
            println!("| parallel | {} |", c.parallel);
        }
    }
    ExitCode::Clean
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "pcm_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            println!("{}", version_info);
        }
        OutputFormat::Exitcode => {}
        _ => {
            println!("pcm {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Resolve the config file, apply CLI overrides and validate the result.
fn load_miner_config(
    global: &GlobalOpts,
    ctx: &LogContext,
    mining: &MiningArgs,
    keep_residuals: bool,
) -> std::result::Result<(MinerConfig, ConfigSnapshot), ExitCode> {
    let loaded = load_config(global.config.as_deref())
        .map_err(|e| output_config_error(global, ctx, &e))?;

    match &loaded.snapshot.config_path {
        Some(path) => log_event!(
            ctx,
            DEBUG,
            event_names::CONFIG_LOADED,
            Stage::Init,
            "configuration loaded",
            path = path.as_str()
        ),
        None => log_event!(
            ctx,
            DEBUG,
            event_names::CONFIG_DEFAULT_USED,
            Stage::Init,
            "no configuration file found, using defaults"
        ),
    }

    let mut config = mining.apply(loaded.config);
    if keep_residuals {
        config = config.with_keep_residuals(true);
    }
    validate_miner_config(&config).map_err(|e| output_config_error(global, ctx, &e))?;
    let snapshot = loaded.snapshot.with_effective(&config);
    Ok((config, snapshot))
}

fn load_input(ctx: &LogContext, args: &InputArgs) -> pcm_common::Result<EventLog> {
    let format = args
        .input_format
        .or_else(|| InputFormat::from_extension(&args.input))
        .unwrap_or_default();

    let log = if args.input.as_os_str() == "-" {
        let content = std::io::read_to_string(std::io::stdin())?;
        parse_log(&content, format)?
    } else {
        read_log(&args.input, format)?
    };

    log_event!(
        ctx,
        INFO,
        event_names::INPUT_LOADED,
        Stage::Init,
        "event log loaded",
        occurrences = log.len() as u64,
        input_format = format.to_string().as_str()
    );
    Ok(log)
}

/// The log with exact (timestamp, label) repeats removed.
fn deduplicated(log: &EventLog) -> Vec<Occurrence> {
    let mut out = log.as_slice().to_vec();
    out.sort();
    out.dedup();
    out
}

fn output_error(global: &GlobalOpts, ctx: &LogContext, err: &Error) -> ExitCode {
    let exit_code = ExitCode::for_error(err);
    if exit_code.is_internal_error() {
        log_event!(
            ctx,
            ERROR,
            event_names::INTERNAL_ERROR,
            Stage::Report,
            "command failed",
            error = err.to_string().as_str()
        );
    }

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "error",
                "exit_code": exit_code.code_name(),
                "error": StructuredError::from(err),
            });
            eprintln!("{}", response);
        }
        OutputFormat::Summary => {
            eprintln!("error: {}", err);
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            eprintln!("{}", format_error_human(err, std::io::stderr().is_terminal()));
        }
    }

    exit_code
}

fn output_config_error(global: &GlobalOpts, ctx: &LogContext, error: &ValidationError) -> ExitCode {
    log_event!(
        ctx,
        WARN,
        event_names::CONFIG_ERROR,
        Stage::Init,
        "configuration rejected",
        code = error.code()
    );

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "error",
                "exit_code": ExitCode::ConfigError.code_name(),
                "error": {
                    "code": error.code(),
                    "category": "config",
                    "message": error.to_string(),
                }
            });
            eprintln!("{}", response);
        }
        OutputFormat::Summary => {
            eprintln!("config error: {}", error);
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            eprintln!("# Configuration Error");
            eprintln!();
            eprintln!("Error: {}", error);
        }
    }

    ExitCode::ConfigError
}
