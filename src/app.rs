//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves flags and environment into a `DashConfig`
//! - installs logging
//! - dispatches to the TUI or the one-shot commands

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, DashArgs, LatestArgs, SampleArgs};
use crate::data::api::base_url_from_env;
use crate::data::source_from_config;
use crate::domain::{DashConfig, MetricKey, RangeSelection, SourceKind};
use crate::error::AppError;
use crate::io::normalize::normalize_row;

pub mod pipeline;

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Entry point for the `dash` binary.
pub fn run() -> Result<(), AppError> {
    // `dash` and `dash -m energy` should behave like `dash tui ...`.
    //
    // Clap requires a subcommand name, so we rewrite argv before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Summary(args) => handle_summary(args),
        Command::Latest(args) => handle_latest(args),
    }
}

fn handle_tui(args: DashArgs) -> Result<(), AppError> {
    let config = dash_config_from_args(&args);
    // The TUI owns stdout/stderr; only log when asked to log to a file.
    if let Some(path) = &config.log_file {
        init_file_tracing(path)?;
    }
    crate::tui::run(config)
}

fn handle_summary(args: DashArgs) -> Result<(), AppError> {
    let config = dash_config_from_args(&args);
    match &config.log_file {
        Some(path) => init_file_tracing(path)?,
        None => init_stderr_tracing(),
    }

    let source = source_from_config(&config)?;
    let run = pipeline::fetch_and_run(source.as_ref(), &config)?;
    info!(
        rows = run.normalize.rows_read,
        points = run.points.len(),
        visible = run.filtered.len(),
        "pipeline finished"
    );

    println!(
        "{}",
        crate::report::format_run_summary(&run, &config, &source.describe())
    );

    if let Some(path) = &config.export_points {
        crate::io::export::write_points_csv(path, &run.filtered)?;
        info!(path = %path.display(), "wrote points CSV");
    }
    if let Some(path) = &config.export_weekly {
        crate::io::export::write_weekly_csv(path, &run.weekly, run.metric)?;
        info!(path = %path.display(), "wrote weekly CSV");
    }

    Ok(())
}

fn handle_latest(args: LatestArgs) -> Result<(), AppError> {
    init_stderr_tracing();

    let config = DashConfig {
        source: source_kind(&args.sample),
        train_id: resolve_train_id(args.train_id.as_deref()),
        ..dash_config_defaults()
    };
    let source = source_from_config(&config)?;
    let row = source.latest(config.train_id.as_deref())?;
    // A row that fails normalization is reported the same as no row at all.
    let point = row.as_ref().and_then(|r| normalize_row(r).ok());

    print!("{}", crate::report::format_latest(point.as_ref()));
    Ok(())
}

/// Resolve CLI flags plus environment (`DASH_API_URL`, `DASH_TRAIN_ID`) into a config.
pub fn dash_config_from_args(args: &DashArgs) -> DashConfig {
    DashConfig {
        source: source_kind(&args.sample),
        train_id: resolve_train_id(args.train_id.as_deref()),
        metric: args.metric,
        range: RangeSelection::from_parts(Some(args.days), args.from, args.to),
        poll_interval: Duration::from_secs(args.poll_secs.max(1)),
        export_points: args.export.clone(),
        export_weekly: args.export_weekly.clone(),
        log_file: args.log_file.clone(),
    }
}

fn dash_config_defaults() -> DashConfig {
    DashConfig {
        source: SourceKind::Api {
            base_url: crate::data::api::DEFAULT_BASE_URL.to_string(),
        },
        train_id: None,
        metric: MetricKey::Speed,
        range: RangeSelection::default(),
        poll_interval: Duration::from_secs(10),
        export_points: None,
        export_weekly: None,
        log_file: None,
    }
}

fn source_kind(args: &SampleArgs) -> SourceKind {
    if args.sample {
        SourceKind::Sample {
            seed: args.seed,
            days: args.sample_days,
        }
    } else {
        SourceKind::Api {
            base_url: base_url_from_env(),
        }
    }
}

/// The CLI flag wins over `DASH_TRAIN_ID`; blank values mean "no filter".
fn resolve_train_id(flag: Option<&str>) -> Option<String> {
    let from_env = || {
        dotenvy::dotenv().ok();
        std::env::var("DASH_TRAIN_ID").ok()
    };
    flag.map(str::to_string)
        .or_else(from_env)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

fn init_stderr_tracing() {
    // A second init (e.g. in tests) is harmless; keep the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

fn init_file_tracing(path: &Path) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::config(format!("Failed to create log file '{}': {e}", path.display())))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

/// Rewrite argv so `dash` defaults to `dash tui`.
///
/// Rules:
/// - `dash`                      -> `dash tui`
/// - `dash -m energy ...`        -> `dash tui -m energy ...`
/// - `dash --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    if matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help") {
        return argv;
    }
    if matches!(arg1.as_str(), "tui" | "summary" | "latest") {
        return argv;
    }

    // A leading flag is a TUI flag.
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }
    argv
}
