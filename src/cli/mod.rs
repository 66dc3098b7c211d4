//! Command-line parsing for the measurement dashboard.
//!
//! Argument parsing and command dispatch stay separate from the pipeline code;
//! everything here resolves into a `DashConfig` in `app`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::{DATE_FMT, DEFAULT_PRESET_DAYS, MetricKey};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dash", version, about = "Train measurement dashboard (speed, energy, lifted mass)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive TUI (default when no subcommand is given).
    ///
    /// The TUI polls the measurement source in the background and recomputes
    /// KPIs and weekly averages whenever the metric or range changes.
    Tui(DashArgs),
    /// Fetch once, print KPIs and weekly averages, and optionally export CSVs.
    Summary(DashArgs),
    /// Print the most recent measurement.
    Latest(LatestArgs),
}

/// Options shared by `tui` and `summary`.
#[derive(Debug, Parser, Clone)]
pub struct DashArgs {
    /// Metric shown in KPIs and the weekly chart.
    #[arg(short = 'm', long, value_enum, default_value_t = MetricKey::Speed)]
    pub metric: MetricKey,

    /// Preset window in days, ending today (ignored when --from/--to is given).
    #[arg(short = 'd', long, default_value_t = DEFAULT_PRESET_DAYS)]
    pub days: u32,

    /// Custom range start (YYYY-MM-DD, inclusive).
    #[arg(long, value_parser = parse_day)]
    pub from: Option<NaiveDate>,

    /// Custom range end (YYYY-MM-DD, inclusive).
    #[arg(long, value_parser = parse_day)]
    pub to: Option<NaiveDate>,

    /// Train identifier forwarded to the API (defaults to $DASH_TRAIN_ID).
    #[arg(long)]
    pub train_id: Option<String>,

    #[command(flatten)]
    pub sample: SampleArgs,

    /// Poll interval in seconds (TUI only).
    #[arg(long, default_value_t = 10)]
    pub poll_secs: u64,

    /// Export the visible points to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the weekly averages of the selected metric to CSV.
    #[arg(long = "export-weekly")]
    pub export_weekly: Option<PathBuf>,

    /// Write logs to this file (the TUI logs nothing otherwise).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Options for `latest`.
#[derive(Debug, Parser, Clone)]
pub struct LatestArgs {
    /// Train identifier forwarded to the API (defaults to $DASH_TRAIN_ID).
    #[arg(long)]
    pub train_id: Option<String>,

    #[command(flatten)]
    pub sample: SampleArgs,
}

/// Offline synthetic source.
#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Use generated sample data instead of the HTTP API.
    #[arg(long)]
    pub sample: bool,

    /// Random seed for sample generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of days of sample data to generate.
    #[arg(long, default_value_t = 120)]
    pub sample_days: u32,
}

fn parse_day(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), DATE_FMT).map_err(|e| format!("expected YYYY-MM-DD, got '{s}': {e}"))
}
