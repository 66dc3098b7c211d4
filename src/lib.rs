//! `measure-dash` library crate.
//!
//! The binary (`dash`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - the TUI and the one-shot CLI share one code path
//!
//! Pipeline: raw rows -> `io::normalize` -> `filter` -> {`report` KPIs, `weekly` buckets}.

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod filter;
pub mod io;
pub mod poll;
pub mod report;
pub mod stats;
pub mod tui;
pub mod weekly;
