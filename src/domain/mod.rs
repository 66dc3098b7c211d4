//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the raw server row shape (`RawRow`) and its canonical form (`CanonicalPoint`)
//! - the closed metric set and its display metadata (`MetricKey`, `MetricMeta`)
//! - range selection and run configuration (`RangeSelection`, `DashConfig`)

pub mod metrics;
pub mod types;

pub use metrics::*;
pub use types::*;
