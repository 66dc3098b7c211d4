//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - rebuilt from scratch on every poll
//! - exported to CSV
//! - handed to the report/TUI layers without conversion

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::metrics::MetricKey;

/// Preset trailing windows offered by the UI.
pub const PRESET_DAYS: [u32; 3] = [7, 30, 90];

/// Preset window used when none is specified.
pub const DEFAULT_PRESET_DAYS: u32 = 30;

/// Canonical date format for points and weekly buckets.
pub const DATE_FMT: &str = "%Y-%m-%d";

/// A raw measurement record as returned by the server.
///
/// The server does not agree on a single schema, so every field the
/// normalizer knows about is optional and kept as untyped JSON. `null` and a
/// missing key both deserialize to `None`. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRow {
    pub date: Option<Value>,
    pub created_at: Option<Value>,
    pub timestamp: Option<Value>,

    pub speed_kmh: Option<Value>,
    pub speed: Option<Value>,
    pub velocity: Option<Value>,

    pub energy_kwh: Option<Value>,
    pub energy: Option<Value>,
    pub kwh: Option<Value>,
    pub power_kw: Option<Value>,

    pub mass_tons: Option<Value>,
    pub total_mass: Option<Value>,
    pub mass: Option<Value>,
}

/// A normalized measurement keyed by UTC calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPoint {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// km/h.
    pub speed: f64,
    /// kWh (or kW when the server only reports power).
    pub energy: f64,
    /// kg.
    pub mass: f64,
}

impl CanonicalPoint {
    pub fn value(&self, metric: MetricKey) -> f64 {
        match metric {
            MetricKey::Speed => self.speed,
            MetricKey::Energy => self.energy,
            MetricKey::Mass => self.mass,
        }
    }

    /// The point's calendar day, if `date` is well formed.
    pub fn day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FMT).ok()
    }
}

/// Mean of one metric over an ISO week (Monday start).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyBucket {
    /// Monday of the week, `YYYY-MM-DD`.
    pub week: String,
    pub value: f64,
}

/// Which slice of the timeline to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSelection {
    /// Trailing window of `days` days ending today (inclusive).
    Preset { days: u32 },
    /// Explicit inclusive interval; missing bounds default to the data's extent.
    Custom {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl Default for RangeSelection {
    fn default() -> Self {
        RangeSelection::Preset {
            days: DEFAULT_PRESET_DAYS,
        }
    }
}

impl RangeSelection {
    /// Build a selection from CLI-style inputs: any explicit bound selects custom mode.
    pub fn from_parts(days: Option<u32>, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        if start.is_some() || end.is_some() {
            return RangeSelection::Custom { start, end };
        }
        RangeSelection::Preset {
            days: days.unwrap_or(DEFAULT_PRESET_DAYS),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, RangeSelection::Custom { .. })
    }

    /// Human-readable label for terminal output.
    pub fn label(&self) -> String {
        match self {
            RangeSelection::Preset { days } => format!("last {days} days"),
            RangeSelection::Custom { start, end } => {
                let fmt = |d: &Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "…".to_string());
                format!("{} → {}", fmt(start), fmt(end))
            }
        }
    }

    /// Cycle through the preset windows, then the custom range.
    pub fn next_preset(self) -> Self {
        match self {
            RangeSelection::Preset { days } => match PRESET_DAYS.iter().position(|&d| d == days) {
                Some(i) if i + 1 < PRESET_DAYS.len() => RangeSelection::Preset {
                    days: PRESET_DAYS[i + 1],
                },
                Some(_) => RangeSelection::Custom {
                    start: None,
                    end: None,
                },
                None => RangeSelection::default(),
            },
            RangeSelection::Custom { .. } => RangeSelection::Preset {
                days: PRESET_DAYS[0],
            },
        }
    }
    /// Inverse of [`RangeSelection::next_preset`].
    pub fn prev_preset(self) -> Self {
        match self {
            RangeSelection::Preset { days } => match PRESET_DAYS.iter().position(|&d| d == days) {
                Some(0) => RangeSelection::Custom {
                    start: None,
                    end: None,
                },
                Some(i) => RangeSelection::Preset {
                    days: PRESET_DAYS[i - 1],
                },
                None => RangeSelection::default(),
            },
            RangeSelection::Custom { .. } => RangeSelection::Preset {
                days: PRESET_DAYS[PRESET_DAYS.len() - 1],
            },
        }
    }
}

/// Query parameters forwarded verbatim to the measurement API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementQuery {
    pub train_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl MeasurementQuery {
    /// Bounds are only forwarded in custom range mode.
    pub fn for_selection(train_id: Option<String>, range: &RangeSelection) -> Self {
        match range {
            RangeSelection::Preset { .. } => MeasurementQuery {
                train_id,
                from: None,
                to: None,
            },
            RangeSelection::Custom { start, end } => MeasurementQuery {
                train_id,
                from: start.map(|d| d.format(DATE_FMT).to_string()),
                to: end.map(|d| d.format(DATE_FMT).to_string()),
            },
        }
    }

    /// `(name, value)` pairs for the parameters that are set.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut out = Vec::new();
        if let Some(v) = self.train_id.as_deref().filter(|s| !s.is_empty()) {
            out.push(("train_id", v));
        }
        if let Some(v) = self.from.as_deref().filter(|s| !s.is_empty()) {
            out.push(("from", v));
        }
        if let Some(v) = self.to.as_deref().filter(|s| !s.is_empty()) {
            out.push(("to", v));
        }
        out
    }
}

/// Where measurements come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// The HTTP measurement API.
    Api { base_url: String },
    /// Deterministic synthetic rows (offline demo mode).
    Sample { seed: u64, days: u32 },
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags and environment (plus defaults).
#[derive(Debug, Clone)]
pub struct DashConfig {
    pub source: SourceKind,
    pub train_id: Option<String>,
    pub metric: MetricKey,
    pub range: RangeSelection,
    pub poll_interval: Duration,

    pub export_points: Option<PathBuf>,
    pub export_weekly: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl DashConfig {
    pub fn query(&self) -> MeasurementQuery {
        MeasurementQuery::for_selection(self.train_id.clone(), &self.range)
    }
}
