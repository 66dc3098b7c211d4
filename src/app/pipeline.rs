//! Shared "dashboard pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! raw rows -> normalize -> range filter -> {KPIs, weekly buckets}
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use chrono::{NaiveDate, Utc};

use crate::data::MeasurementSource;
use crate::domain::{CanonicalPoint, DashConfig, MetricKey, RangeSelection, RawRow, WeeklyBucket};
use crate::error::AppError;
use crate::filter::filter_points_on;
use crate::io::normalize::{NormalizeReport, normalize_all_with_report};
use crate::report::{Kpis, WeeklySummary, compute_kpis, series_means, summarize_weekly};
use crate::weekly::weekly_average;

/// All computed outputs of a single pipeline pass.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub metric: MetricKey,
    pub range: RangeSelection,
    /// Every normalized point, date-sorted.
    pub points: Vec<CanonicalPoint>,
    /// Points inside the selected range.
    pub filtered: Vec<CanonicalPoint>,
    pub normalize: NormalizeReport,
    pub weekly: Vec<WeeklyBucket>,
    pub weekly_summary: WeeklySummary,
    pub kpis: Kpis,
    pub series_means: Vec<(MetricKey, f64)>,
}

impl RunOutput {
    /// The points the charts show: the filtered set, or every point when the
    /// range matched nothing.
    pub fn effective(&self) -> &[CanonicalPoint] {
        if self.filtered.is_empty() {
            &self.points
        } else {
            &self.filtered
        }
    }

    /// True when the range matched nothing and the charts fall back to all points.
    pub fn is_fallback(&self) -> bool {
        self.filtered.is_empty() && !self.points.is_empty()
    }
}

/// Fetch rows from `source` and run the pipeline against the current UTC day.
pub fn fetch_and_run(source: &dyn MeasurementSource, config: &DashConfig) -> Result<RunOutput, AppError> {
    let rows = source.list(&config.query())?;
    Ok(run_pipeline(&rows, config.metric, config.range))
}

/// Run the pipeline against the current UTC day.
pub fn run_pipeline(rows: &[RawRow], metric: MetricKey, range: RangeSelection) -> RunOutput {
    run_pipeline_on(rows, metric, range, Utc::now().date_naive())
}

/// Run the pipeline with an explicit `today`.
pub fn run_pipeline_on(rows: &[RawRow], metric: MetricKey, range: RangeSelection, today: NaiveDate) -> RunOutput {
    let (points, normalize) = normalize_all_with_report(rows);
    recompute_on(points, normalize, metric, range, today)
}

/// Re-derive everything downstream of normalization, e.g. after the user
/// changes the metric or range without a new fetch.
pub fn recompute_on(
    points: Vec<CanonicalPoint>,
    normalize: NormalizeReport,
    metric: MetricKey,
    range: RangeSelection,
    today: NaiveDate,
) -> RunOutput {
    let filtered = filter_points_on(&points, &range, today);
    let effective: &[CanonicalPoint] = if filtered.is_empty() { &points } else { &filtered };

    let weekly = weekly_average(effective, metric);
    let weekly_summary = summarize_weekly(&weekly);
    let kpis = compute_kpis(effective, metric);
    let series_means = series_means(effective);

    RunOutput {
        metric,
        range,
        points,
        filtered,
        normalize,
        weekly,
        weekly_summary,
        kpis,
        series_means,
    }
}
