//! Export dashboard data to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.
//! Fields are quoted by the `csv` writer, so raw week keys that carry commas or
//! quotes stay in one column.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::domain::{CanonicalPoint, MetricKey, WeeklyBucket};
use crate::error::AppError;

/// Write canonical points (all three metrics) to a CSV file.
pub fn write_points_csv(path: &Path, points: &[CanonicalPoint]) -> Result<(), AppError> {
    let mut wtr = create(path)?;

    wtr.write_record(["date", "speed", "energy", "mass"])
        .map_err(|e| write_err(path, e))?;
    for p in points {
        wtr.write_record([
            p.date.clone(),
            format!("{:.4}", p.speed),
            format!("{:.4}", p.energy),
            format!("{:.4}", p.mass),
        ])
        .map_err(|e| write_err(path, e))?;
    }
    finish(path, wtr)
}

/// Write weekly averages for one metric to a CSV file.
pub fn write_weekly_csv(path: &Path, buckets: &[WeeklyBucket], metric: MetricKey) -> Result<(), AppError> {
    let mut wtr = create(path)?;
    let unit = metric.meta().unit;

    wtr.write_record(["week", "metric", "unit", "value"])
        .map_err(|e| write_err(path, e))?;
    for b in buckets {
        let value = format!("{:.4}", b.value);
        wtr.write_record([b.week.as_str(), metric.as_str(), unit, value.as_str()])
            .map_err(|e| write_err(path, e))?;
    }
    finish(path, wtr)
}

fn create(path: &Path) -> Result<Writer<File>, AppError> {
    Writer::from_path(path)
        .map_err(|e| AppError::runtime(format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn finish(path: &Path, mut wtr: Writer<File>) -> Result<(), AppError> {
    wtr.flush()
        .map_err(|e| AppError::runtime(format!("Failed to write export CSV '{}': {e}", path.display())))
}

fn write_err(path: &Path, e: csv::Error) -> AppError {
    AppError::runtime(format!("Failed to write export CSV '{}': {e}", path.display()))
}
