//! Dashboard figures derived from the filtered points: KPIs, per-series
//! means and the weekly chart caption.

pub mod format;

pub use format::*;

use crate::domain::{CanonicalPoint, MetricKey, WeeklyBucket};
use crate::stats::{mean, min_max, std_dev};

/// Headline numbers for the selected metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kpis {
    /// Value of the newest point.
    pub current: f64,
    pub average: f64,
    /// Change from the oldest to the newest point, in percent.
    pub variation_pct: f64,
    pub count: usize,
}

/// Range and spread of the weekly bucket values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeeklySummary {
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

/// Compute KPIs for `metric` over already filtered, date-sorted points.
pub fn compute_kpis(points: &[CanonicalPoint], metric: MetricKey) -> Kpis {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Kpis {
            current: 0.0,
            average: 0.0,
            variation_pct: 0.0,
            count: 0,
        };
    };

    let values: Vec<f64> = points.iter().map(|p| p.value(metric)).collect();
    let first = first.value(metric);
    let current = last.value(metric);
    let variation_pct = if first != 0.0 {
        (current - first) / first * 100.0
    } else {
        0.0
    };

    Kpis {
        current,
        average: mean(&values),
        variation_pct,
        count: points.len(),
    }
}

/// Mean of every metric, in catalog order (line chart legend).
pub fn series_means(points: &[CanonicalPoint]) -> Vec<(MetricKey, f64)> {
    MetricKey::ALL
        .iter()
        .map(|&key| {
            let values: Vec<f64> = points.iter().map(|p| p.value(key)).collect();
            (key, mean(&values))
        })
        .collect()
}

pub fn summarize_weekly(buckets: &[WeeklyBucket]) -> WeeklySummary {
    let values: Vec<f64> = buckets.iter().map(|b| b.value).collect();
    let (min, max) = min_max(&values);
    WeeklySummary {
        min,
        max,
        std_dev: std_dev(&values),
    }
}
