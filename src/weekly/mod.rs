//! Weekly bucketing.
//!
//! Points are grouped by the Monday of their ISO week and each group is
//! reduced to the mean of the selected metric. Weeks without points get no
//! bucket.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};

use crate::domain::{CanonicalPoint, DATE_FMT, MetricKey, WeeklyBucket};
use crate::stats::mean;

/// Mean of `metric` per ISO week, ascending by week.
pub fn weekly_average(points: &[CanonicalPoint], metric: MetricKey) -> Vec<WeeklyBucket> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for p in points {
        groups.entry(week_key(p)).or_default().push(p.value(metric));
    }

    groups
        .into_iter()
        .map(|(week, values)| WeeklyBucket {
            week,
            value: mean(&values),
        })
        .collect()
}

/// Monday on or before `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    let offset = u64::from(day.weekday().num_days_from_monday());
    day.checked_sub_days(Days::new(offset)).unwrap_or(day)
}

/// Bucket key for a point. A date that does not parse is its own key.
fn week_key(point: &CanonicalPoint) -> String {
    match point.day() {
        Some(day) => week_start(day).format(DATE_FMT).to_string(),
        None => point.date.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FMT).unwrap()
    }

    fn point(date: &str, speed: f64, energy: f64) -> CanonicalPoint {
        CanonicalPoint {
            date: date.to_string(),
            speed,
            energy,
            mass: 0.0,
        }
    }

    #[test]
    fn week_start_is_monday() {
        // 2024-01-01 is a Monday.
        assert_eq!(week_start(day("2024-01-01")), day("2024-01-01"));
        assert_eq!(week_start(day("2024-01-03")), day("2024-01-01"));
        assert_eq!(week_start(day("2024-01-07")), day("2024-01-01"));
        assert_eq!(week_start(day("2024-01-08")), day("2024-01-08"));
        // Crosses a year boundary.
        assert_eq!(week_start(day("2025-01-01")), day("2024-12-30"));
    }

    #[test]
    fn seven_days_from_monday_make_one_bucket() {
        let points: Vec<CanonicalPoint> = (0..7)
            .map(|i| {
                let d = day("2024-01-01") + Days::new(i);
                point(&d.format(DATE_FMT).to_string(), (i * 10) as f64, 0.0)
            })
            .collect();

        let buckets = weekly_average(&points, MetricKey::Speed);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].week, "2024-01-01");
        assert!((buckets[0].value - 30.0).abs() < 1e-12);
    }

    #[test]
    fn selects_the_requested_metric_and_skips_empty_weeks() {
        let points = vec![
            point("2024-01-02", 1.0, 10.0),
            point("2024-01-04", 3.0, 30.0),
            point("2024-01-23", 5.0, 50.0),
        ];
        let buckets = weekly_average(&points, MetricKey::Energy);
        assert_eq!(
            buckets,
            vec![
                WeeklyBucket {
                    week: "2024-01-01".to_string(),
                    value: 20.0,
                },
                WeeklyBucket {
                    week: "2024-01-22".to_string(),
                    value: 50.0,
                },
            ]
        );
    }

    #[test]
    fn empty_input_has_no_buckets() {
        assert!(weekly_average(&[], MetricKey::Mass).is_empty());
    }

    #[test]
    fn malformed_dates_get_their_own_bucket() {
        let points = vec![point("2024-01-02", 1.0, 0.0), point("garbage!!!", 9.0, 0.0)];
        let buckets = weekly_average(&points, MetricKey::Speed);
        assert_eq!(buckets.len(), 2);
        assert!(buckets.iter().any(|b| b.week == "garbage!!!" && b.value == 9.0));
    }

    proptest! {
        #[test]
        fn buckets_partition_the_input(offsets in prop::collection::vec(0u64..120, 0..80)) {
            let base = day("2024-01-01");
            let points: Vec<CanonicalPoint> = offsets
                .iter()
                .enumerate()
                .map(|(i, &o)| point(&(base + Days::new(o)).format(DATE_FMT).to_string(), i as f64, 0.0))
                .collect();

            let buckets = weekly_average(&points, MetricKey::Speed);

            for pair in buckets.windows(2) {
                prop_assert!(pair[0].week < pair[1].week);
            }

            // Every point maps to exactly one existing bucket.
            let mut members = vec![0usize; buckets.len()];
            for p in &points {
                let key = week_start(p.day().unwrap()).format(DATE_FMT).to_string();
                let hits: Vec<usize> = buckets
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| b.week == key)
                    .map(|(i, _)| i)
                    .collect();
                prop_assert_eq!(hits.len(), 1);
                members[hits[0]] += 1;
            }
            prop_assert_eq!(members.iter().sum::<usize>(), points.len());
            prop_assert!(members.iter().all(|&m| m > 0));
        }
    }
}
