//! Date range filtering.
//!
//! Preset windows are anchored to the current UTC day, not to the newest
//! point, so a stale feed can legitimately filter down to nothing.

use chrono::{Days, NaiveDate, Utc};

use crate::domain::{CanonicalPoint, RangeSelection};

/// Filter points against the current UTC day.
pub fn filter_points(points: &[CanonicalPoint], selection: &RangeSelection) -> Vec<CanonicalPoint> {
    filter_points_on(points, selection, Utc::now().date_naive())
}

/// Filter points against an explicit `today`.
///
/// Output keeps input order. Points whose date is not a calendar day never
/// fall inside a window.
pub fn filter_points_on(
    points: &[CanonicalPoint],
    selection: &RangeSelection,
    today: NaiveDate,
) -> Vec<CanonicalPoint> {
    let (start, end) = resolve_bounds(points, selection, today);
    points
        .iter()
        .filter(|p| match p.day() {
            Some(day) => day >= start && end.is_none_or(|end| day <= end),
            None => false,
        })
        .cloned()
        .collect()
}

/// Resolve a selection to `[start, end]`; `end == None` means unbounded.
pub fn resolve_bounds(
    points: &[CanonicalPoint],
    selection: &RangeSelection,
    today: NaiveDate,
) -> (NaiveDate, Option<NaiveDate>) {
    match *selection {
        RangeSelection::Preset { days } => (preset_start(today, days), None),
        RangeSelection::Custom { start, end } => {
            // Malformed dates can sort to either end; skip them.
            let start = start
                .or_else(|| points.iter().find_map(CanonicalPoint::day))
                .unwrap_or(today);
            let end = end
                .or_else(|| points.iter().rev().find_map(CanonicalPoint::day))
                .unwrap_or(today);
            (start, Some(end))
        }
    }
}

/// First day of an inclusive trailing window of `days` days ending on `today`.
pub fn preset_start(today: NaiveDate, days: u32) -> NaiveDate {
    let back = u64::from(days.max(1) - 1);
    today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn point(date: &str, speed: f64) -> CanonicalPoint {
        CanonicalPoint {
            date: date.to_string(),
            speed,
            energy: 0.0,
            mass: 0.0,
        }
    }

    #[test]
    fn custom_single_day_range() {
        let points = vec![
            point("2024-01-01", 100.0),
            CanonicalPoint {
                date: "2024-01-02".to_string(),
                speed: 0.0,
                energy: 50.0,
                mass: 0.0,
            },
        ];
        let sel = RangeSelection::Custom {
            start: Some(day("2024-01-02")),
            end: Some(day("2024-01-02")),
        };
        let out = filter_points_on(&points, &sel, day("2024-06-01"));
        assert_eq!(out, vec![points[1].clone()]);
    }

    #[test]
    fn custom_bounds_default_to_data_extent() {
        let points = vec![point("2024-01-01", 1.0), point("2024-01-05", 2.0), point("2024-01-09", 3.0)];

        let open = RangeSelection::Custom { start: None, end: None };
        assert_eq!(filter_points_on(&points, &open, day("2030-01-01")).len(), 3);

        let from = RangeSelection::Custom {
            start: Some(day("2024-01-05")),
            end: None,
        };
        let out = filter_points_on(&points, &from, day("2030-01-01"));
        assert_eq!(out.iter().map(|p| p.speed).collect::<Vec<_>>(), vec![2.0, 3.0]);

        let to = RangeSelection::Custom {
            start: None,
            end: Some(day("2024-01-04")),
        };
        assert_eq!(filter_points_on(&points, &to, day("2030-01-01")), vec![points[0].clone()]);
    }

    #[test]
    fn custom_bounds_skip_malformed_dates_at_either_end() {
        // "05.01.2024" sorts before ISO days, "garbage" after them.
        let points = vec![
            point("05.01.2024", 1.0),
            point("2024-01-10", 2.0),
            point("2024-01-20", 3.0),
            point("garbage", 4.0),
        ];

        let to = RangeSelection::Custom {
            start: None,
            end: Some(day("2024-01-31")),
        };
        let out = filter_points_on(&points, &to, day("2026-10-15"));
        assert_eq!(out.iter().map(|p| p.speed).collect::<Vec<_>>(), vec![2.0, 3.0]);

        let open = RangeSelection::Custom { start: None, end: None };
        assert_eq!(
            resolve_bounds(&points, &open, day("2026-10-15")),
            (day("2024-01-10"), Some(day("2024-01-20")))
        );
    }

    #[test]
    fn custom_range_on_empty_input_is_empty() {
        let sel = RangeSelection::Custom { start: None, end: None };
        assert_eq!(resolve_bounds(&[], &sel, day("2024-02-02")), (day("2024-02-02"), Some(day("2024-02-02"))));
        assert!(filter_points_on(&[], &sel, day("2024-02-02")).is_empty());
    }

    #[test]
    fn preset_window_is_inclusive_of_both_ends() {
        let today = day("2024-03-10");
        let points = vec![
            point("2024-03-03", 1.0),
            point("2024-03-04", 2.0),
            point("2024-03-10", 3.0),
            point("2024-03-11", 4.0),
        ];
        let out = filter_points_on(&points, &RangeSelection::Preset { days: 7 }, today);
        // Future-dated points are inside a trailing window too.
        assert_eq!(out.iter().map(|p| p.speed).collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn stale_data_can_filter_to_nothing() {
        let points = vec![point("2020-01-01", 1.0)];
        assert!(filter_points_on(&points, &RangeSelection::default(), day("2024-01-01")).is_empty());
    }

    #[test]
    fn malformed_dates_are_never_in_range() {
        let points = vec![point("2024-13-45", 1.0), point("2024-03-10", 2.0)];
        let out = filter_points_on(&points, &RangeSelection::Preset { days: 30 }, day("2024-03-10"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].speed, 2.0);
    }

    #[test]
    fn zero_day_preset_behaves_like_one_day() {
        assert_eq!(preset_start(day("2024-03-10"), 0), day("2024-03-10"));
        assert_eq!(preset_start(day("2024-03-10"), 1), day("2024-03-10"));
        assert_eq!(preset_start(day("2024-03-10"), 30), day("2024-02-10"));
    }

    proptest! {
        #[test]
        fn preset_never_returns_points_before_the_window(
            offsets in prop::collection::vec(0u64..400, 0..50),
            n in 1u32..120,
        ) {
            let today = day("2024-06-15");
            let mut points: Vec<CanonicalPoint> = offsets
                .iter()
                .map(|&o| point(&(today - Days::new(o)).format("%Y-%m-%d").to_string(), o as f64))
                .collect();
            points.sort_by(|a, b| a.date.cmp(&b.date));

            let out = filter_points_on(&points, &RangeSelection::Preset { days: n }, today);
            let cutoff = today - Days::new(u64::from(n - 1));
            for p in &out {
                prop_assert!(p.day().unwrap() >= cutoff);
            }
            let expected = points.iter().filter(|p| p.day().unwrap() >= cutoff).count();
            prop_assert_eq!(out.len(), expected);
        }
    }
}
