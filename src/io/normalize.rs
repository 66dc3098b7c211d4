//! Row normalization.
//!
//! This module is responsible for turning heterogeneous measurement rows into
//! a clean, date-sorted set of `CanonicalPoint`s.
//!
//! Design goals:
//! - **Closed schema**: every accepted field name is listed in `RawRow` and
//!   probed in a fixed priority order
//! - **Row-level tolerance** (drop bad rows, count what happened, never fail the batch)
//! - **Deterministic behavior** (stable sort, no wall-clock reads)

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::domain::{CanonicalPoint, DATE_FMT, RawRow};
use crate::error::RowRejection;

/// Mass fields are reported in metric tons; canonical mass is in kg.
const KG_PER_TON: f64 = 1000.0;

/// Full date-time layouts tried (in order) when the value has no offset.
const NAIVE_DATETIME_FMTS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Batch counters for one normalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub rows_read: usize,
    pub rows_used: usize,
    pub missing_date: usize,
    pub no_numeric_field: usize,
}

impl NormalizeReport {
    pub fn rows_dropped(&self) -> usize {
        self.rows_read.saturating_sub(self.rows_used)
    }
}

/// Convert one raw row into a canonical point.
///
/// Field fallback chains pick the first *present* field, not the first
/// non-zero one: a present but non-numeric value yields `0.0` and does not
/// fall through to the next candidate.
pub fn normalize_row(row: &RawRow) -> Result<CanonicalPoint, RowRejection> {
    let raw_date = first_date_value(row).ok_or(RowRejection::MissingDate)?;
    let date = canonical_day(raw_date);

    let speed = read_numeric(first_present(&[&row.speed_kmh, &row.speed, &row.velocity]));
    // `power_kw` is instantaneous power, not energy. Servers that only report
    // power still get a usable energy series, at the cost of mixing units.
    let energy = read_numeric(first_present(&[
        &row.energy_kwh,
        &row.energy,
        &row.kwh,
        &row.power_kw,
    ]));
    // Whichever mass field wins is assumed to be in tons, including the
    // unqualified `mass`.
    let mass_tons = read_numeric(first_present(&[&row.mass_tons, &row.total_mass, &row.mass]));

    if speed.is_none() && energy.is_none() && mass_tons.is_none() {
        return Err(RowRejection::NoNumericField);
    }

    let mass = mass_tons
        .map(|t| t * KG_PER_TON)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);

    Ok(CanonicalPoint {
        date,
        speed: speed.unwrap_or(0.0),
        energy: energy.unwrap_or(0.0),
        mass,
    })
}

/// Normalize a batch, dropping rejected rows, sorted ascending by date.
pub fn normalize_all(rows: &[RawRow]) -> Vec<CanonicalPoint> {
    normalize_all_with_report(rows).0
}

/// Like [`normalize_all`], but also reports how many rows were dropped and why.
pub fn normalize_all_with_report(rows: &[RawRow]) -> (Vec<CanonicalPoint>, NormalizeReport) {
    let mut report = NormalizeReport {
        rows_read: rows.len(),
        ..NormalizeReport::default()
    };
    let mut points = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        match normalize_row(row) {
            Ok(point) => points.push(point),
            Err(reason) => {
                match reason {
                    RowRejection::MissingDate => report.missing_date += 1,
                    RowRejection::NoNumericField => report.no_numeric_field += 1,
                }
                debug!(row = idx, %reason, "dropping measurement row");
            }
        }
    }

    // Fixed-width ISO days order correctly as strings; the sort is stable so
    // same-day rows keep their server order.
    points.sort_by(|a, b| a.date.cmp(&b.date));
    report.rows_used = points.len();

    (points, report)
}

/// Extract rows from a list response body.
///
/// Accepts a bare JSON array or a `{ "data": [...] }` envelope. Any other
/// body yields no rows; array elements that are not objects are skipped.
pub fn rows_from_json(body: Value) -> Vec<RawRow> {
    let items = match unwrap_envelope(body) {
        Value::Array(items) => items,
        other => {
            debug!(kind = json_kind(&other), "list response is not an array");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let row = row_from_value(item);
            if row.is_none() {
                debug!(row = idx, "skipping non-object list element");
            }
            row
        })
        .collect()
}

/// Extract the single row from a "latest" response body.
pub fn row_from_json(body: Value) -> Option<RawRow> {
    row_from_value(unwrap_envelope(body))
}

fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

fn row_from_value(value: Value) -> Option<RawRow> {
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A usable date value taken from a row.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RawDate<'a> {
    Text(&'a str),
    EpochMillis(f64),
}

fn first_date_value(row: &RawRow) -> Option<RawDate<'_>> {
    [&row.date, &row.created_at, &row.timestamp]
        .into_iter()
        .find_map(|field| match field.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(RawDate::Text(s)),
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(RawDate::EpochMillis),
            _ => None,
        })
}

/// Resolve a raw date to a `YYYY-MM-DD` UTC day.
///
/// Strings that do not parse as a date or date-time fall back to their first
/// ten characters, unvalidated, so ISO-looking values still pass through.
fn canonical_day(raw: RawDate<'_>) -> String {
    match raw {
        RawDate::Text(s) => match parse_utc_day(s.trim()) {
            Some(day) => day.format(DATE_FMT).to_string(),
            None => s.chars().take(10).collect(),
        },
        RawDate::EpochMillis(ms) => match DateTime::<Utc>::from_timestamp_millis(ms as i64) {
            Some(dt) => dt.date_naive().format(DATE_FMT).to_string(),
            None => ms.to_string().chars().take(10).collect(),
        },
    }
}

fn parse_utc_day(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    // Offset-less timestamps are taken to be UTC already.
    for fmt in NAIVE_DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, DATE_FMT).ok()
}

fn first_present<'a>(fields: &[&'a Option<Value>]) -> Option<&'a Value> {
    fields.iter().find_map(|f| f.as_ref())
}

fn read_numeric(value: Option<&Value>) -> Option<f64> {
    let v = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn scenario_rows_normalize_and_drop_dateless() {
        let rows = vec![
            row(json!({"date": "2024-01-01", "speed_kmh": 100})),
            row(json!({"date": "2024-01-02", "speed": "bad", "energy_kwh": 50})),
            row(json!({"speed_kmh": 80})),
        ];

        let (points, report) = normalize_all_with_report(&rows);
        assert_eq!(
            points,
            vec![
                CanonicalPoint {
                    date: "2024-01-01".to_string(),
                    speed: 100.0,
                    energy: 0.0,
                    mass: 0.0,
                },
                CanonicalPoint {
                    date: "2024-01-02".to_string(),
                    speed: 0.0,
                    energy: 50.0,
                    mass: 0.0,
                },
            ]
        );
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_used, 2);
        assert_eq!(report.missing_date, 1);
        assert_eq!(report.rows_dropped(), 1);
    }

    #[test]
    fn mass_tons_converts_to_kg() {
        let p = normalize_row(&row(json!({"date": "2024-03-04", "mass_tons": 3.5}))).unwrap();
        assert!((p.mass - 3500.0).abs() < 1e-9);
    }

    #[test]
    fn unqualified_mass_is_still_treated_as_tons() {
        let p = normalize_row(&row(json!({"date": "2024-03-04", "mass": "2"}))).unwrap();
        assert!((p.mass - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn first_present_field_wins_even_when_not_numeric() {
        let p = normalize_row(&row(json!({
            "date": "2024-03-04",
            "speed_kmh": "n/a",
            "speed": 42,
            "velocity": 7,
            "kwh": 3
        })))
        .unwrap();
        assert_eq!(p.speed, 0.0);
        assert_eq!(p.energy, 3.0);
    }

    #[test]
    fn null_fields_fall_through_to_the_next_candidate() {
        let p = normalize_row(&row(json!({"date": "2024-03-04", "speed_kmh": null, "velocity": "12.5"}))).unwrap();
        assert_eq!(p.speed, 12.5);
    }

    #[test]
    fn power_is_accepted_as_energy_proxy() {
        let p = normalize_row(&row(json!({"date": "2024-03-04", "power_kw": 7.25}))).unwrap();
        assert_eq!(p.energy, 7.25);
    }

    #[test]
    fn rejects_row_without_numeric_fields() {
        let r = row(json!({"date": "2024-03-04", "speed": "x", "energy": true, "note": 5}));
        assert_eq!(normalize_row(&r), Err(RowRejection::NoNumericField));
    }

    #[test]
    fn rejects_row_without_date() {
        assert_eq!(normalize_row(&row(json!({"speed": 1}))), Err(RowRejection::MissingDate));
        assert_eq!(
            normalize_row(&row(json!({"date": "  ", "created_at": "", "speed": 1}))),
            Err(RowRejection::MissingDate)
        );
    }

    #[test]
    fn blank_date_strings_count_as_absent() {
        let p = normalize_row(&row(json!({"date": "   ", "created_at": "2024-03-04", "speed": 1}))).unwrap();
        assert_eq!(p.date, "2024-03-04");
    }

    #[test]
    fn rows_dropped_never_underflows() {
        let report = NormalizeReport {
            rows_read: 1,
            rows_used: 3,
            ..NormalizeReport::default()
        };
        assert_eq!(report.rows_dropped(), 0);
    }

    #[test]
    fn date_falls_back_through_created_at_and_timestamp() {
        let p = normalize_row(&row(json!({"created_at": "2024-05-06 23:10:00", "speed": 1}))).unwrap();
        assert_eq!(p.date, "2024-05-06");

        let p = normalize_row(&row(json!({"date": "", "timestamp": "2024-05-07T01:00:00Z", "speed": 1}))).unwrap();
        assert_eq!(p.date, "2024-05-07");
    }

    #[test]
    fn offsets_are_converted_to_the_utc_day() {
        let p = normalize_row(&row(json!({"date": "2024-05-07T01:30:00+02:00", "speed": 1}))).unwrap();
        assert_eq!(p.date, "2024-05-06");

        let p = normalize_row(&row(json!({"date": "2024-05-06T23:30:00-0100", "speed": 1}))).unwrap();
        assert_eq!(p.date, "2024-05-07");
    }

    #[test]
    fn numeric_timestamps_are_epoch_millis() {
        // 2024-01-01T00:00:00Z
        let p = normalize_row(&row(json!({"timestamp": 1_704_067_200_000_i64, "speed": 1}))).unwrap();
        assert_eq!(p.date, "2024-01-01");
    }

    #[test]
    fn unparseable_dates_keep_their_first_ten_characters() {
        let p = normalize_row(&row(json!({"date": "2024-13-45 garbage", "speed": 1}))).unwrap();
        assert_eq!(p.date, "2024-13-45");
        assert!(p.day().is_none());
    }

    #[test]
    fn output_is_sorted_and_stable_for_same_day_rows() {
        let rows = vec![
            row(json!({"date": "2024-01-03", "speed": 3})),
            row(json!({"date": "2024-01-01", "speed": 1})),
            row(json!({"date": "2024-01-03", "speed": 4})),
            row(json!({"date": "2024-01-02", "speed": 2})),
        ];
        let speeds: Vec<f64> = normalize_all(&rows).iter().map(|p| p.speed).collect();
        assert_eq!(speeds, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn every_output_field_is_finite() {
        let rows = vec![
            row(json!({"date": "2024-01-01", "speed": "inf", "energy": "NaN", "mass_tons": 1e308})),
            row(json!({"date": "2024-01-02", "speed": "-3.5e1"})),
        ];
        let points = normalize_all(&rows);
        assert_eq!(points.len(), 2);
        for p in &points {
            assert!(p.speed.is_finite() && p.energy.is_finite() && p.mass.is_finite());
        }
        assert_eq!(points[1].speed, -35.0);
    }

    #[test]
    fn rows_from_json_accepts_bare_arrays_and_envelopes() {
        let bare = rows_from_json(json!([{"date": "2024-01-01", "speed": 1}, 5, "x"]));
        assert_eq!(bare.len(), 1);

        let wrapped = rows_from_json(json!({"data": [{"date": "2024-01-01"}, {"date": "2024-01-02"}]}));
        assert_eq!(wrapped.len(), 2);

        assert!(rows_from_json(json!({"message": "ok"})).is_empty());
        assert!(rows_from_json(json!({"data": {"date": "2024-01-01"}})).is_empty());
        assert!(rows_from_json(Value::Null).is_empty());
    }

    #[test]
    fn row_from_json_unwraps_latest_envelope() {
        let r = row_from_json(json!({"data": {"date": "2024-01-01", "speed": 9}})).unwrap();
        assert_eq!(normalize_row(&r).unwrap().speed, 9.0);
        assert!(row_from_json(json!([])).is_none());
    }
}
