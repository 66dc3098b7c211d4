//! Synthetic measurement rows for offline runs and demos.
//!
//! The generator owns its RNG; two generators built from the same seed emit
//! the same rows. Rows deliberately vary their field names and encodings the
//! way real server exports do, so the normalizer gets exercised end to end.

use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde_json::{Value, json};

use crate::data::MeasurementSource;
use crate::domain::{DATE_FMT, MeasurementQuery, RawRow};
use crate::error::AppError;
use crate::io::normalize::normalize_row;

/// Mean cruising speed on weekdays (km/h).
const SPEED_MEAN: f64 = 82.0;
const SPEED_SD: f64 = 9.0;
/// Weekend service runs slower.
const WEEKEND_SPEED_FACTOR: f64 = 0.8;

const ENERGY_BASE_KWH: f64 = 35.0;
const ENERGY_PER_KMH: f64 = 0.45;
const ENERGY_SD: f64 = 4.0;

const MASS_MEAN_TONS: f64 = 420.0;
const MASS_SD_TONS: f64 = 30.0;

/// Share of rows emitted without any date field.
const DATELESS_PROB: f64 = 0.02;
/// Share of rows whose speed value is junk text.
const JUNK_SPEED_PROB: f64 = 0.03;

/// Deterministic generator of raw measurement rows.
pub struct SampleGenerator {
    rng: StdRng,
    speed: Normal<f64>,
    energy_noise: Normal<f64>,
    mass: Normal<f64>,
}

impl SampleGenerator {
    pub fn new(seed: u64) -> Result<Self, AppError> {
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            speed: normal(SPEED_MEAN, SPEED_SD)?,
            energy_noise: normal(0.0, ENERGY_SD)?,
            mass: normal(MASS_MEAN_TONS, MASS_SD_TONS)?,
        })
    }

    /// Rows covering the `days` days ending on `end` (inclusive), 1–3 per day,
    /// in generation order (not necessarily sorted).
    pub fn rows(&mut self, end: NaiveDate, days: u32) -> Vec<RawRow> {
        let days = days.max(1);
        let mut out = Vec::with_capacity(days as usize * 2);
        for back in (0..u64::from(days)).rev() {
            let Some(day) = end.checked_sub_days(Days::new(back)) else {
                continue;
            };
            let readings = self.rng.gen_range(1..=3);
            for i in 0..readings {
                out.push(self.row(day, i));
            }
        }
        // Servers do not promise ordering; shuffle a little.
        for i in (1..out.len()).rev() {
            if self.rng.gen_bool(0.1) {
                let j = self.rng.gen_range(0..=i);
                out.swap(i, j);
            }
        }
        out
    }

    fn row(&mut self, day: NaiveDate, reading: u32) -> RawRow {
        let weekend = matches!(day.weekday(), Weekday::Sat | Weekday::Sun);
        let mut speed = self.speed.sample(&mut self.rng).max(0.0);
        if weekend {
            speed *= WEEKEND_SPEED_FACTOR;
        }
        let energy = (ENERGY_BASE_KWH + ENERGY_PER_KMH * speed + self.energy_noise.sample(&mut self.rng)).max(0.0);
        let mass_tons = self.mass.sample(&mut self.rng).max(0.0);

        let hour = 6 + reading * 5 + self.rng.gen_range(0..4);
        let minute = self.rng.gen_range(0..60);

        let mut row = RawRow::default();

        if !self.rng.gen_bool(DATELESS_PROB) {
            match self.rng.gen_range(0..3) {
                0 => row.date = Some(Value::String(day.format(DATE_FMT).to_string())),
                1 => {
                    row.created_at = Some(Value::String(format!(
                        "{} {hour:02}:{minute:02}:00",
                        day.format(DATE_FMT)
                    )))
                }
                _ => {
                    row.timestamp = Some(Value::String(format!(
                        "{}T{hour:02}:{minute:02}:00Z",
                        day.format(DATE_FMT)
                    )))
                }
            }
        }

        let speed_value = if self.rng.gen_bool(JUNK_SPEED_PROB) {
            Value::String("n/a".to_string())
        } else {
            self.encode(round2(speed))
        };
        match self.rng.gen_range(0..3) {
            0 => row.speed_kmh = Some(speed_value),
            1 => row.speed = Some(speed_value),
            _ => row.velocity = Some(speed_value),
        }

        let energy_value = self.encode(round2(energy));
        match self.rng.gen_range(0..4) {
            0 | 1 => row.energy_kwh = Some(energy_value),
            2 => row.kwh = Some(energy_value),
            _ => row.power_kw = Some(energy_value),
        }

        let mass_value = self.encode(round2(mass_tons));
        if self.rng.gen_bool(0.5) {
            row.mass_tons = Some(mass_value);
        } else {
            row.total_mass = Some(mass_value);
        }

        row
    }

    /// Numbers arrive either as JSON numbers or as numeric strings.
    fn encode(&mut self, v: f64) -> Value {
        if self.rng.gen_bool(0.25) {
            Value::String(format!("{v}"))
        } else {
            json!(v)
        }
    }
}

fn normal(mean: f64, sd: f64) -> Result<Normal<f64>, AppError> {
    Normal::new(mean, sd).map_err(|e| AppError::runtime(format!("Sample distribution error: {e}")))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// A [`MeasurementSource`] serving synthetic rows anchored at today (UTC).
#[derive(Debug, Clone)]
pub struct SampleSource {
    seed: u64,
    days: u32,
}

impl SampleSource {
    pub fn new(seed: u64, days: u32) -> Self {
        Self { seed, days }
    }

    fn generate(&self) -> Result<Vec<RawRow>, AppError> {
        let today = Utc::now().date_naive();
        Ok(SampleGenerator::new(self.seed)?.rows(today, self.days))
    }
}

impl MeasurementSource for SampleSource {
    fn list(&self, _query: &MeasurementQuery) -> Result<Vec<RawRow>, AppError> {
        self.generate()
    }

    fn latest(&self, _train_id: Option<&str>) -> Result<Option<RawRow>, AppError> {
        let latest = self
            .generate()?
            .into_iter()
            .filter_map(|row| normalize_row(&row).ok().map(|p| (p.date, row)))
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, row)| row);
        Ok(latest)
    }

    fn describe(&self) -> String {
        format!("sample seed={} days={}", self.seed, self.days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::normalize::normalize_all_with_report;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FMT).unwrap()
    }

    #[test]
    fn same_seed_same_rows() {
        let a = SampleGenerator::new(7).unwrap().rows(day("2024-03-31"), 30);
        let b = SampleGenerator::new(7).unwrap().rows(day("2024-03-31"), 30);
        assert_eq!(a, b);

        let c = SampleGenerator::new(8).unwrap().rows(day("2024-03-31"), 30);
        assert_ne!(a, c);
    }

    #[test]
    fn rows_cover_the_requested_window() {
        let rows = SampleGenerator::new(42).unwrap().rows(day("2024-03-31"), 14);
        let (points, report) = normalize_all_with_report(&rows);

        assert!(report.rows_read >= 14 && report.rows_read <= 42);
        assert!(!points.is_empty());
        let first = points.first().unwrap().day().unwrap();
        let last = points.last().unwrap().day().unwrap();
        assert!(first >= day("2024-03-18"));
        assert!(last <= day("2024-03-31"));
        for p in &points {
            assert!(p.mass >= 0.0 && p.energy >= 0.0 && p.speed >= 0.0);
        }
    }

    #[test]
    fn source_latest_is_the_newest_dated_row() {
        let source = SampleSource::new(3, 10);
        let latest = source.latest(None).unwrap().unwrap();
        let latest_day = normalize_row(&latest).unwrap().date;
        let all = crate::io::normalize::normalize_all(&source.list(&MeasurementQuery::default()).unwrap());
        assert_eq!(latest_day, all.last().unwrap().date);
    }
}
