//! Formatted terminal output for the one-shot CLI commands.
//!
//! We keep formatting code in one place so the pipeline stays free of
//! presentation concerns and output changes are localized.

use crate::app::pipeline::RunOutput;
use crate::domain::{CanonicalPoint, DashConfig, MetricKey, WeeklyBucket};

/// Format the dashboard summary: data status, KPIs, series means and weekly table.
pub fn format_run_summary(run: &RunOutput, config: &DashConfig, source: &str) -> String {
    let meta = run.metric.meta();
    let mut out = String::new();

    out.push_str("=== dash - measurement summary ===\n");
    out.push_str(&format!("Source: {source}\n"));
    if let Some(train) = config.train_id.as_deref() {
        out.push_str(&format!("Train: {train}\n"));
    }
    out.push_str(&format!("Metric: {} ({})\n", meta.label, meta.unit));
    out.push_str(&format!("Range: {}\n", run.range.label()));
    out.push_str(&format!("{}\n", format_data_status(run)));
    if run.is_fallback() {
        out.push_str("No data in the selected range; showing every point.\n");
    }

    out.push_str("\nKPIs:\n");
    out.push_str(&format!("  current   {:>12.1} {}\n", run.kpis.current, meta.unit));
    out.push_str(&format!("  average   {:>12.1} {}\n", run.kpis.average, meta.unit));
    out.push_str(&format!("  variation {:>12} %\n", fmt_signed(run.kpis.variation_pct)));

    out.push_str("\nSeries means:\n");
    for (key, avg) in &run.series_means {
        let m = key.meta();
        out.push_str(&format!("  {:<12} {:>12.1} {}\n", m.label, avg, m.unit));
    }

    out.push_str(&format!("\nWeekly averages ({}):\n", meta.label));
    out.push_str(&format!(
        "range: {:.1} - {:.1} | std dev: {:.1}\n",
        run.weekly_summary.min, run.weekly_summary.max, run.weekly_summary.std_dev
    ));
    out.push_str(&format_weekly_table(&run.weekly, run.metric));

    out
}

/// One-line status, e.g. `server: 120 | visible: 31 | dropped: 2`.
pub fn format_data_status(run: &RunOutput) -> String {
    let mut line = format!("server: {} | visible: {}", run.normalize.rows_read, run.filtered.len());
    let dropped = run.normalize.rows_dropped();
    if dropped > 0 {
        line.push_str(&format!(" | dropped: {dropped}"));
    }
    line
}

pub fn format_weekly_table(buckets: &[WeeklyBucket], metric: MetricKey) -> String {
    let mut out = String::new();
    if buckets.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    out.push_str(&format!("{:<12} {:>12}\n", "week", metric.as_str()));
    out.push_str(&format!("{:-<12} {:-<12}\n", "", ""));
    for b in buckets {
        out.push_str(&format!("{:<12} {:>12.2}\n", b.week, b.value));
    }
    out
}

/// Format the newest measurement (or a placeholder).
pub fn format_latest(point: Option<&CanonicalPoint>) -> String {
    let Some(p) = point else {
        return "No latest measurement available.\n".to_string();
    };

    let mut out = String::new();
    out.push_str(&format!("Latest measurement ({})\n", p.date));
    for key in MetricKey::ALL {
        let m = key.meta();
        out.push_str(&format!("  {:<12} {:>12.1} {}\n", m.label, p.value(key), m.unit));
    }
    out
}

pub fn fmt_signed(v: f64) -> String {
    if v >= 0.0 {
        format!("+{v:.1}")
    } else {
        format!("{v:.1}")
    }
}
