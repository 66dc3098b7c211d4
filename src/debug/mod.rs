//! Debug bundle writer for inspecting what the dashboard received and derived.

use std::fmt::Write as _;
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::RunOutput;
use crate::domain::{DashConfig, MetricKey};
use crate::error::AppError;

const DEBUG_DIR: &str = "debug";

/// Write a markdown snapshot of `run` under `./debug/`.
pub fn write_debug_bundle(run: &RunOutput, config: &DashConfig, source: &str) -> Result<PathBuf, AppError> {
    write_debug_bundle_in(Path::new(DEBUG_DIR), run, config, source)
}

pub fn write_debug_bundle_in(
    dir: &Path,
    run: &RunOutput,
    config: &DashConfig,
    source: &str,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::runtime(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("dash_debug_{}_{ts}.md", run.metric.as_str()));

    let mut file = File::create(&path)
        .map_err(|e| AppError::runtime(format!("Failed to create debug file: {e}")))?;
    file.write_all(render_debug_bundle(run, config, source).as_bytes())
        .map_err(|e| AppError::runtime(format!("Failed to write debug file: {e}")))?;

    Ok(path)
}

/// Markdown body of the bundle.
pub fn render_debug_bundle(run: &RunOutput, config: &DashConfig, source: &str) -> String {
    let mut md = String::new();
    // Writing into a String cannot fail.
    let _ = write_body(&mut md, run, config, source);
    md
}

fn write_body(md: &mut String, run: &RunOutput, config: &DashConfig, source: &str) -> std::fmt::Result {
    let meta = run.metric.meta();

    writeln!(md, "# dash debug bundle")?;
    writeln!(md, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(md, "- source: {source}")?;
    writeln!(md, "- train_id: {}", config.train_id.as_deref().unwrap_or("-"))?;
    writeln!(md, "- metric: {} ({})", meta.label, meta.unit)?;
    writeln!(md, "- range: {}", run.range.label())?;
    writeln!(md, "- poll_interval: {}s", config.poll_interval.as_secs())?;

    let n = &run.normalize;
    writeln!(md, "\n## Normalization")?;
    writeln!(md, "| rows_read | rows_used | missing_date | no_numeric_field |")?;
    writeln!(md, "| - | - | - | - |")?;
    writeln!(
        md,
        "| {} | {} | {} | {} |",
        n.rows_read, n.rows_used, n.missing_date, n.no_numeric_field
    )?;
    writeln!(md, "- visible points: {}", run.filtered.len())?;
    if run.is_fallback() {
        writeln!(md, "- range matched nothing; charts fall back to all points")?;
    }

    writeln!(md, "\n## KPIs")?;
    writeln!(md, "| current | average | variation_pct | count |")?;
    writeln!(md, "| - | - | - | - |")?;
    writeln!(
        md,
        "| {:.3} | {:.3} | {:.3} | {} |",
        run.kpis.current, run.kpis.average, run.kpis.variation_pct, run.kpis.count
    )?;

    writeln!(md, "\n## Weekly averages")?;
    let s = &run.weekly_summary;
    writeln!(md, "range {:.3} - {:.3}, std dev {:.3}", s.min, s.max, s.std_dev)?;
    writeln!(md, "| week | value |")?;
    writeln!(md, "| - | - |")?;
    for b in &run.weekly {
        writeln!(md, "| {} | {:.3} |", b.week, b.value)?;
    }

    writeln!(md, "\n## Points")?;
    let header: Vec<&str> = MetricKey::ALL.iter().map(|k| k.as_str()).collect();
    writeln!(md, "| date | {} |", header.join(" | "))?;
    writeln!(md, "| - | - | - | - |")?;
    for p in run.effective() {
        writeln!(md, "| {} | {:.3} | {:.3} | {:.3} |", p.date, p.speed, p.energy, p.mass)?;
    }

    Ok(())
}
