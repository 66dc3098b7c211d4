//! Ratatui-based terminal UI.
//!
//! The TUI polls the measurement source in the background and shows KPIs, a
//! multi-metric line chart and weekly averages for the selected metric. A
//! settings panel switches the metric and the date range. Changing either
//! recomputes from the last fetched rows; a changed query also re-fetches.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, List, ListItem, Paragraph},
};
use tracing::info;

use crate::app::pipeline::{RunOutput, recompute_on};
use crate::data::{MeasurementSource, source_from_config};
use crate::domain::{CanonicalPoint, DATE_FMT, DashConfig, MetricKey, RangeSelection};
use crate::error::AppError;
use crate::io::normalize::{NormalizeReport, normalize_all_with_report};
use crate::poll::{PollEvent, Poller};
use crate::report::fmt_signed;

mod plotters_chart;

use plotters_chart::{ChartLine, MetricLineChart};

const TICK: Duration = Duration::from_millis(100);
const FIELD_COUNT: usize = 4;

/// Start the TUI.
pub fn run(config: DashConfig) -> Result<(), AppError> {
    let source: Arc<dyn MeasurementSource> = Arc::from(source_from_config(&config)?);
    let mut app = App::new(config, source);
    info!(source = %app.source_label, "starting TUI");

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateField {
    Start,
    End,
}

struct App {
    config: DashConfig,
    poller: Poller,
    source_label: String,
    /// Last good fetch, normalized. Kept across failed polls.
    points: Vec<CanonicalPoint>,
    normalize: NormalizeReport,
    run: Option<RunOutput>,
    last_update: Option<DateTime<Local>>,
    last_error: Option<String>,
    selected_field: usize,
    editing: Option<DateField>,
    date_input: String,
    status: String,
}

impl App {
    fn new(config: DashConfig, source: Arc<dyn MeasurementSource>) -> Self {
        let source_label = source.describe();
        let poller = Poller::new(source, config.poll_interval);
        Self {
            config,
            poller,
            source_label,
            points: Vec::new(),
            normalize: NormalizeReport::default(),
            run: None,
            last_update: None,
            last_error: None,
            selected_field: 0,
            editing: None,
            date_input: String::new(),
            status: "Fetching measurements...".to_string(),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            let now = Instant::now();
            if self.poller.is_due(now) && !self.poller.is_loading() {
                self.poller.start(self.config.query(), now);
                needs_redraw = true;
            }
            if let Some(event) = self.poller.drain() {
                self.apply_poll(event);
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(TICK).map_err(|e| AppError::runtime(format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn apply_poll(&mut self, event: PollEvent) {
        match event {
            PollEvent::Rows(rows) => {
                let (points, report) = normalize_all_with_report(&rows);
                self.points = points;
                self.normalize = report;
                self.last_update = Some(Local::now());
                self.last_error = None;
                self.recompute();
                self.status = format!("Loaded {} points.", self.points.len());
            }
            // Keep the last good data on screen.
            PollEvent::Failed(err) => {
                self.last_error = Some(err.message().to_string());
            }
        }
    }

    fn recompute(&mut self) {
        if self.last_update.is_none() {
            return;
        }
        let today = Utc::now().date_naive();
        self.run = Some(recompute_on(
            self.points.clone(),
            self.normalize,
            self.config.metric,
            self.config.range,
            today,
        ));
    }

    /// Apply a new range; re-fetch only when the server query changes.
    fn set_range(&mut self, range: RangeSelection) {
        let old_query = self.config.query();
        self.config.range = range;
        self.recompute();
        let query = self.config.query();
        if query != old_query {
            self.poller.restart(query, Instant::now());
        }
        self.status = format!("range: {}", range.label());
    }

    /// Returns true when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing.is_some() {
            self.handle_date_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < FIELD_COUNT {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter => {
                let field = match self.selected_field {
                    2 => Some(DateField::Start),
                    3 => Some(DateField::End),
                    _ => None,
                };
                if let Some(field) = field {
                    self.date_input = self
                        .custom_bound(field)
                        .map(|d| d.format(DATE_FMT).to_string())
                        .unwrap_or_default();
                    self.editing = Some(field);
                    self.status = "Editing date (YYYY-MM-DD). Enter to apply, Esc to cancel.".to_string();
                }
            }
            KeyCode::Char('r') => {
                self.poller.start(self.config.query(), Instant::now());
                self.status = "Refreshing...".to_string();
            }
            KeyCode::Char('d') => {
                self.status = match &self.run {
                    Some(run) => match crate::debug::write_debug_bundle(run, &self.config, &self.source_label) {
                        Ok(path) => format!("Wrote debug bundle: {}", path.display()),
                        Err(err) => format!("Debug write failed: {err}"),
                    },
                    None => "No data loaded yet.".to_string(),
                };
            }
            _ => {}
        }

        false
    }

    fn handle_date_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing = None;
                self.status = "Date edit canceled.".to_string();
            }
            KeyCode::Enter => {
                if let Some(field) = self.editing.take() {
                    self.apply_date_input(field);
                }
            }
            KeyCode::Backspace => {
                self.date_input.pop();
            }
            KeyCode::Char(c) => {
                if (c.is_ascii_digit() || c == '-') && self.date_input.len() < 10 {
                    self.date_input.push(c);
                }
            }
            _ => {}
        }
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.selected_field {
            0 => {
                self.config.metric = if delta >= 0 {
                    self.config.metric.next()
                } else {
                    self.config.metric.prev()
                };
                self.recompute();
                self.status = format!("metric: {}", self.config.metric.meta().label);
            }
            1 => {
                let range = if delta >= 0 {
                    self.config.range.next_preset()
                } else {
                    self.config.range.prev_preset()
                };
                self.set_range(range);
            }
            2 => self.shift_bound(DateField::Start, delta),
            3 => self.shift_bound(DateField::End, delta),
            _ => {}
        }
    }

    fn custom_bound(&self, field: DateField) -> Option<NaiveDate> {
        match self.config.range {
            RangeSelection::Custom { start, end } => match field {
                DateField::Start => start,
                DateField::End => end,
            },
            RangeSelection::Preset { .. } => None,
        }
    }

    fn set_bound(&mut self, field: DateField, value: Option<NaiveDate>) {
        let (mut start, mut end) = match self.config.range {
            RangeSelection::Custom { start, end } => (start, end),
            RangeSelection::Preset { .. } => (None, None),
        };
        match field {
            DateField::Start => start = value,
            DateField::End => end = value,
        }
        self.set_range(RangeSelection::Custom { start, end });
    }

    /// Move a custom bound by one day; an unset bound starts from the data's extent.
    fn shift_bound(&mut self, field: DateField, delta: i32) {
        let base = self.custom_bound(field).or_else(|| {
            let days = self.points.iter().filter_map(|p| p.day());
            match field {
                DateField::Start => days.min(),
                DateField::End => days.max(),
            }
        });
        let base = base.unwrap_or_else(|| Utc::now().date_naive());
        let shifted = if delta >= 0 {
            base.checked_add_days(Days::new(1))
        } else {
            base.checked_sub_days(Days::new(1))
        };
        if let Some(day) = shifted {
            self.set_bound(field, Some(day));
        }
    }

    fn apply_date_input(&mut self, field: DateField) {
        let trimmed = self.date_input.trim().to_string();
        if trimmed.is_empty() {
            self.set_bound(field, None);
            return;
        }
        match NaiveDate::parse_from_str(&trimmed, DATE_FMT) {
            Ok(day) => self.set_bound(field, Some(day)),
            Err(e) => self.status = format!("Invalid date '{trimmed}': {e}"),
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_kpis(frame, chunks[1]);
        self.draw_body(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let meta = self.config.metric.meta();
        let mut lines: Vec<Line> = Vec::new();

        let state = if self.poller.is_loading() {
            Span::styled("loading...", Style::default().fg(Color::Yellow))
        } else {
            let updated = self
                .last_update
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            Span::styled(format!("updated {updated}"), Style::default().fg(Color::Gray))
        };
        lines.push(Line::from(vec![
            Span::styled("dash", Style::default().fg(Color::Cyan)),
            Span::raw(" - train measurements | "),
            state,
        ]));

        lines.push(Line::from(Span::styled(
            format!(
                "source: {} | train: {} | metric: {} ({}) | range: {}",
                self.source_label,
                self.config.train_id.as_deref().unwrap_or("all"),
                meta.label,
                meta.unit,
                self.config.range.label(),
            ),
            Style::default().fg(Color::Gray),
        )));

        if let Some(err) = &self.last_error {
            lines.push(Line::from(Span::styled(
                format!("error: {err}"),
                Style::default().fg(Color::Red),
            )));
        } else if let Some(run) = &self.run {
            let mut status = crate::report::format_data_status(run);
            if run.is_fallback() {
                status.push_str(" | no data in range, showing all points");
            }
            lines.push(Line::from(Span::styled(status, Style::default().fg(Color::Gray))));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_kpis(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
            .split(area);

        let meta = self.config.metric.meta();
        let (current, average, variation) = match &self.run {
            Some(run) => (
                format!("{:.1} {}", run.kpis.current, meta.unit),
                format!("{:.1} {}", run.kpis.average, meta.unit),
                format!("{} %", fmt_signed(run.kpis.variation_pct)),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };

        let color = metric_color(self.config.metric);
        for (rect, (title, value)) in cols
            .iter()
            .zip([("Current", current), ("Average", average), ("Variation", variation)])
        {
            let p = Paragraph::new(Line::from(Span::styled(
                value,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )))
            .block(Block::default().title(title).borders(Borders::ALL));
            frame.render_widget(p, *rect);
        }
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(6)])
            .split(area);
        let charts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[0]);

        self.draw_line_chart(frame, charts[0]);
        self.draw_weekly(frame, charts[1]);
        self.draw_settings(frame, rows[1]);
    }

    fn draw_line_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut title = vec![Span::raw("Measurements ")];
        if let Some(run) = &self.run {
            for (key, avg) in &run.series_means {
                let meta = key.meta();
                title.push(Span::styled(
                    format!(" ■ {} {:.0} {}", meta.label, avg, meta.unit),
                    Style::default().fg(metric_color(*key)),
                ));
            }
        }
        let block = Block::default().title(Line::from(title)).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(run) = &self.run else {
            let msg = Paragraph::new("Waiting for data...").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let (lines, x_bounds, y_bounds) = chart_lines(run.effective());
        if lines.iter().all(|l| l.points.is_empty()) {
            frame.render_widget(Paragraph::new("No dated points to plot."), inner);
            return;
        }

        let widget = MetricLineChart {
            lines: &lines,
            x_bounds,
            y_bounds,
            fmt_x: fmt_axis_day,
            fmt_y: fmt_axis_value,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_weekly(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let meta = self.config.metric.meta();
        let mut title = format!("Weekly avg - {} ({})", meta.label, meta.unit);
        if let Some(run) = &self.run {
            let s = &run.weekly_summary;
            title.push_str(&format!(" | {:.0} - {:.0} | sd {:.1}", s.min, s.max, s.std_dev));
        }
        let block = Block::default().title(title).borders(Borders::ALL);

        let Some(run) = self.run.as_ref().filter(|r| !r.weekly.is_empty()) else {
            frame.render_widget(Paragraph::new("No weekly data.").block(block), area);
            return;
        };

        let inner = block.inner(area);
        // Newest weeks win when the panel is too narrow for every bar.
        let max_bars = usize::from(inner.width / 4).max(1);
        let shown = &run.weekly[run.weekly.len().saturating_sub(max_bars)..];
        let bar_width = (inner.width / shown.len().max(1) as u16).saturating_sub(1).clamp(3, 10);

        let bars: Vec<Bar> = shown
            .iter()
            .map(|b| {
                Bar::default()
                    .value(b.value.max(0.0).round() as u64)
                    .text_value(format!("{:.0}", b.value))
                    .label(Line::from(short_week(&b.week)))
            })
            .collect();

        let chart = BarChart::default()
            .block(block)
            .data(BarGroup::default().bars(&bars))
            .bar_width(bar_width)
            .bar_gap(1)
            .bar_style(Style::default().fg(metric_color(self.config.metric)))
            .value_style(Style::default().fg(Color::Black).bg(metric_color(self.config.metric)));
        frame.render_widget(chart, area);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let meta = self.config.metric.meta();
        let bound_label = |field: DateField| -> String {
            if self.editing == Some(field) {
                return format!("{}_", self.date_input);
            }
            match (self.config.range.is_custom(), self.custom_bound(field)) {
                (false, _) => "(preset)".to_string(),
                (true, Some(day)) => day.format(DATE_FMT).to_string(),
                (true, None) => "(data extent)".to_string(),
            }
        };

        let items = vec![
            ListItem::new(format!("Metric: {} ({})", meta.label, meta.unit)),
            ListItem::new(format!("Range: {}", self.config.range.label())),
            ListItem::new(format!("From: {}", bound_label(DateField::Start))),
            ListItem::new(format!("To: {}", bound_label(DateField::End))),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  Enter edit date  r refresh  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn metric_color(metric: MetricKey) -> Color {
    let (r, g, b) = metric.meta().rgb();
    Color::Rgb(r, g, b)
}

/// One line per metric with x = days since the common era. Undated points are skipped.
fn chart_lines(points: &[CanonicalPoint]) -> (Vec<ChartLine>, [f64; 2], [f64; 2]) {
    let dated: Vec<(f64, &CanonicalPoint)> = points
        .iter()
        .filter_map(|p| p.day().map(|d| (f64::from(d.num_days_from_ce()), p)))
        .collect();

    let lines: Vec<ChartLine> = MetricKey::ALL
        .iter()
        .map(|&key| ChartLine {
            color: key.meta().rgb(),
            points: dated.iter().map(|(x, p)| (*x, p.value(key))).collect(),
        })
        .collect();

    let (mut x0, mut x1) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y0, mut y1) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in lines.iter().flat_map(|l| l.points.iter()) {
        x0 = x0.min(x);
        x1 = x1.max(x);
        y0 = y0.min(y);
        y1 = y1.max(y);
    }

    if !x0.is_finite() || !x1.is_finite() {
        (x0, x1) = (0.0, 1.0);
    } else if x1 <= x0 {
        (x0, x1) = (x0 - 1.0, x1 + 1.0);
    }
    if !y0.is_finite() || !y1.is_finite() || y1 <= y0 {
        let mid = if y0.is_finite() { y0 } else { 0.0 };
        (y0, y1) = (mid - 1.0, mid + 1.0);
    }
    let pad = (y1 - y0) * 0.05;

    (lines, [x0, x1], [y0 - pad, y1 + pad])
}

fn short_week(week: &str) -> String {
    // `YYYY-MM-DD` -> `MM-DD`; malformed keys are shown as-is.
    week.get(5..10).filter(|_| week.len() == 10).unwrap_or(week).to_string()
}

fn fmt_axis_day(v: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%m-%d").to_string())
        .unwrap_or_default()
}

fn fmt_axis_value(v: f64) -> String {
    if v.abs() >= 10_000.0 {
        format!("{:.0}k", v / 1000.0)
    } else {
        format!("{v:.0}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SampleSource;
    use crate::domain::{RawRow, SourceKind};
    use serde_json::json;

    fn point(date: &str, speed: f64, energy: f64, mass: f64) -> CanonicalPoint {
        CanonicalPoint {
            date: date.to_string(),
            speed,
            energy,
            mass,
        }
    }

    fn app() -> App {
        let config = DashConfig {
            source: SourceKind::Sample { seed: 1, days: 30 },
            train_id: None,
            metric: MetricKey::Speed,
            range: RangeSelection::Preset { days: 30 },
            poll_interval: Duration::from_secs(10),
            export_points: None,
            export_weekly: None,
            log_file: None,
        };
        App::new(config, Arc::new(SampleSource::new(1, 30)))
    }

    fn rows(values: &[serde_json::Value]) -> Vec<RawRow> {
        values.iter().map(|v| serde_json::from_value(v.clone()).unwrap()).collect()
    }

    #[test]
    fn chart_lines_use_day_numbers_and_pad_y() {
        let points = vec![
            point("2024-01-01", 10.0, 0.0, 100.0),
            point("2024-01-03", 20.0, 5.0, 0.0),
            point("garbage", 1e9, 1e9, 1e9),
        ];
        let (lines, x, y) = chart_lines(&points);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.points.len() == 2));

        let jan1 = f64::from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().num_days_from_ce());
        assert_eq!(x, [jan1, jan1 + 2.0]);
        assert!(y[0] < 0.0 && y[1] > 100.0);
        assert_eq!(fmt_axis_day(jan1), "01-01");
    }

    #[test]
    fn chart_lines_handle_single_and_empty_inputs() {
        let (_, x, y) = chart_lines(&[point("2024-01-01", 5.0, 5.0, 5.0)]);
        assert!(x[1] > x[0]);
        assert!(y[1] > y[0]);

        let (lines, x, y) = chart_lines(&[]);
        assert!(lines.iter().all(|l| l.points.is_empty()));
        assert_eq!(x, [0.0, 1.0]);
        assert!(y[1] > y[0]);
    }

    #[test]
    fn failed_poll_keeps_last_good_data() {
        let mut app = app();
        let today = Utc::now().date_naive().format(DATE_FMT).to_string();
        app.apply_poll(PollEvent::Rows(rows(&[json!({"date": today, "speed": 50})])));
        assert_eq!(app.run.as_ref().unwrap().kpis.current, 50.0);

        app.apply_poll(PollEvent::Failed(AppError::runtime("HTTP 500 Internal Server Error")));
        assert_eq!(app.last_error.as_deref(), Some("HTTP 500 Internal Server Error"));
        assert_eq!(app.run.as_ref().unwrap().kpis.current, 50.0);
        assert_eq!(app.points.len(), 1);
    }

    #[test]
    fn metric_and_range_keys_recompute() {
        let mut app = app();
        let today = Utc::now().date_naive().format(DATE_FMT).to_string();
        app.apply_poll(PollEvent::Rows(rows(&[json!({"date": today, "speed": 50, "energy_kwh": 7})])));

        app.handle_key(KeyCode::Right);
        assert_eq!(app.config.metric, MetricKey::Energy);
        assert_eq!(app.run.as_ref().unwrap().kpis.current, 7.0);

        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.config.range, RangeSelection::Preset { days: 90 });
        app.handle_key(KeyCode::Left);
        app.handle_key(KeyCode::Left);
        assert_eq!(app.config.range, RangeSelection::Preset { days: 7 });
        assert_eq!(app.run.as_ref().unwrap().range, RangeSelection::Preset { days: 7 });
    }

    #[test]
    fn date_edit_sets_custom_bounds() {
        let mut app = app();
        app.selected_field = 2;
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.editing, Some(DateField::Start));
        for c in "2024-01-02".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        // Input is capped at a full date.
        app.handle_key(KeyCode::Char('9'));
        app.handle_key(KeyCode::Enter);

        assert_eq!(app.editing, None);
        assert_eq!(
            app.config.range,
            RangeSelection::Custom {
                start: NaiveDate::from_ymd_opt(2024, 1, 2),
                end: None,
            }
        );

        // An invalid date leaves the range untouched.
        app.selected_field = 3;
        app.handle_key(KeyCode::Enter);
        for c in "2024-13-40".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        app.handle_key(KeyCode::Enter);
        assert!(app.status.starts_with("Invalid date"));
        assert_eq!(
            app.config.range,
            RangeSelection::Custom {
                start: NaiveDate::from_ymd_opt(2024, 1, 2),
                end: None,
            }
        );
    }

    #[test]
    fn shifting_an_unset_bound_starts_from_the_data() {
        let mut app = app();
        app.points = vec![point("2024-03-10", 1.0, 1.0, 1.0), point("2024-03-20", 1.0, 1.0, 1.0)];
        app.selected_field = 3;
        app.handle_key(KeyCode::Left);
        assert_eq!(
            app.config.range,
            RangeSelection::Custom {
                start: None,
                end: NaiveDate::from_ymd_opt(2024, 3, 19),
            }
        );
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        assert!(!app.handle_key(KeyCode::Char('x')));
        assert!(app.handle_key(KeyCode::Char('q')));
        assert!(app.handle_key(KeyCode::Esc));
    }

    #[test]
    fn short_week_labels() {
        assert_eq!(short_week("2024-01-08"), "01-08");
        assert_eq!(short_week("garbage"), "garbage");
    }

    #[test]
    fn axis_values_abbreviate_thousands() {
        assert_eq!(fmt_axis_value(420_000.0), "420k");
        assert_eq!(fmt_axis_value(82.4), "82");
    }
}
