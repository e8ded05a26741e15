//! Page 3 — Optimize: range form on the left; job status, best result,
//! and the ranked results table on the right.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Gauge, Paragraph};
use ratatui::Frame;

use serde_json::Value;
use stratdesk_core::api::types::OptimizationRun;
use stratdesk_runner::job::JobPhase;

use crate::app::AppState;
use crate::theme;
use crate::ui::param_form;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(48), Constraint::Min(20)])
        .split(area);

    render_selection(f, columns[0], app);
    render_job(f, columns[1], app);
}

fn render_selection(f: &mut Frame, area: Rect, app: &AppState) {
    let job = &app.optimize.job;
    let hint = if job.is_live() {
        "[c]cancel — job running"
    } else {
        "[j/k]row [h/l]adjust [Enter]edit ranges [s]start [d]download"
    };
    let mut lines = vec![Line::from(Span::styled(hint, theme::muted()))];
    lines.push(Line::from(""));
    lines.extend(param_form::selection_lines(&app.optimize.sel, &app.catalog));
    f.render_widget(Paragraph::new(lines), area);
}

fn render_job(f: &mut Frame, area: Rect, app: &AppState) {
    let job = &app.optimize.job;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(4),
        ])
        .split(area);

    // Status + progress gauge.
    let status_line = match (&job.job_id, job.phase) {
        (None, JobPhase::Idle) => "no job started".to_string(),
        (Some(id), phase) => format!("job {id} — {}", phase.label()),
        (None, phase) => phase.label().to_string(),
    };
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(status_line, phase_style(job.phase)),
            Span::styled(
                job.message
                    .as_ref()
                    .map(|m| format!("  {m}"))
                    .unwrap_or_default(),
                theme::muted(),
            ),
        ])),
        rows[0],
    );
    if job.is_live() {
        let gauge = Gauge::default()
            .ratio((job.progress / 100.0).clamp(0.0, 1.0))
            .label(format!("{:.0}%", job.progress))
            .gauge_style(theme::accent());
        let gauge_area = Rect {
            y: rows[0].y + 1,
            height: 1,
            ..rows[0]
        };
        f.render_widget(gauge, gauge_area);
    }

    // Best result.
    let mut best_lines: Vec<Line> = Vec::new();
    match job.results.as_ref().and_then(|r| r.best_result.as_ref()) {
        Some(best) if job.results.as_ref().is_some_and(|r| r.has_results()) => {
            best_lines.push(Line::from(Span::styled(
                format!("Best by {}", app.optimize.sel.ctx.metric_to_optimize),
                theme::accent(),
            )));
            best_lines.push(params_line(best));
            best_lines.push(metrics_line(best));
            if job.download_ready() {
                let note = match &job.download_path {
                    Some(path) => format!("saved: {}", path.display()),
                    None => "[d] download results CSV".into(),
                };
                best_lines.push(Line::from(Span::styled(note, theme::positive())));
            }
        }
        _ => {
            if job.phase == JobPhase::Completed {
                best_lines.push(Line::from(Span::styled(
                    "optimization produced no results",
                    theme::warning(),
                )));
            }
        }
    }
    f.render_widget(Paragraph::new(best_lines), rows[1]);

    // Ranked table (config toggle).
    if app.config.show_results_table {
        render_table(f, rows[2], app);
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(results) = &app.optimize.job.results else {
        return;
    };
    if results.results.is_empty() {
        return;
    }

    let mut lines = vec![Line::from(Span::styled(
        format!("Runs ({}) — [ and ] scroll", results.results.len()),
        theme::accent(),
    ))];
    let visible = (area.height as usize).saturating_sub(1);
    let start = app.optimize.job.table_scroll.min(results.results.len());
    for (i, run) in results.results.iter().enumerate().skip(start).take(visible) {
        let mut spans = vec![Span::styled(format!("{:>3}. ", i + 1), theme::muted())];
        if let Some(err) = &run.error_message {
            spans.push(Span::styled(format!("error: {err}"), theme::negative()));
        } else {
            spans.extend(params_line(run).spans);
            spans.push(Span::raw("  "));
            spans.extend(metrics_line(run).spans);
        }
        lines.push(Line::from(spans));
    }
    f.render_widget(Paragraph::new(lines), area);
}

fn params_line(run: &OptimizationRun) -> Line<'static> {
    let text = run
        .parameters
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ");
    Line::from(Span::styled(text, theme::text()))
}

fn metrics_line(run: &OptimizationRun) -> Line<'static> {
    let spans: Vec<Span> = run
        .performance_metrics
        .iter()
        .map(|(k, v)| {
            let style = match v {
                Value::Number(n) if k.contains("pnl") || k.contains("profit") => {
                    theme::pnl(n.as_f64().unwrap_or(0.0))
                }
                _ => theme::muted(),
            };
            Span::styled(format!("{k}={} ", compact(v)), style)
        })
        .collect();
    Line::from(spans)
}

fn compact(value: &Value) -> String {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(|f| format!("{f:.2}"))
            .unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn phase_style(phase: JobPhase) -> ratatui::style::Style {
    match phase {
        JobPhase::Completed => theme::positive(),
        JobPhase::Failed | JobPhase::Error => theme::negative(),
        JobPhase::Cancelled => theme::warning(),
        JobPhase::Submitting | JobPhase::Polling => theme::accent(),
        JobPhase::Idle => theme::muted(),
    }
}
