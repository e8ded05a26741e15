//! Page 2 — Backtest: selection on the left; metrics, equity curve, and
//! trade tape on the right.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use serde_json::Value;
use stratdesk_core::api::types::TradeRow;

use crate::app::AppState;
use crate::theme;
use crate::ui::param_form;

/// Columns preferred for the trade tape, in display order; anything else
/// the server sends is ignored here (the CSV export keeps every column).
const TRADE_COLUMNS: [&str; 8] = [
    "entry_date",
    "entry_price",
    "exit_date",
    "exit_price",
    "side",
    "quantity",
    "pnl",
    "net_pnl",
];

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(20)])
        .split(area);

    render_selection(f, columns[0], app);
    render_results(f, columns[1], app);
}

fn render_selection(f: &mut Frame, area: Rect, app: &AppState) {
    let mut lines = vec![Line::from(Span::styled(
        "[j/k]row [h/l]adjust [Enter]edit [r]run [x]trades csv [v]equity csv",
        theme::muted(),
    ))];
    lines.push(Line::from(""));
    lines.extend(param_form::selection_lines(&app.backtest.sel, &app.catalog));

    if app.backtest.running {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("backtest running…", theme::accent())));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn render_results(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(report) = &app.backtest.report else {
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "No backtest yet. Press [r] to run the current selection.",
                theme::muted(),
            ))),
            area,
        );
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Min(6),
            Constraint::Length(8),
        ])
        .split(area);

    // Metrics.
    let mut metric_lines = vec![Line::from(Span::styled("Performance", theme::accent()))];
    if let Some(metrics) = &report.performance_metrics {
        let mut spans: Vec<Span> = Vec::new();
        for (i, (name, value)) in metrics.iter().enumerate() {
            if i > 0 && i % 3 == 0 {
                metric_lines.push(Line::from(std::mem::take(&mut spans)));
            }
            spans.push(Span::styled(format!("{name}: "), theme::muted()));
            spans.push(Span::styled(format!("{} ", fmt_value(value)), metric_style(name, value)));
        }
        if !spans.is_empty() {
            metric_lines.push(Line::from(spans));
        }
    } else {
        metric_lines.push(Line::from(Span::styled("no metrics returned", theme::muted())));
    }
    f.render_widget(Paragraph::new(metric_lines), rows[0]);

    // Equity curve.
    render_equity(f, rows[1], app);

    // Trade tape.
    render_trades(f, rows[2], app, report.trades.as_deref().unwrap_or(&[]));
}

fn render_equity(f: &mut Frame, area: Rect, app: &AppState) {
    let curve = &app.backtest.equity;
    if curve.is_empty() {
        f.render_widget(
            Paragraph::new(Line::from(Span::styled("no equity curve", theme::muted()))),
            area,
        );
        return;
    }

    let data: Vec<(f64, f64)> = curve
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.value))
        .collect();
    let y_min = data.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let y_max = data.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
    let padding = (y_max - y_min).abs() * 0.05;
    let (y_min, y_max) = (y_min - padding, y_max + padding);

    let dataset = Dataset::default()
        .name("equity")
        .marker(symbols::Marker::Braille)
        .style(theme::positive())
        .graph_type(GraphType::Line)
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .x_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([0.0, (data.len().saturating_sub(1) as f64).max(1.0)]),
        )
        .y_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::styled(format!("{y_min:.0}"), theme::muted()),
                    Span::styled(format!("{y_max:.0}"), theme::muted()),
                ]),
        );
    f.render_widget(chart, area);
}

fn render_trades(f: &mut Frame, area: Rect, app: &AppState, trades: &[TradeRow]) {
    let mut lines = vec![Line::from(Span::styled(
        format!("Trades ({}) — [ and ] scroll", trades.len()),
        theme::accent(),
    ))];

    let visible = (area.height as usize).saturating_sub(1);
    let start = app.backtest.trades_scroll.min(trades.len());
    for trade in trades.iter().skip(start).take(visible) {
        let mut spans: Vec<Span> = Vec::new();
        for col in TRADE_COLUMNS {
            if let Some(value) = trade.get(col) {
                spans.push(Span::styled(format!("{col}="), theme::muted()));
                let style = if col.contains("pnl") {
                    theme::pnl(value.as_f64().unwrap_or(0.0))
                } else {
                    theme::text()
                };
                spans.push(Span::styled(format!("{} ", fmt_value(value)), style));
            }
        }
        if spans.is_empty() {
            // Unrecognized schema; dump the raw row.
            spans.push(Span::styled(
                serde_json::to_string(trade).unwrap_or_default(),
                theme::text(),
            ));
        }
        lines.push(Line::from(spans));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn fmt_value(value: &Value) -> String {
    match value {
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 {
                    format!("{f:.0}")
                } else {
                    format!("{f:.2}")
                }
            } else {
                n.to_string()
            }
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn metric_style(name: &str, value: &Value) -> ratatui::style::Style {
    if name.contains("pnl") || name.contains("return") || name.contains("profit") {
        theme::pnl(value.as_f64().unwrap_or(0.0))
    } else {
        theme::text()
    }
}
