//! Page 1 — Dashboard: selection rows on the left, price chart on the
//! right with indicator overlays and trade-marker summary.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;
use crate::ui::param_form;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(20)])
        .split(area);

    render_selection(f, columns[0], app);
    render_chart(f, columns[1], app);
}

fn render_selection(f: &mut Frame, area: Rect, app: &AppState) {
    let mut lines = vec![Line::from(Span::styled(
        "[j/k]row [h/l]adjust [Enter]edit [r]chart [t]tune [b/o]send",
        theme::muted(),
    ))];
    lines.push(Line::from(""));
    lines.extend(param_form::selection_lines(&app.dashboard.sel, &app.catalog));

    lines.push(Line::from(""));
    if app.dashboard.auto_tune_running {
        lines.push(Line::from(Span::styled(
            "auto-tune running…",
            theme::warning(),
        )));
    } else if app.dashboard.chart_loading {
        lines.push(Line::from(Span::styled("loading chart…", theme::accent())));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn render_chart(f: &mut Frame, area: Rect, app: &AppState) {
    let chart_area = &app.dashboard.chart;
    if chart_area.is_empty() {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "No chart loaded. Pick a symbol and press [r].",
                theme::muted(),
            )),
        ];
        f.render_widget(Paragraph::new(lines), area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    // Header line.
    let header = chart_area
        .header
        .clone()
        .unwrap_or_else(|| format!("{} · {} bars", app.dashboard.sel.ctx.symbol, chart_area.candles.len()));
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(header, theme::accent()))),
        rows[0],
    );

    // Close line plus indicator overlays.
    let closes: Vec<(f64, f64)> = chart_area
        .candles
        .iter()
        .enumerate()
        .map(|(i, bar)| (i as f64, bar.close))
        .collect();

    let indicator_data: Vec<(String, Vec<(f64, f64)>)> = chart_area
        .indicators
        .iter()
        .map(|(name, points)| {
            // Index indicator points by position; times already align with
            // the bar series from the same response.
            let data = points
                .iter()
                .enumerate()
                .map(|(i, p)| (i as f64, p.value))
                .collect();
            (name.clone(), data)
        })
        .collect();

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for (_, v) in closes.iter() {
        y_min = y_min.min(*v);
        y_max = y_max.max(*v);
    }
    for (_, data) in &indicator_data {
        for (_, v) in data {
            y_min = y_min.min(*v);
            y_max = y_max.max(*v);
        }
    }
    let padding = (y_max - y_min).abs() * 0.05;
    let y_min = y_min - padding;
    let y_max = y_max + padding;

    let overlay_styles = [theme::warning(), theme::neutral(), theme::positive()];
    let mut datasets = vec![Dataset::default()
        .name(app.dashboard.sel.ctx.symbol.clone())
        .marker(symbols::Marker::Braille)
        .style(theme::accent())
        .graph_type(GraphType::Line)
        .data(&closes)];
    for (i, (name, data)) in indicator_data.iter().enumerate() {
        datasets.push(
            Dataset::default()
                .name(name.clone())
                .marker(symbols::Marker::Braille)
                .style(overlay_styles[i % overlay_styles.len()])
                .graph_type(GraphType::Line)
                .data(data),
        );
    }

    let x_max = closes.len().saturating_sub(1) as f64;
    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([0.0, x_max.max(1.0)])
                .labels(vec![
                    Span::styled(date_label(chart_area.candles.first().map(|b| b.time)), theme::muted()),
                    Span::styled(date_label(chart_area.candles.last().map(|b| b.time)), theme::muted()),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::styled(format!("{y_min:.1}"), theme::muted()),
                    Span::styled(format!("{y_max:.1}"), theme::muted()),
                ]),
        );
    f.render_widget(chart, rows[1]);

    // Marker/drop summary footer.
    let buys = chart_area
        .markers
        .iter()
        .filter(|m| m.label.to_ascii_uppercase().contains("BUY"))
        .count();
    let sells = chart_area.markers.len().saturating_sub(buys);
    let mut spans = vec![Span::styled(
        format!("markers: {} buy / {} sell", buys, sells),
        theme::muted(),
    )];
    if chart_area.dropped > 0 {
        spans.push(Span::styled(
            format!("  dropped points: {}", chart_area.dropped),
            theme::warning(),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), rows[2]);
}

fn date_label(time: Option<i64>) -> String {
    time.and_then(|t| chrono::DateTime::from_timestamp(t, 0))
        .map(|dt| dt.naive_utc().date().format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
