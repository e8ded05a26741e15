//! Top-level UI layout — page tabs, active page, status bar, overlays.

pub mod backtest_panel;
pub mod dashboard_panel;
pub mod help_panel;
pub mod optimize_panel;
pub mod overlays;
pub mod param_form;
pub mod status_bar;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, Overlay, Page};
use crate::theme;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_tabs(f, chunks[0], app);
    render_page(f, chunks[1], app);
    status_bar::render(f, chunks[2], app);

    if app.overlay == Overlay::ErrorHistory {
        overlays::render_error_history(f, chunks[1], app);
    }
}

fn render_tabs(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans: Vec<Span> = Vec::new();
    for page in [Page::Dashboard, Page::Backtest, Page::Optimize, Page::Help] {
        let label = format!(" {}:{} ", page.index() + 1, page.label());
        if page == app.active_page {
            spans.push(Span::styled(label, theme::selected()));
        } else {
            spans.push(Span::styled(label, theme::muted()));
        }
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_page(f: &mut Frame, area: Rect, app: &AppState) {
    let page = app.active_page;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(format!(" {} ", page.label()))
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    match page {
        Page::Dashboard => dashboard_panel::render(f, inner, app),
        Page::Backtest => backtest_panel::render(f, inner, app),
        Page::Optimize => optimize_panel::render(f, inner, app),
        Page::Help => help_panel::render(f, inner, app),
    }
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
