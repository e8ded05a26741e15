//! Page 4 — Help: keyboard reference.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;

const SECTIONS: [(&str, &[(&str, &str)]); 4] = [
    (
        "Global",
        &[
            ("1/2/3/4", "switch page"),
            ("Tab / Shift-Tab", "next / previous page"),
            ("e", "error history"),
            ("q", "quit"),
        ],
    ),
    (
        "Selection rows",
        &[
            ("j/k", "move cursor"),
            ("h/l", "cycle or nudge the value"),
            ("Enter", "type an exact value (Esc cancels)"),
        ],
    ),
    (
        "Dashboard",
        &[
            ("r", "load chart"),
            ("t", "auto-tune parameters"),
            ("b", "send selection to Backtest"),
            ("o", "send selection to Optimize"),
        ],
    ),
    (
        "Backtest / Optimize",
        &[
            ("r", "run backtest"),
            ("x / v", "export trades / equity CSV"),
            ("s", "start optimization"),
            ("c", "cancel the running job"),
            ("d", "download results CSV"),
            ("[ / ]", "scroll tables"),
        ],
    ),
];

pub fn render(f: &mut Frame, area: Rect, _app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();
    for (title, entries) in SECTIONS {
        lines.push(Line::from(Span::styled(title, theme::accent())));
        for (keys, what) in entries {
            lines.push(Line::from(vec![
                Span::styled(format!("  {keys:>16}  "), theme::text()),
                Span::styled(*what, theme::muted()),
            ]));
        }
        lines.push(Line::from(""));
    }
    f.render_widget(Paragraph::new(lines), area);
}
