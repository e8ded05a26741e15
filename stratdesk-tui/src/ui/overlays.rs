//! Overlays rendered above the active page.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;
use crate::ui::centered_rect;

pub fn render_error_history(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(70, 60, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::warning())
        .title(" Errors — [j/k]scroll [Esc]close ");
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    if app.error_history.is_empty() {
        f.render_widget(
            Paragraph::new(Line::from(Span::styled("no errors yet", theme::muted()))),
            inner,
        );
        return;
    }

    let visible = inner.height as usize;
    let lines: Vec<Line> = app
        .error_history
        .iter()
        .skip(app.error_scroll)
        .take(visible)
        .map(|record| {
            Line::from(vec![
                Span::styled(
                    format!("{} ", record.timestamp.format("%H:%M:%S")),
                    theme::muted(),
                ),
                Span::styled(format!("[{}] ", record.category.label()), theme::warning()),
                Span::styled(record.message.clone(), theme::text()),
                Span::styled(
                    if record.context.is_empty() {
                        String::new()
                    } else {
                        format!("  ({})", record.context)
                    },
                    theme::muted(),
                ),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}
