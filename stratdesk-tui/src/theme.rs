//! Style tokens for the terminal chrome. Chart content itself is plain
//! text; only the frame, cursors, and status levels are colored.

use ratatui::style::{Color, Modifier, Style};

pub fn accent() -> Style {
    Style::default().fg(Color::Cyan)
}

pub fn positive() -> Style {
    Style::default().fg(Color::Green)
}

pub fn negative() -> Style {
    Style::default().fg(Color::Red)
}

pub fn warning() -> Style {
    Style::default().fg(Color::Yellow)
}

pub fn neutral() -> Style {
    Style::default().fg(Color::Magenta)
}

pub fn muted() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn text() -> Style {
    Style::default().fg(Color::White)
}

pub fn selected() -> Style {
    accent().add_modifier(Modifier::REVERSED)
}

pub fn editing() -> Style {
    warning().add_modifier(Modifier::REVERSED)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent().add_modifier(Modifier::BOLD)
    } else {
        muted()
    }
}

pub fn pnl(value: f64) -> Style {
    if value >= 0.0 {
        positive()
    } else {
        negative()
    }
}
