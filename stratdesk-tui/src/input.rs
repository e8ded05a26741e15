//! Keyboard input dispatch — overlays → edit session → global keys →
//! page-specific handlers.

use chrono::{Duration, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use stratdesk_core::forms::{FieldKind, FormMode};

use crate::app::{
    AppState, EditSession, ErrorCategory, FieldRow, Overlay, Page, EXCHANGES,
};
use crate::worker::WorkerCommand;

/// Handle one key event.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    if app.overlay == Overlay::ErrorHistory {
        handle_error_overlay(app, key);
        return;
    }

    // 2. An active edit session owns the keyboard.
    if app
        .active_sel_mut()
        .map(|sel| sel.edit.is_some())
        .unwrap_or(false)
    {
        handle_edit_key(app, key);
        return;
    }

    // 3. Global keys.
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('1') => {
            app.active_page = Page::Dashboard;
            return;
        }
        KeyCode::Char('2') => {
            app.active_page = Page::Backtest;
            return;
        }
        KeyCode::Char('3') => {
            app.active_page = Page::Optimize;
            return;
        }
        KeyCode::Char('4') | KeyCode::Char('?') => {
            app.active_page = Page::Help;
            return;
        }
        KeyCode::Tab => {
            app.active_page = app.active_page.next();
            return;
        }
        KeyCode::BackTab => {
            app.active_page = app.active_page.prev();
            return;
        }
        KeyCode::Char('e') => {
            app.overlay = Overlay::ErrorHistory;
            app.error_scroll = 0;
            return;
        }
        _ => {}
    }

    // 4. Page-specific keys.
    match app.active_page {
        Page::Dashboard => handle_dashboard_key(app, key),
        Page::Backtest => handle_backtest_key(app, key),
        Page::Optimize => handle_optimize_key(app, key),
        Page::Help => {}
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

// ─── Page handlers ──────────────────────────────────────────────────

fn handle_dashboard_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => {
            app.bump_generation();
            app.refresh_chart();
        }
        KeyCode::Char('t') => {
            app.bump_generation();
            app.start_auto_tune(true);
        }
        KeyCode::Char('b') => app.send_to_backtest(),
        KeyCode::Char('o') => app.send_to_optimize(),
        _ => handle_selection_key(app, key),
    }
}

fn handle_backtest_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => {
            app.bump_generation();
            app.run_backtest();
        }
        KeyCode::Char(']') => {
            let len = trades_len(app);
            if app.backtest.trades_scroll + 1 < len {
                app.backtest.trades_scroll += 1;
            }
        }
        KeyCode::Char('[') => {
            app.backtest.trades_scroll = app.backtest.trades_scroll.saturating_sub(1);
        }
        KeyCode::Char('x') => export_trades(app),
        KeyCode::Char('v') => export_equity(app),
        _ => handle_selection_key(app, key),
    }
}

fn handle_optimize_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('s') => app.start_optimization(),
        KeyCode::Char('c') => app.cancel_optimization(),
        KeyCode::Char('d') => app.download_results(),
        KeyCode::Char(']') => {
            let len = app
                .optimize
                .job
                .results
                .as_ref()
                .map(|r| r.results.len())
                .unwrap_or(0);
            if app.optimize.job.table_scroll + 1 < len {
                app.optimize.job.table_scroll += 1;
            }
        }
        KeyCode::Char('[') => {
            app.optimize.job.table_scroll = app.optimize.job.table_scroll.saturating_sub(1);
        }
        _ => handle_selection_key(app, key),
    }
}

fn trades_len(app: &AppState) -> usize {
    app.backtest
        .report
        .as_ref()
        .and_then(|r| r.trades.as_ref())
        .map(|t| t.len())
        .unwrap_or(0)
}

fn export_trades(app: &mut AppState) {
    let Some(trades) = app
        .backtest
        .report
        .as_ref()
        .and_then(|r| r.trades.clone())
    else {
        app.set_warning("no trades to export");
        return;
    };
    match stratdesk_runner::export::export_trades_csv(&trades) {
        Ok(csv) => write_export(app, "backtest_trades.csv", &csv),
        Err(e) => app.push_error(ErrorCategory::Other, e.to_string(), "export trades".into()),
    }
}

fn export_equity(app: &mut AppState) {
    if app.backtest.equity.is_empty() {
        app.set_warning("no equity curve to export");
        return;
    }
    match stratdesk_runner::export::export_curve_csv(&app.backtest.equity, "equity") {
        Ok(csv) => write_export(app, "backtest_equity.csv", &csv),
        Err(e) => app.push_error(ErrorCategory::Other, e.to_string(), "export equity".into()),
    }
}

fn write_export(app: &mut AppState, name: &str, content: &str) {
    let dir = app.config.download_dir.clone();
    let path = dir.join(name);
    let result = std::fs::create_dir_all(&dir).and_then(|()| std::fs::write(&path, content));
    match result {
        Ok(()) => app.set_status(format!("saved {}", path.display())),
        Err(e) => app.push_error(ErrorCategory::Other, e.to_string(), format!("write {name}")),
    }
}

// ─── Selection rows ─────────────────────────────────────────────────

fn handle_selection_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if let Some(sel) = app.active_sel_mut() {
                if sel.cursor + 1 < sel.rows.len() {
                    sel.cursor += 1;
                }
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if let Some(sel) = app.active_sel_mut() {
                sel.cursor = sel.cursor.saturating_sub(1);
            }
        }
        KeyCode::Char('l') | KeyCode::Right => adjust_current(app, true),
        KeyCode::Char('h') | KeyCode::Left => adjust_current(app, false),
        KeyCode::Enter => begin_edit(app),
        _ => {}
    }
}

/// h/l on the current row: cycle enumerations, nudge numbers and dates.
fn adjust_current(app: &mut AppState, forward: bool) {
    let Some(row) = app.active_sel_mut().and_then(|sel| sel.current_row()) else {
        return;
    };

    match row {
        FieldRow::Exchange => cycle_exchange(app, forward),
        FieldRow::Symbol => cycle_symbol(app, forward),
        FieldRow::Timeframe => {
            if let Some(sel) = app.active_sel_mut() {
                sel.ctx.timeframe = if forward {
                    sel.ctx.timeframe.next()
                } else {
                    sel.ctx.timeframe.prev()
                };
            }
            after_selection_change(app);
        }
        FieldRow::Strategy => cycle_strategy(app, forward),
        FieldRow::Metric => {
            if let Some(sel) = app.active_sel_mut() {
                sel.ctx.cycle_metric(forward);
            }
        }
        FieldRow::Capital => {
            if let Some(sel) = app.active_sel_mut() {
                let delta = if forward { 10_000.0 } else { -10_000.0 };
                sel.ctx.initial_capital = (sel.ctx.initial_capital + delta).max(1_000.0);
            }
        }
        FieldRow::StartDate => {
            if let Some(sel) = app.active_sel_mut() {
                let days = if forward { 1 } else { -1 };
                sel.ctx.start_date += Duration::days(days);
            }
        }
        FieldRow::EndDate => {
            if let Some(sel) = app.active_sel_mut() {
                let days = if forward { 1 } else { -1 };
                sel.ctx.end_date += Duration::days(days);
            }
        }
        FieldRow::Param(i) => nudge_param(app, i, forward),
    }
}

fn cycle_exchange(app: &mut AppState, forward: bool) {
    let Some(sel) = app.active_sel_mut() else { return };
    let pos = EXCHANGES
        .iter()
        .position(|e| *e == sel.ctx.exchange)
        .unwrap_or(0);
    let n = EXCHANGES.len();
    let next = if forward { (pos + 1) % n } else { (pos + n - 1) % n };
    sel.ctx.exchange = EXCHANGES[next].into();
    sel.ctx.token.clear();
    sel.ctx.symbol.clear();
    let exchange = sel.ctx.exchange.clone();
    app.bump_generation();
    let _ = app
        .worker_tx
        .send(WorkerCommand::LoadSymbols { exchange });
}

fn cycle_symbol(app: &mut AppState, forward: bool) {
    if app.catalog.symbols.is_empty() {
        app.set_warning("no symbols loaded for this exchange");
        return;
    }
    let n = app.catalog.symbols.len();
    let token = app
        .active_sel_mut()
        .map(|sel| sel.ctx.token.clone())
        .unwrap_or_default();
    let pos = app.catalog.symbol_position(&token);
    let next = match pos {
        Some(i) if forward => (i + 1) % n,
        Some(i) => (i + n - 1) % n,
        None => 0,
    };
    let entry = app.catalog.symbols[next].clone();
    if let Some(sel) = app.active_sel_mut() {
        sel.ctx.token = entry.token;
        sel.ctx.symbol = entry.trading_symbol;
    }
    after_selection_change(app);
}

fn cycle_strategy(app: &mut AppState, forward: bool) {
    if app.catalog.strategies.is_empty() {
        app.set_warning("no strategies loaded");
        return;
    }
    let n = app.catalog.strategies.len();
    let current = app
        .active_sel_mut()
        .and_then(|sel| sel.ctx.strategy_id.clone());
    let pos = app.catalog.strategy_position(current.as_deref());

    // Cycle through None → each strategy → None.
    let next: Option<usize> = match (pos, forward) {
        (None, true) => Some(0),
        (None, false) => Some(n - 1),
        (Some(i), true) if i + 1 < n => Some(i + 1),
        (Some(_), true) => None,
        (Some(0), false) => None,
        (Some(i), false) => Some(i - 1),
    };
    let strategy = next.map(|i| app.catalog.strategies[i].clone());
    if let Some(sel) = app.active_sel_mut() {
        sel.set_strategy(strategy.as_ref());
    }
    after_selection_change(app);
}

fn nudge_param(app: &mut AppState, index: usize, forward: bool) {
    let Some(sel) = app.active_sel_mut() else { return };
    let Some(field) = sel.form.fields.get_mut(index) else {
        return;
    };
    match &mut field.kind {
        FieldKind::Toggle { value } => *value = !*value,
        FieldKind::Number {
            buffer,
            integer,
            min,
            max,
            step,
        } => {
            let step_by = step.unwrap_or(1.0);
            let current: f64 = buffer.trim().parse().unwrap_or(0.0);
            let mut next = current + if forward { step_by } else { -step_by };
            if let Some(min) = min {
                next = next.max(*min);
            }
            if let Some(max) = max {
                next = next.min(*max);
            }
            *buffer = if *integer {
                format!("{}", next.round() as i64)
            } else {
                format!("{next}")
            };
        }
        // Text and range fields are edited with Enter.
        _ => {}
    }
}

/// After a (symbol, strategy, timeframe) change: the dashboard either
/// auto-tunes or just refreshes the chart; other pages wait for their run
/// key.
fn after_selection_change(app: &mut AppState) {
    app.bump_generation();
    if app.active_page != Page::Dashboard {
        return;
    }
    let can_tune = app.config.auto_tune_on_select
        && app.dashboard.sel.ctx.has_instrument()
        && app
            .catalog
            .strategy(app.dashboard.sel.ctx.strategy_id.as_deref())
            .map(|s| s.has_numeric_parameters())
            .unwrap_or(false);
    if can_tune {
        app.start_auto_tune(false);
    } else if app.dashboard.sel.ctx.has_instrument() {
        app.refresh_chart();
    }
}

// ─── Edit session ───────────────────────────────────────────────────

fn begin_edit(app: &mut AppState) {
    let Some(sel) = app.active_sel_mut() else { return };
    let Some(row) = sel.current_row() else { return };

    let buffer = match row {
        FieldRow::StartDate => sel.ctx.start_date.format("%Y-%m-%d").to_string(),
        FieldRow::EndDate => sel.ctx.end_date.format("%Y-%m-%d").to_string(),
        FieldRow::Capital => format!("{}", sel.ctx.initial_capital),
        FieldRow::Param(i) => match sel.form.fields.get(i).map(|f| &f.kind) {
            Some(FieldKind::Number { buffer, .. }) => buffer.clone(),
            Some(FieldKind::Text { buffer }) => buffer.clone(),
            Some(FieldKind::Range { start, .. }) => start.clone(),
            Some(FieldKind::Toggle { .. }) | None => return,
        },
        // Enumerated rows cycle with h/l instead.
        _ => return,
    };

    sel.edit = Some(EditSession {
        row,
        part: 0,
        buffer,
    });
}

fn handle_edit_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            if let Some(sel) = app.active_sel_mut() {
                sel.edit = None;
            }
        }
        KeyCode::Backspace => {
            if let Some(sel) = app.active_sel_mut() {
                if let Some(edit) = &mut sel.edit {
                    edit.buffer.pop();
                }
            }
        }
        KeyCode::Char(c) => {
            if let Some(sel) = app.active_sel_mut() {
                if let Some(edit) = &mut sel.edit {
                    edit.buffer.push(c);
                }
            }
        }
        KeyCode::Enter => commit_edit(app),
        _ => {}
    }
}

fn commit_edit(app: &mut AppState) {
    let Some(sel) = app.active_sel_mut() else { return };
    let Some(edit) = sel.edit.clone() else { return };
    let text = edit.buffer.trim().to_string();

    match edit.row {
        FieldRow::StartDate | FieldRow::EndDate => {
            match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                Ok(date) => {
                    if edit.row == FieldRow::StartDate {
                        sel.ctx.start_date = date;
                    } else {
                        sel.ctx.end_date = date;
                    }
                    sel.edit = None;
                    refresh_if_dashboard(app);
                }
                Err(_) => {
                    sel.edit = None;
                    app.push_error(
                        ErrorCategory::Validation,
                        format!("'{text}' is not a YYYY-MM-DD date"),
                        "edit date".into(),
                    );
                }
            }
        }
        FieldRow::Capital => match text.parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => {
                sel.ctx.initial_capital = v;
                sel.edit = None;
            }
            _ => {
                sel.edit = None;
                app.push_error(
                    ErrorCategory::Validation,
                    format!("'{text}' is not a valid capital amount"),
                    "edit capital".into(),
                );
            }
        },
        FieldRow::Param(i) => {
            let single = sel.form.mode == FormMode::Single;
            let Some(field) = sel.form.fields.get_mut(i) else {
                sel.edit = None;
                return;
            };
            match &mut field.kind {
                FieldKind::Number { buffer, .. } | FieldKind::Text { buffer } => {
                    *buffer = text;
                    sel.edit = None;
                    if single {
                        refresh_if_dashboard(app);
                    }
                }
                FieldKind::Range { start, end, step, .. } => {
                    // Enter walks min → max → step, committing each part.
                    match edit.part {
                        0 => *start = text,
                        1 => *end = text,
                        _ => *step = text,
                    }
                    if edit.part >= 2 {
                        sel.edit = None;
                    } else {
                        let next_part = edit.part + 1;
                        let next_buffer = if next_part == 1 {
                            end.clone()
                        } else {
                            step.clone()
                        };
                        sel.edit = Some(EditSession {
                            row: edit.row,
                            part: next_part,
                            buffer: next_buffer,
                        });
                    }
                }
                FieldKind::Toggle { .. } => {
                    sel.edit = None;
                }
            }
        }
        _ => {
            sel.edit = None;
        }
    }
}

fn refresh_if_dashboard(app: &mut AppState) {
    if app.active_page == Page::Dashboard && app.dashboard.sel.ctx.has_instrument() {
        app.bump_generation();
        app.refresh_chart();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use chrono::NaiveDate;
    use crossterm::event::KeyModifiers;
    use std::sync::atomic::AtomicBool;
    use std::sync::{mpsc, Arc};
    use stratdesk_core::schema::{ParamType, ParamValue, ParameterDescriptor, StrategyDescriptor};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app() -> AppState {
        let (tx, _rx) = mpsc::channel();
        let (_tx2, rx2) = mpsc::channel();
        let mut config = AppConfig::default();
        config.auto_tune_on_select = false;
        AppState::new(
            config,
            tx,
            rx2,
            Arc::new(AtomicBool::new(false)),
            NaiveDate::from_ymd_opt(2025, 6, 4).unwrap(),
        )
    }

    fn strategy() -> StrategyDescriptor {
        StrategyDescriptor {
            id: "ema_crossover".into(),
            name: "EMA Crossover".into(),
            parameters: vec![ParameterDescriptor {
                name: "fast".into(),
                param_type: ParamType::Integer,
                default: ParamValue::Int(10),
                min_value: Some(2.0),
                max_value: Some(50.0),
                step: Some(1.0),
            }],
        }
    }

    #[test]
    fn number_keys_switch_pages() {
        let mut app = test_app();
        handle_key(&mut app, press(KeyCode::Char('3')));
        assert_eq!(app.active_page, Page::Optimize);
        handle_key(&mut app, press(KeyCode::Char('1')));
        assert_eq!(app.active_page, Page::Dashboard);
    }

    #[test]
    fn cursor_moves_within_rows() {
        let mut app = test_app();
        handle_key(&mut app, press(KeyCode::Char('j')));
        handle_key(&mut app, press(KeyCode::Char('j')));
        assert_eq!(app.dashboard.sel.cursor, 2);
        handle_key(&mut app, press(KeyCode::Char('k')));
        assert_eq!(app.dashboard.sel.cursor, 1);
    }

    #[test]
    fn strategy_cycle_bumps_generation() {
        let mut app = test_app();
        app.catalog.strategies = vec![strategy()];
        app.dashboard.sel.cursor = 3; // Strategy row
        let before = app.generation;
        handle_key(&mut app, press(KeyCode::Char('l')));
        assert_eq!(app.dashboard.sel.ctx.strategy_id.as_deref(), Some("ema_crossover"));
        assert!(app.generation > before);
        // One parameter row appeared.
        assert_eq!(app.dashboard.sel.rows.len(), 7);

        // Cycling past the last strategy returns to raw charts.
        handle_key(&mut app, press(KeyCode::Char('l')));
        assert_eq!(app.dashboard.sel.ctx.strategy_id, None);
        assert!(app.dashboard.sel.ctx.strategy_params.is_empty());
    }

    #[test]
    fn toggle_param_flips_with_h() {
        let mut app = test_app();
        let boolean = StrategyDescriptor {
            id: "s".into(),
            name: "S".into(),
            parameters: vec![ParameterDescriptor {
                name: "long_only".into(),
                param_type: ParamType::Boolean,
                default: ParamValue::Bool(false),
                min_value: None,
                max_value: None,
                step: None,
            }],
        };
        app.catalog.strategies = vec![boolean.clone()];
        app.dashboard.sel.set_strategy(Some(&boolean));
        app.dashboard.sel.cursor = 6; // the parameter row
        handle_key(&mut app, press(KeyCode::Char('h')));
        match &app.dashboard.sel.form.fields[0].kind {
            FieldKind::Toggle { value } => assert!(*value),
            other => panic!("expected toggle, got {other:?}"),
        }
    }

    #[test]
    fn edit_session_commits_on_enter() {
        let mut app = test_app();
        let s = strategy();
        app.catalog.strategies = vec![s.clone()];
        app.dashboard.sel.set_strategy(Some(&s));
        app.dashboard.sel.cursor = 6; // fast parameter
        handle_key(&mut app, press(KeyCode::Enter));
        assert!(app.dashboard.sel.edit.is_some());

        // Replace "10" with "12".
        handle_key(&mut app, press(KeyCode::Backspace));
        handle_key(&mut app, press(KeyCode::Backspace));
        handle_key(&mut app, press(KeyCode::Char('1')));
        handle_key(&mut app, press(KeyCode::Char('2')));
        handle_key(&mut app, press(KeyCode::Enter));

        assert!(app.dashboard.sel.edit.is_none());
        assert_eq!(app.dashboard.sel.form.fields[0].display_value(), "12");
    }

    #[test]
    fn escape_discards_the_edit() {
        let mut app = test_app();
        app.dashboard.sel.cursor = 4; // StartDate
        handle_key(&mut app, press(KeyCode::Enter));
        assert!(app.dashboard.sel.edit.is_some());
        handle_key(&mut app, press(KeyCode::Esc));
        assert!(app.dashboard.sel.edit.is_none());
    }

    #[test]
    fn bad_date_is_a_validation_error() {
        let mut app = test_app();
        app.dashboard.sel.cursor = 4; // StartDate
        let original = app.dashboard.sel.ctx.start_date;
        handle_key(&mut app, press(KeyCode::Enter));
        for _ in 0..10 {
            handle_key(&mut app, press(KeyCode::Backspace));
        }
        handle_key(&mut app, press(KeyCode::Char('x')));
        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.dashboard.sel.ctx.start_date, original);
        assert_eq!(app.error_history.len(), 1);
        assert_eq!(app.error_history[0].category, ErrorCategory::Validation);
    }

    #[test]
    fn range_edit_walks_three_parts() {
        let mut app = test_app();
        let s = strategy();
        app.catalog.strategies = vec![s.clone()];
        app.optimize.sel.set_strategy(Some(&s));
        app.active_page = Page::Optimize;
        // Rows: 6 base + capital + metric, then the range param.
        app.optimize.sel.cursor = 8;
        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.optimize.sel.edit.as_ref().unwrap().part, 0);
        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.optimize.sel.edit.as_ref().unwrap().part, 1);
        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.optimize.sel.edit.as_ref().unwrap().part, 2);
        handle_key(&mut app, press(KeyCode::Enter));
        assert!(app.optimize.sel.edit.is_none());
    }
}
