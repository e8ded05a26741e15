//! StratDesk TUI — three-page terminal client for the backtesting server.
//!
//! Pages:
//! 1. Dashboard — instrument/strategy selection, auto-tune, price chart
//! 2. Backtest — historical run, metrics, trade tape, equity curve
//! 3. Optimize — parameter ranges, job lifecycle, ranked results
//! 4. Help — keyboard shortcuts

mod app;
mod config;
mod input;
mod theme;
mod ui;
mod worker;

use std::io::{self, stdout};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use stratdesk_core::api::types::normalize_points;
use stratdesk_core::api::HttpApi;
use stratdesk_core::domain::instrument;
use stratdesk_runner::autotune::AutoTuneOutcome;
use stratdesk_runner::job::JobOutcome;

use crate::app::{AppState, ErrorCategory};
use crate::worker::{WorkerCommand, WorkerResponse};

fn main() -> Result<()> {
    // Restore the terminal before printing any panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let config = config::load(&config::default_path());

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));

    let api = HttpApi::new(config.base_url.clone());
    let worker_handle = worker::spawn_worker(
        cmd_rx,
        resp_tx,
        cancel.clone(),
        api,
        config.job_config(),
        config.auto_tune_config(),
    );

    let mut app = AppState::new(
        config,
        cmd_tx.clone(),
        resp_rx,
        cancel.clone(),
        chrono::Local::now().date_naive(),
    );

    // Seed the catalog.
    let _ = cmd_tx.send(WorkerCommand::LoadStrategies);
    let _ = cmd_tx.send(WorkerCommand::LoadSymbols {
        exchange: app.dashboard.sel.ctx.exchange.clone(),
    });

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Shutdown worker
    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // Drain worker responses (non-blocking).
        while let Ok(resp) = app.worker_rx.try_recv() {
            handle_worker_response(app, resp);
        }

        // Poll for input events (50 ms timeout for a ~20 FPS tick).
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        if !app.running {
            break;
        }
    }
    Ok(())
}

fn handle_worker_response(app: &mut AppState, resp: WorkerResponse) {
    match resp {
        WorkerResponse::Strategies { result } => match result {
            Ok(strategies) => {
                app.set_status(format!("{} strategies available", strategies.len()));
                app.catalog.strategies = strategies;
            }
            Err(e) => app.push_error(ErrorCategory::Network, e, "list strategies".into()),
        },

        WorkerResponse::Symbols { exchange, result } => match result {
            Ok(all) => {
                let mut filtered = instrument::filter_tradeable(&all);
                // A previously selected token that the whitelist dropped
                // stays selectable if the raw fetch still carries it.
                let token = app.dashboard.sel.ctx.token.clone();
                if !token.is_empty() {
                    instrument::ensure_token_present(&mut filtered, &all, &token);
                }
                if app.dashboard.sel.ctx.token.is_empty() {
                    if let Some(first) = filtered.first() {
                        app.dashboard.sel.ctx.token = first.token.clone();
                        app.dashboard.sel.ctx.symbol = first.trading_symbol.clone();
                    }
                }
                app.set_status(format!("{} symbols on {exchange}", filtered.len()));
                app.catalog.symbols_all = all;
                app.catalog.symbols = filtered;
            }
            Err(e) => app.push_error(ErrorCategory::Network, e, format!("symbols {exchange}")),
        },

        WorkerResponse::ChartLoaded {
            generation,
            data,
            header,
            message,
        } => {
            app.dashboard.chart_loading = false;
            if !app.accepts(generation) {
                return;
            }
            data.apply_to(&mut app.dashboard.chart);
            app.dashboard.chart.dropped = data.dropped_points;
            app.dashboard.chart.header = header;
            if data.is_empty() {
                app.set_warning(message.unwrap_or_else(|| "no chart data returned".into()));
            } else if data.dropped_points > 0 {
                app.set_warning(format!(
                    "chart loaded, {} points dropped (bad timestamps)",
                    data.dropped_points
                ));
            } else {
                app.set_status(format!("{} bars loaded", data.ohlc.len()));
            }
        }

        WorkerResponse::ChartFailed { generation, error } => {
            app.dashboard.chart_loading = false;
            if !app.accepts(generation) {
                return;
            }
            app.push_error(ErrorCategory::Api, error, "load chart".into());
        }

        WorkerResponse::BacktestDone { generation, report } => {
            app.backtest.running = false;
            if !app.accepts(generation) {
                return;
            }
            if let Some(err) = &report.error_message {
                app.push_error(ErrorCategory::Api, err.clone(), "run backtest".into());
                return;
            }
            let (equity, _) = report
                .equity_curve
                .as_deref()
                .map(normalize_points)
                .unwrap_or_default();
            let (drawdown, _) = report
                .drawdown_curve
                .as_deref()
                .map(normalize_points)
                .unwrap_or_default();
            app.backtest.equity = equity;
            app.backtest.drawdown = drawdown;
            app.backtest.trades_scroll = 0;
            let summary = report
                .summary_message
                .clone()
                .unwrap_or_else(|| "backtest complete".into());
            app.backtest.report = Some(*report);
            app.set_status(summary);
        }

        WorkerResponse::BacktestFailed { generation, error } => {
            app.backtest.running = false;
            if !app.accepts(generation) {
                return;
            }
            app.push_error(ErrorCategory::Api, error, "run backtest".into());
        }

        WorkerResponse::JobProgress {
            generation,
            progress,
        } => {
            if !app.accepts(generation) {
                return;
            }
            let job = &mut app.optimize.job;
            job.phase = progress.phase;
            job.job_id = Some(progress.job_id);
            job.progress = progress.progress;
            job.message = progress.message;
        }

        WorkerResponse::JobFinished {
            generation,
            outcome,
        } => {
            if !app.accepts(generation) {
                // Result discarded, but the page must come back interactive.
                if app.optimize.job.is_live() {
                    app.optimize.job.reset();
                }
                return;
            }
            app.optimize.job.phase = outcome.phase();
            match *outcome {
                JobOutcome::Completed { job_id, results } => {
                    let n = results.results.len();
                    app.optimize.job.job_id = Some(job_id);
                    app.optimize.job.results = Some(results);
                    app.set_status(format!("optimization complete: {n} runs"));
                }
                JobOutcome::Cancelled { job_id, results } => {
                    let had_results = results.as_ref().is_some_and(|r| r.has_results());
                    app.optimize.job.job_id = Some(job_id);
                    app.optimize.job.results = results;
                    if had_results {
                        app.set_warning("optimization cancelled; partial results fetched");
                    } else {
                        app.set_warning("optimization cancelled");
                    }
                }
                JobOutcome::Failed { message, job_id } => {
                    app.optimize.job.job_id = Some(job_id);
                    app.optimize.job.message = Some(message.clone());
                    app.push_error(ErrorCategory::Api, message, "optimization".into());
                }
                JobOutcome::Error { message, job_id } => {
                    app.optimize.job.job_id = job_id;
                    app.optimize.job.message = Some(message.clone());
                    app.push_error(ErrorCategory::Network, message, "optimization".into());
                }
                JobOutcome::TimedOut { job_id, .. } => {
                    app.optimize.job.job_id = Some(job_id);
                    app.push_error(
                        ErrorCategory::Timeout,
                        "optimization poll budget exhausted".into(),
                        "optimization".into(),
                    );
                }
            }
        }

        WorkerResponse::DownloadDone { generation, path } => {
            if !app.accepts(generation) {
                return;
            }
            app.set_status(format!("results saved to {}", path.display()));
            app.optimize.job.download_path = Some(path);
        }

        WorkerResponse::DownloadFailed { generation, error } => {
            if !app.accepts(generation) {
                return;
            }
            app.push_error(ErrorCategory::Api, error, "download results".into());
        }

        WorkerResponse::AutoTuneFinished {
            generation,
            outcome,
        } => {
            app.dashboard.auto_tune_running = false;
            if !app.accepts(generation) {
                // The user moved on mid-tune; the result is discarded.
                app.set_warning("auto-tune superseded by a newer selection");
                return;
            }
            let strategy = app
                .catalog
                .strategy(app.dashboard.sel.ctx.strategy_id.as_deref())
                .cloned();
            match *outcome {
                AutoTuneOutcome::Applied { params, job_id, .. } => {
                    app.dashboard.sel.ctx.strategy_params = params;
                    app.dashboard.sel.render_form(strategy.as_ref());
                    app.set_status(format!("auto-tune applied (job {job_id})"));
                    app.refresh_chart();
                }
                AutoTuneOutcome::FellBack { reason, params } => {
                    app.dashboard.sel.ctx.strategy_params = params;
                    app.dashboard.sel.render_form(strategy.as_ref());
                    app.set_warning(format!("auto-tune fell back to defaults: {reason}"));
                    app.refresh_chart();
                }
            }
        }
    }
}
