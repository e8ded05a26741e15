//! Application state — single-owner, main-thread only.
//!
//! Three pages (Dashboard, Backtest, Optimize) each own a full copy of the
//! run context; "send to" transitions clone the source context into the
//! destination so later edits never leak back. All HTTP work happens on
//! the worker thread; every request carries a generation stamp, and
//! responses from a superseded generation are dropped on arrival.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use stratdesk_core::api::types::{BacktestReport, OptimizationResultSet};
use stratdesk_core::domain::chart::{ChartSink, OhlcBar, SeriesPoint, TradeMarker};
use stratdesk_core::domain::context::RunContext;
use stratdesk_core::domain::instrument::SymbolEntry;
use stratdesk_core::forms::{FormMode, ParamForm};
use stratdesk_core::request;
use stratdesk_core::schema::StrategyDescriptor;
use stratdesk_runner::job::JobPhase;

use crate::config::AppConfig;
use crate::worker::{WorkerCommand, WorkerResponse};

/// Exchanges offered by the exchange selector.
pub const EXCHANGES: [&str; 4] = ["NSE", "BSE", "NFO", "MCX"];

/// Which page is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Backtest,
    Optimize,
    Help,
}

impl Page {
    pub fn index(self) -> usize {
        match self {
            Page::Dashboard => 0,
            Page::Backtest => 1,
            Page::Optimize => 2,
            Page::Help => 3,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Page::Dashboard),
            1 => Some(Page::Backtest),
            2 => Some(Page::Optimize),
            3 => Some(Page::Help),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Backtest => "Backtest",
            Page::Optimize => "Optimize",
            Page::Help => "Help",
        }
    }

    pub fn next(self) -> Page {
        Page::from_index((self.index() + 1) % 4).unwrap()
    }

    pub fn prev(self) -> Page {
        Page::from_index((self.index() + 3) % 4).unwrap()
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// Error category for the history overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Api,
    Validation,
    Timeout,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::Api => "API",
            ErrorCategory::Validation => "VAL",
            ErrorCategory::Timeout => "TIME",
            ErrorCategory::Other => "ERR",
        }
    }
}

/// An error record for the history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

/// Which overlay (if any) sits on top of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    ErrorHistory,
}

/// Strategy list, raw symbol fetch, and the whitelisted dropdown view.
#[derive(Debug, Default)]
pub struct Catalog {
    pub strategies: Vec<StrategyDescriptor>,
    pub symbols_all: Vec<SymbolEntry>,
    pub symbols: Vec<SymbolEntry>,
}

impl Catalog {
    pub fn strategy(&self, id: Option<&str>) -> Option<&StrategyDescriptor> {
        let id = id?;
        self.strategies.iter().find(|s| s.id == id)
    }

    pub fn strategy_position(&self, id: Option<&str>) -> Option<usize> {
        let id = id?;
        self.strategies.iter().position(|s| s.id == id)
    }

    pub fn symbol_position(&self, token: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s.token == token)
    }
}

/// Which selector rows a page carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Dashboard,
    Backtest,
    Optimize,
}

impl PanelKind {
    pub fn form_mode(self) -> FormMode {
        match self {
            PanelKind::Optimize => FormMode::Range,
            _ => FormMode::Single,
        }
    }
}

/// One navigable row of a selection panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRow {
    Exchange,
    Symbol,
    Timeframe,
    Strategy,
    StartDate,
    EndDate,
    Capital,
    Metric,
    Param(usize),
}

impl FieldRow {
    pub fn label(self) -> &'static str {
        match self {
            FieldRow::Exchange => "Exchange",
            FieldRow::Symbol => "Symbol",
            FieldRow::Timeframe => "Timeframe",
            FieldRow::Strategy => "Strategy",
            FieldRow::StartDate => "Start Date",
            FieldRow::EndDate => "End Date",
            FieldRow::Capital => "Initial Capital",
            FieldRow::Metric => "Optimize Metric",
            FieldRow::Param(_) => "",
        }
    }
}

/// Text-edit session for the row under the cursor. `part` selects the
/// min/max/step sub-buffer on range rows.
#[derive(Debug, Clone)]
pub struct EditSession {
    pub row: FieldRow,
    pub part: u8,
    pub buffer: String,
}

/// Selection rows + parameter form for one page.
pub struct SelectionPanel {
    pub kind: PanelKind,
    pub ctx: RunContext,
    pub form: ParamForm,
    pub rows: Vec<FieldRow>,
    pub cursor: usize,
    pub edit: Option<EditSession>,
}

impl SelectionPanel {
    pub fn new(kind: PanelKind, ctx: RunContext) -> Self {
        let mut panel = Self {
            kind,
            ctx,
            form: ParamForm::empty(kind.form_mode()),
            rows: Vec::new(),
            cursor: 0,
            edit: None,
        };
        panel.rebuild_rows();
        panel
    }

    pub fn rebuild_rows(&mut self) {
        let mut rows = vec![
            FieldRow::Exchange,
            FieldRow::Symbol,
            FieldRow::Timeframe,
            FieldRow::Strategy,
            FieldRow::StartDate,
            FieldRow::EndDate,
        ];
        match self.kind {
            PanelKind::Dashboard => {}
            PanelKind::Backtest => rows.push(FieldRow::Capital),
            PanelKind::Optimize => {
                rows.push(FieldRow::Capital);
                rows.push(FieldRow::Metric);
            }
        }
        for i in 0..self.form.fields.len() {
            rows.push(FieldRow::Param(i));
        }
        self.rows = rows;
        if self.cursor >= self.rows.len() {
            self.cursor = self.rows.len().saturating_sub(1);
        }
    }

    pub fn current_row(&self) -> Option<FieldRow> {
        self.rows.get(self.cursor).copied()
    }

    /// Re-render the parameter form from the context and the strategy's
    /// descriptor list.
    pub fn render_form(&mut self, strategy: Option<&StrategyDescriptor>) {
        self.form = match strategy {
            Some(s) => ParamForm::render(
                &s.parameters,
                &self.ctx.strategy_params,
                self.kind.form_mode(),
            ),
            None => ParamForm::empty(self.kind.form_mode()),
        };
        self.rebuild_rows();
    }

    /// Install a strategy selection: context id, default parameters, fresh
    /// form.
    pub fn set_strategy(&mut self, strategy: Option<&StrategyDescriptor>) {
        match strategy {
            Some(s) => {
                self.ctx.strategy_id = Some(s.id.clone());
                self.ctx.strategy_params = s.default_params();
            }
            None => {
                self.ctx.strategy_id = None;
                self.ctx.strategy_params.clear();
            }
        }
        self.render_form(strategy);
    }

    /// Read the form back into the context. Returns the names of missing
    /// inputs (reported, not fatal) or the validation message.
    pub fn sync_params(
        &mut self,
        strategy: Option<&StrategyDescriptor>,
    ) -> Result<Vec<String>, String> {
        let Some(strategy) = strategy else {
            self.ctx.strategy_params.clear();
            return Ok(Vec::new());
        };
        if self.form.mode == FormMode::Range {
            // Range forms feed the optimization request, not the context.
            return Ok(Vec::new());
        }
        let outcome = self
            .form
            .read(&strategy.parameters)
            .map_err(|e| e.to_string())?;
        let missing = outcome.missing.clone();
        self.ctx.strategy_params = request::resolve_params(
            &strategy.parameters,
            &outcome,
            &self.ctx.strategy_params,
        );
        Ok(missing)
    }
}

/// Chart surface: normalized series plus the header line. Implements the
/// sink contract the chart data is applied through.
#[derive(Debug, Default)]
pub struct ChartArea {
    pub candles: Vec<OhlcBar>,
    pub indicators: Vec<(String, Vec<SeriesPoint>)>,
    pub markers: Vec<TradeMarker>,
    pub header: Option<String>,
    pub dropped: usize,
    pub fitted: bool,
}

impl ChartArea {
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

impl ChartSink for ChartArea {
    fn set_candlesticks(&mut self, bars: &[OhlcBar]) {
        self.candles = bars.to_vec();
    }

    fn set_indicator_series(&mut self, name: &str, points: &[SeriesPoint]) {
        self.indicators.push((name.to_string(), points.to_vec()));
    }

    fn set_trade_markers(&mut self, markers: &[TradeMarker]) {
        self.markers = markers.to_vec();
    }

    fn clear(&mut self) {
        self.candles.clear();
        self.indicators.clear();
        self.markers.clear();
        self.header = None;
        self.dropped = 0;
        self.fitted = false;
    }

    fn fit_visible_range(&mut self) {
        self.fitted = true;
    }
}

/// Client-side view of the optimization job on the Optimize page.
#[derive(Debug)]
pub struct JobView {
    pub phase: JobPhase,
    pub job_id: Option<String>,
    pub progress: f64,
    pub message: Option<String>,
    pub results: Option<OptimizationResultSet>,
    pub download_path: Option<PathBuf>,
    pub table_scroll: usize,
}

impl JobView {
    pub fn new() -> Self {
        Self {
            phase: JobPhase::Idle,
            job_id: None,
            progress: 0.0,
            message: None,
            results: None,
            download_path: None,
            table_scroll: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = JobView::new();
    }

    pub fn is_live(&self) -> bool {
        matches!(self.phase, JobPhase::Submitting | JobPhase::Polling)
    }

    /// The download button only appears when a non-empty result set came
    /// back.
    pub fn download_ready(&self) -> bool {
        self.results.as_ref().is_some_and(|r| r.has_results())
    }
}

pub struct DashboardState {
    pub sel: SelectionPanel,
    pub chart: ChartArea,
    pub chart_loading: bool,
    pub auto_tune_running: bool,
}

pub struct BacktestState {
    pub sel: SelectionPanel,
    pub report: Option<BacktestReport>,
    pub equity: Vec<SeriesPoint>,
    pub drawdown: Vec<SeriesPoint>,
    pub running: bool,
    pub trades_scroll: usize,
}

pub struct OptimizeState {
    pub sel: SelectionPanel,
    pub job: JobView,
}

/// Top-level application state.
pub struct AppState {
    pub active_page: Page,
    pub running: bool,
    pub config: AppConfig,
    pub catalog: Catalog,

    pub dashboard: DashboardState,
    pub backtest: BacktestState,
    pub optimize: OptimizeState,

    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,
    pub cancel: Arc<AtomicBool>,

    /// Bumped on every selection change; responses stamped with an older
    /// value are dropped on arrival.
    pub generation: u64,
    pub stale_dropped: usize,

    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
        cancel: Arc<AtomicBool>,
        today: NaiveDate,
    ) -> Self {
        let ctx = RunContext::with_defaults(today);
        Self {
            active_page: Page::Dashboard,
            running: true,
            config,
            catalog: Catalog::default(),
            dashboard: DashboardState {
                sel: SelectionPanel::new(PanelKind::Dashboard, ctx.clone()),
                chart: ChartArea::default(),
                chart_loading: false,
                auto_tune_running: false,
            },
            backtest: BacktestState {
                sel: SelectionPanel::new(PanelKind::Backtest, ctx.clone()),
                report: None,
                equity: Vec::new(),
                drawdown: Vec::new(),
                running: false,
                trades_scroll: 0,
            },
            optimize: OptimizeState {
                sel: SelectionPanel::new(PanelKind::Optimize, ctx),
                job: JobView::new(),
            },
            worker_tx,
            worker_rx,
            cancel,
            generation: 0,
            stale_dropped: 0,
            status_message: None,
            error_history: VecDeque::with_capacity(50),
            error_scroll: 0,
            overlay: Overlay::None,
        }
    }

    /// The selection panel of the active page, if it has one.
    pub fn active_sel_mut(&mut self) -> Option<&mut SelectionPanel> {
        match self.active_page {
            Page::Dashboard => Some(&mut self.dashboard.sel),
            Page::Backtest => Some(&mut self.backtest.sel),
            Page::Optimize => Some(&mut self.optimize.sel),
            Page::Help => None,
        }
    }

    pub fn bump_generation(&mut self) {
        self.generation += 1;
    }

    /// A completion is only applied when its stamp matches the current
    /// generation; anything else is a stale response.
    pub fn accepts(&mut self, generation: u64) -> bool {
        if generation == self.generation {
            true
        } else {
            self.stale_dropped += 1;
            false
        }
    }

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > 50 {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    // ─── Page transitions ───────────────────────────────────────────

    /// Copy the dashboard context into the backtest page and switch to it.
    pub fn send_to_backtest(&mut self) {
        let strategy = self
            .catalog
            .strategy(self.dashboard.sel.ctx.strategy_id.as_deref())
            .cloned();
        if let Err(msg) = self.dashboard.sel.sync_params(strategy.as_ref()) {
            self.push_error(ErrorCategory::Validation, msg, "send to backtest".into());
            return;
        }
        let mut ctx = self.dashboard.sel.ctx.for_sibling();
        ctx.initial_capital = self.backtest.sel.ctx.initial_capital;
        self.backtest.sel.ctx = ctx;
        self.backtest.sel.render_form(strategy.as_ref());
        self.active_page = Page::Backtest;
        self.set_status("Selection copied to Backtest");
    }

    /// Copy the dashboard context into the optimize page and switch to it.
    pub fn send_to_optimize(&mut self) {
        let strategy = self
            .catalog
            .strategy(self.dashboard.sel.ctx.strategy_id.as_deref())
            .cloned();
        if let Err(msg) = self.dashboard.sel.sync_params(strategy.as_ref()) {
            self.push_error(ErrorCategory::Validation, msg, "send to optimize".into());
            return;
        }
        let mut ctx = self.dashboard.sel.ctx.for_sibling();
        ctx.initial_capital = self.optimize.sel.ctx.initial_capital;
        ctx.metric_to_optimize = self.optimize.sel.ctx.metric_to_optimize.clone();
        self.optimize.sel.ctx = ctx;
        self.optimize.sel.render_form(strategy.as_ref());
        self.active_page = Page::Optimize;
        self.set_status("Selection copied to Optimize");
    }

    // ─── Worker commands ────────────────────────────────────────────

    /// Load/refresh the dashboard chart for the current selection.
    pub fn refresh_chart(&mut self) {
        let strategy = self
            .catalog
            .strategy(self.dashboard.sel.ctx.strategy_id.as_deref())
            .cloned();
        match self.dashboard.sel.sync_params(strategy.as_ref()) {
            Ok(missing) if !missing.is_empty() => {
                self.set_warning(format!("inputs missing, using defaults: {}", missing.join(", ")));
            }
            Ok(_) => {}
            Err(msg) => {
                self.push_error(ErrorCategory::Validation, msg, "load chart".into());
                return;
            }
        }
        match request::chart_request(&self.dashboard.sel.ctx) {
            Ok(req) => {
                self.dashboard.chart_loading = true;
                let _ = self.worker_tx.send(WorkerCommand::LoadChart {
                    generation: self.generation,
                    request: req,
                });
            }
            Err(e) => self.set_warning(e.to_string()),
        }
    }

    /// Run a backtest for the backtest page's selection.
    pub fn run_backtest(&mut self) {
        let strategy = self
            .catalog
            .strategy(self.backtest.sel.ctx.strategy_id.as_deref())
            .cloned();
        if let Err(msg) = self.backtest.sel.sync_params(strategy.as_ref()) {
            self.push_error(ErrorCategory::Validation, msg, "run backtest".into());
            return;
        }
        match request::backtest_request(&self.backtest.sel.ctx) {
            Ok(req) => {
                self.backtest.running = true;
                let _ = self.worker_tx.send(WorkerCommand::RunBacktest {
                    generation: self.generation,
                    request: req,
                });
            }
            Err(e) => self.set_warning(e.to_string()),
        }
    }

    /// Validate ranges and submit an optimization job. A live job is
    /// cancelled first; only one poll loop exists at a time.
    pub fn start_optimization(&mut self) {
        let Some(strategy) = self
            .catalog
            .strategy(self.optimize.sel.ctx.strategy_id.as_deref())
            .cloned()
        else {
            self.set_warning("select a strategy first");
            return;
        };

        let raw = match self.optimize.sel.form.read_ranges(&strategy.parameters) {
            Ok(raw) => raw,
            Err(e) => {
                self.push_error(ErrorCategory::Validation, e.to_string(), "optimize".into());
                return;
            }
        };
        let ranges = match request::resolve_ranges(&strategy.parameters, &raw) {
            Ok(r) => r,
            Err(e) => {
                self.push_error(ErrorCategory::Validation, e.to_string(), "optimize".into());
                return;
            }
        };
        let req = match request::optimization_request(&self.optimize.sel.ctx, ranges) {
            Ok(r) => r,
            Err(e) => {
                self.push_error(ErrorCategory::Validation, e.to_string(), "optimize".into());
                return;
            }
        };

        if self.optimize.job.is_live() {
            self.cancel.store(true, Ordering::Relaxed);
        }
        self.bump_generation();
        self.optimize.job.reset();
        self.optimize.job.phase = JobPhase::Submitting;
        let _ = self.worker_tx.send(WorkerCommand::StartOptimization {
            generation: self.generation,
            request: req,
        });
    }

    /// Cancel the live job: flag the poll loop, which dispatches the cancel
    /// RPC and stops regardless of the server's reply.
    pub fn cancel_optimization(&mut self) {
        if self.optimize.job.is_live() {
            self.cancel.store(true, Ordering::Relaxed);
            self.set_status("Cancelling optimization…");
        }
    }

    /// Download the results CSV for the finished job.
    pub fn download_results(&mut self) {
        if !self.optimize.job.download_ready() {
            self.set_warning("no results to download");
            return;
        }
        if let Some(job_id) = self.optimize.job.job_id.clone() {
            let _ = self.worker_tx.send(WorkerCommand::DownloadResults {
                generation: self.generation,
                job_id,
                dest_dir: self.config.download_dir.clone(),
            });
        }
    }

    /// Kick off auto-tune for the dashboard selection. `forced` bypasses
    /// the config toggle (the explicit key always works).
    pub fn start_auto_tune(&mut self, forced: bool) {
        if !forced && !self.config.auto_tune_on_select {
            return;
        }
        let Some(strategy) = self
            .catalog
            .strategy(self.dashboard.sel.ctx.strategy_id.as_deref())
            .cloned()
        else {
            return;
        };
        if !strategy.has_numeric_parameters() || !self.dashboard.sel.ctx.has_instrument() {
            return;
        }
        self.dashboard.auto_tune_running = true;
        self.set_status(format!("Auto-tuning {}…", strategy.name));
        let _ = self.worker_tx.send(WorkerCommand::AutoTune {
            generation: self.generation,
            ctx: self.dashboard.sel.ctx.clone(),
            strategy,
            today: chrono::Local::now().date_naive(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use stratdesk_core::schema::{ParamType, ParamValue, ParameterDescriptor};

    fn test_app() -> AppState {
        let (tx, _rx) = mpsc::channel();
        let (_tx2, rx2) = mpsc::channel();
        AppState::new(
            AppConfig::default(),
            tx,
            rx2,
            Arc::new(AtomicBool::new(false)),
            NaiveDate::from_ymd_opt(2025, 6, 4).unwrap(),
        )
    }

    fn ema_strategy() -> StrategyDescriptor {
        StrategyDescriptor {
            id: "ema_crossover".into(),
            name: "EMA Crossover".into(),
            parameters: vec![
                ParameterDescriptor {
                    name: "fast".into(),
                    param_type: ParamType::Integer,
                    default: ParamValue::Int(10),
                    min_value: Some(2.0),
                    max_value: Some(50.0),
                    step: Some(1.0),
                },
                ParameterDescriptor {
                    name: "slow".into(),
                    param_type: ParamType::Integer,
                    default: ParamValue::Int(30),
                    min_value: Some(5.0),
                    max_value: Some(100.0),
                    step: Some(1.0),
                },
            ],
        }
    }

    #[test]
    fn page_cycle() {
        assert_eq!(Page::Dashboard.next(), Page::Backtest);
        assert_eq!(Page::Help.next(), Page::Dashboard);
        assert_eq!(Page::Dashboard.prev(), Page::Help);
    }

    #[test]
    fn error_history_caps_at_50() {
        let mut app = test_app();
        for i in 0..60 {
            app.push_error(ErrorCategory::Other, format!("error {i}"), String::new());
        }
        assert_eq!(app.error_history.len(), 50);
        assert!(app.error_history[0].message.contains("59"));
    }

    #[test]
    fn stale_generations_are_dropped() {
        let mut app = test_app();
        let stamped = app.generation;
        app.bump_generation();
        assert!(!app.accepts(stamped));
        assert_eq!(app.stale_dropped, 1);
        assert!(app.accepts(app.generation));
    }

    #[test]
    fn send_to_backtest_copies_by_value() {
        let mut app = test_app();
        let strategy = ema_strategy();
        app.catalog.strategies = vec![strategy.clone()];

        app.dashboard.sel.ctx.token = "2885".into();
        app.dashboard.sel.set_strategy(Some(&strategy));
        app.dashboard
            .sel
            .ctx
            .strategy_params
            .insert("fast".into(), ParamValue::Int(8));
        app.dashboard
            .sel
            .ctx
            .strategy_params
            .insert("slow".into(), ParamValue::Int(21));
        app.dashboard.sel.render_form(Some(&strategy));

        app.send_to_backtest();
        assert_eq!(app.active_page, Page::Backtest);
        assert_eq!(
            app.backtest.sel.ctx.strategy_params["fast"],
            ParamValue::Int(8)
        );

        // Edit on the backtest page; the dashboard must keep its values.
        app.backtest
            .sel
            .ctx
            .strategy_params
            .insert("fast".into(), ParamValue::Int(12));
        assert_eq!(
            app.dashboard.sel.ctx.strategy_params["fast"],
            ParamValue::Int(8)
        );
        assert_eq!(
            app.dashboard.sel.ctx.strategy_params["slow"],
            ParamValue::Int(21)
        );
    }

    #[test]
    fn selection_rows_track_form_length() {
        let mut app = test_app();
        let strategy = ema_strategy();
        assert_eq!(app.dashboard.sel.rows.len(), 6);
        app.dashboard.sel.set_strategy(Some(&strategy));
        assert_eq!(app.dashboard.sel.rows.len(), 8);
        assert_eq!(app.dashboard.sel.rows[6], FieldRow::Param(0));

        // Optimize page carries capital + metric rows on top.
        app.optimize.sel.set_strategy(Some(&strategy));
        assert_eq!(app.optimize.sel.rows.len(), 10);
    }

    #[test]
    fn empty_results_hide_the_download_button() {
        let mut job = JobView::new();
        job.results = Some(OptimizationResultSet::default());
        assert!(!job.download_ready());
    }
}
