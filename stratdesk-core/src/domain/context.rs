//! The run context — the single mutable record of "what the user has
//! selected", shared across pages by value.
//!
//! Every page owns its own copy. Page transitions clone the source page's
//! context into the destination, so edits made there never leak back.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::dates;
use crate::domain::timeframe::Timeframe;
use crate::schema::ParamMap;

/// Metrics the server can rank optimization runs by.
pub const METRICS: [&str; 5] = [
    "net_pnl",
    "sharpe_ratio",
    "profit_factor",
    "win_rate",
    "max_drawdown",
];

/// Current selection state: instrument, window, strategy, and tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunContext {
    pub exchange: String,
    pub token: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub strategy_id: Option<String>,
    pub strategy_params: ParamMap,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub metric_to_optimize: String,
}

impl RunContext {
    /// Safe defaults: NSE daily bars over the trailing year, no instrument
    /// or strategy chosen yet.
    pub fn with_defaults(today: NaiveDate) -> Self {
        let (start_date, end_date) = dates::lookback_window(today, 365);
        Self {
            exchange: "NSE".into(),
            token: String::new(),
            symbol: String::new(),
            timeframe: Timeframe::Day,
            strategy_id: None,
            strategy_params: ParamMap::new(),
            start_date,
            end_date,
            initial_capital: 100_000.0,
            metric_to_optimize: METRICS[0].into(),
        }
    }

    /// Deep copy handed to a sibling page on navigation.
    pub fn for_sibling(&self) -> RunContext {
        self.clone()
    }

    pub fn has_instrument(&self) -> bool {
        !self.token.is_empty()
    }

    /// Cycle the optimization metric forward or backward.
    pub fn cycle_metric(&mut self, forward: bool) {
        let i = METRICS
            .iter()
            .position(|m| *m == self.metric_to_optimize)
            .unwrap_or(0);
        let n = METRICS.len();
        let next = if forward { (i + 1) % n } else { (i + n - 1) % n };
        self.metric_to_optimize = METRICS[next].into();
    }
}
