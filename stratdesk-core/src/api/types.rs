//! Wire types for the backend HTTP contract.
//!
//! Request structs serialize exactly what the server expects; response
//! structs are tolerant of the fields older server revisions omit or spell
//! differently (notably `default` vs `default_value` on parameter
//! descriptors).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::chart::{
    self, ChartData, MarkerPosition, MarkerShape, OhlcBar, SeriesPoint, TradeMarker,
};
use crate::domain::instrument::SymbolEntry;
use crate::schema::{ParamMap, ParamType, ParamValue, ParameterDescriptor, StrategyDescriptor};

// ─── Strategy catalog ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StrategyListResponse {
    #[serde(default)]
    pub strategies: Vec<RawStrategyDescriptor>,
}

/// Descriptor as the server sends it, before default-key resolution.
#[derive(Debug, Deserialize)]
pub struct RawStrategyDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<RawParameterDescriptor>,
}

impl RawStrategyDescriptor {
    pub fn resolve(self) -> StrategyDescriptor {
        StrategyDescriptor {
            id: self.id,
            name: self.name,
            parameters: self.parameters.into_iter().map(|p| p.resolve()).collect(),
        }
    }
}

/// Parameter descriptor carrying both spellings of the default key. Server
/// revisions disagree; `default` wins when both are present.
#[derive(Debug, Deserialize)]
pub struct RawParameterDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub default: Option<ParamValue>,
    #[serde(default)]
    pub default_value: Option<ParamValue>,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
}

impl RawParameterDescriptor {
    pub fn resolve(self) -> ParameterDescriptor {
        let default = self
            .default
            .or(self.default_value)
            .unwrap_or_else(|| ParamValue::zero(self.param_type));
        ParameterDescriptor {
            name: self.name,
            param_type: self.param_type,
            default,
            min_value: self.min_value,
            max_value: self.max_value,
            step: self.step,
        }
    }
}

// ─── Symbol master ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SymbolListResponse {
    #[serde(default)]
    pub symbols: Vec<SymbolEntry>,
}

// ─── Chart ──────────────────────────────────────────────────────────

/// Request body for `POST /chart_data_with_strategy`.
///
/// `strategy_params` is empty exactly when `strategy_id` is absent (a raw
/// OHLC request); the builder enforces this by construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRequest {
    pub exchange: String,
    pub token: String,
    pub timeframe: String,
    pub strategy_id: Option<String>,
    pub strategy_params: ParamMap,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireOhlcBar {
    pub time: Value,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WirePoint {
    pub time: Value,
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMarker {
    pub time: Value,
    #[serde(default)]
    pub position: MarkerPosition,
    #[serde(default)]
    pub shape: MarkerShape,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, alias = "text")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChartDataResponse {
    #[serde(default)]
    pub ohlc_data: Vec<WireOhlcBar>,
    #[serde(default)]
    pub indicator_data: Option<BTreeMap<String, Vec<WirePoint>>>,
    #[serde(default)]
    pub trade_markers: Option<Vec<WireMarker>>,
    #[serde(default)]
    pub chart_header_info: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Normalize a wire series into epoch-second points, counting drops.
pub fn normalize_points(raw: &[WirePoint]) -> (Vec<SeriesPoint>, usize) {
    let mut points = Vec::with_capacity(raw.len());
    let mut dropped = 0;
    for p in raw {
        match (chart::coerce_epoch_seconds(&p.time), p.value) {
            (Some(time), Some(value)) if value.is_finite() => {
                points.push(SeriesPoint { time, value });
            }
            _ => dropped += 1,
        }
    }
    (points, dropped)
}

impl ChartDataResponse {
    /// Convert the wire payload into normalized chart data. Points whose
    /// timestamp cannot be coerced to epoch seconds are dropped and counted.
    pub fn into_chart_data(self) -> ChartData {
        let mut dropped = 0;

        let mut ohlc = Vec::with_capacity(self.ohlc_data.len());
        for bar in &self.ohlc_data {
            match chart::coerce_epoch_seconds(&bar.time) {
                Some(time) => ohlc.push(OhlcBar {
                    time,
                    open: bar.open,
                    high: bar.high,
                    low: bar.low,
                    close: bar.close,
                    volume: bar.volume.unwrap_or(0.0),
                }),
                None => dropped += 1,
            }
        }

        let mut indicators = Vec::new();
        if let Some(series) = &self.indicator_data {
            for (name, raw) in series {
                let (points, d) = normalize_points(raw);
                dropped += d;
                indicators.push((name.clone(), points));
            }
        }

        let mut markers = Vec::new();
        if let Some(raw_markers) = &self.trade_markers {
            for m in raw_markers {
                match chart::coerce_epoch_seconds(&m.time) {
                    Some(time) => markers.push(TradeMarker {
                        time,
                        position: m.position,
                        shape: m.shape,
                        color: m.color.clone().unwrap_or_else(|| "#2196F3".into()),
                        label: m.label.clone().unwrap_or_default(),
                    }),
                    None => dropped += 1,
                }
            }
        }

        ChartData {
            ohlc,
            indicators,
            markers,
            dropped_points: dropped,
        }
    }
}

// ─── Backtest ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestRequest {
    pub strategy_id: String,
    pub exchange: String,
    pub token: String,
    pub start_date: String,
    pub end_date: String,
    pub timeframe: String,
    pub initial_capital: f64,
    pub parameters: ParamMap,
}

/// One trade row as the server reports it; column sets vary by strategy.
pub type TradeRow = BTreeMap<String, Value>;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BacktestReport {
    #[serde(default)]
    pub performance_metrics: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub trades: Option<Vec<TradeRow>>,
    #[serde(default)]
    pub equity_curve: Option<Vec<WirePoint>>,
    #[serde(default)]
    pub drawdown_curve: Option<Vec<WirePoint>>,
    #[serde(default)]
    pub summary_message: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

// ─── Optimization ───────────────────────────────────────────────────

/// Closed interval of candidate values for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub name: String,
    pub start_value: f64,
    pub end_value: f64,
    pub step: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationRequest {
    pub strategy_id: String,
    pub exchange: String,
    pub token: String,
    pub start_date: String,
    pub end_date: String,
    pub timeframe: String,
    pub initial_capital: f64,
    pub parameter_ranges: Vec<ParameterRange>,
    pub metric_to_optimize: String,
}

/// Server-side job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELLED",
            JobStatus::Error => "ERROR",
        }
    }
}

/// Response to `POST /optimize/start`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobTicket {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress_percentage: f64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to `GET /optimize/status/{jobId}`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusReport {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress_percentage: f64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results_available: Option<bool>,
    #[serde(default)]
    pub current_iteration: Option<u64>,
}

/// One evaluated parameter tuple.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OptimizationRun {
    #[serde(default)]
    pub parameters: ParamMap,
    #[serde(default)]
    pub performance_metrics: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Full result set from `GET /optimize/results/{jobId}`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OptimizationResultSet {
    #[serde(default)]
    pub results: Vec<OptimizationRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_result: Option<OptimizationRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OptimizationResultSet {
    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    /// Every entry carries the identical parameter-key set when non-empty.
    pub fn uniform_parameter_keys(&self) -> bool {
        let mut keys: Option<Vec<&String>> = None;
        for run in &self.results {
            let run_keys: Vec<&String> = run.parameters.keys().collect();
            match &keys {
                None => keys = Some(run_keys),
                Some(first) => {
                    if *first != run_keys {
                        return false;
                    }
                }
            }
        }
        true
    }
}

// ─── Cancel ─────────────────────────────────────────────────────────

/// Server's verdict on a cancel request. Every disposition implies the job
/// is no longer live from the client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelDisposition {
    JobNotFound,
    AlreadyCompleted,
    AlreadyFailed,
    CancelledSuccessfully,
    ErrorCannotCancelCompleted,
}

/// Response to `POST /optimize/cancel/{jobId}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelReply {
    pub status: CancelDisposition,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub job_status: Option<JobStatus>,
    #[serde(default)]
    pub results_available: Option<bool>,
}
