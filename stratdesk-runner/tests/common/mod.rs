//! Scripted in-memory backend used by the lifecycle tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::json;

use stratdesk_core::api::{
    ApiError, BacktestReport, BacktestRequest, BackendApi, CancelDisposition, CancelReply,
    ChartDataResponse, ChartRequest, JobStatus, JobStatusReport, JobTicket,
    OptimizationRequest, OptimizationResultSet,
};
use stratdesk_core::domain::instrument::SymbolEntry;
use stratdesk_core::schema::StrategyDescriptor;

/// One scripted poll response: a status report or a transport failure.
pub enum PollStep {
    Status(JobStatus, f64),
    StatusWithResults(JobStatus, f64, bool),
    Fail(&'static str),
}

/// Backend whose responses are scripted up front and whose call counts are
/// observable afterwards.
pub struct ScriptedApi {
    pub job_id: String,
    pub ticket_status: JobStatus,
    pub fail_message: Option<String>,
    pub polls: Mutex<VecDeque<PollStep>>,
    pub results: OptimizationResultSet,
    pub cancel_reply: CancelReply,
    pub chart_bars: Option<usize>,
    pub csv_bytes: Vec<u8>,

    pub start_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub results_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
    pub chart_calls: AtomicUsize,
    pub last_start_request: Mutex<Option<OptimizationRequest>>,
}

impl ScriptedApi {
    pub fn new(polls: Vec<PollStep>) -> Self {
        Self {
            job_id: "J1".into(),
            ticket_status: JobStatus::Queued,
            fail_message: None,
            polls: Mutex::new(polls.into()),
            results: sample_results(),
            cancel_reply: CancelReply {
                status: CancelDisposition::CancelledSuccessfully,
                message: None,
                job_status: Some(JobStatus::Cancelled),
                results_available: Some(false),
            },
            chart_bars: Some(300),
            csv_bytes: b"name,net_pnl\n".to_vec(),
            start_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            results_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            chart_calls: AtomicUsize::new(0),
            last_start_request: Mutex::new(None),
        }
    }
}

pub fn sample_results() -> OptimizationResultSet {
    serde_json::from_value(json!({
        "results": [
            {"parameters": {"fast_ema_period": 8, "slow_ema_period": 21},
             "performance_metrics": {"net_pnl": 1200.0}},
            {"parameters": {"fast_ema_period": 12, "slow_ema_period": 40},
             "performance_metrics": {"net_pnl": 1850.0}}
        ],
        "best_result": {
            "parameters": {"fast_ema_period": 12.0, "slow_ema_period": 40},
            "performance_metrics": {"net_pnl": 1850.0}
        }
    }))
    .unwrap()
}

fn chart_response(bars: usize) -> ChartDataResponse {
    let ohlc: Vec<_> = (0..bars)
        .map(|i| {
            json!({
                "time": 1_700_000_000 + (i as i64) * 86_400,
                "open": 100.0, "high": 101.0, "low": 99.0, "close": 100.5,
                "volume": 1000
            })
        })
        .collect();
    serde_json::from_value(json!({ "ohlc_data": ohlc })).unwrap()
}

impl BackendApi for ScriptedApi {
    fn available_strategies(&self) -> Result<Vec<StrategyDescriptor>, ApiError> {
        Ok(vec![])
    }

    fn symbols(&self, _exchange: &str) -> Result<Vec<SymbolEntry>, ApiError> {
        Ok(vec![])
    }

    fn chart_data(&self, _request: &ChartRequest) -> Result<ChartDataResponse, ApiError> {
        self.chart_calls.fetch_add(1, Ordering::SeqCst);
        match self.chart_bars {
            Some(n) => Ok(chart_response(n)),
            None => Err(ApiError::Transport {
                operation: "load chart data",
                message: "connection refused".into(),
            }),
        }
    }

    fn run_backtest(&self, _request: &BacktestRequest) -> Result<BacktestReport, ApiError> {
        Ok(BacktestReport::default())
    }

    fn start_optimization(&self, request: &OptimizationRequest) -> Result<JobTicket, ApiError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_start_request.lock().unwrap() = Some(request.clone());
        Ok(JobTicket {
            job_id: self.job_id.clone(),
            status: self.ticket_status,
            progress_percentage: 0.0,
            message: self.fail_message.clone(),
        })
    }

    fn optimization_status(&self, job_id: &str) -> Result<JobStatusReport, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PollStep::Status(JobStatus::Running, 50.0));
        match step {
            PollStep::Status(status, progress) => Ok(JobStatusReport {
                job_id: job_id.into(),
                status,
                progress_percentage: progress,
                message: self.fail_message.clone(),
                results_available: None,
                current_iteration: None,
            }),
            PollStep::StatusWithResults(status, progress, available) => Ok(JobStatusReport {
                job_id: job_id.into(),
                status,
                progress_percentage: progress,
                message: self.fail_message.clone(),
                results_available: Some(available),
                current_iteration: None,
            }),
            PollStep::Fail(message) => Err(ApiError::Transport {
                operation: "poll optimization",
                message: message.into(),
            }),
        }
    }

    fn optimization_results(&self, _job_id: &str) -> Result<OptimizationResultSet, ApiError> {
        self.results_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.results.clone())
    }

    fn download_results_csv(&self, _job_id: &str) -> Result<Vec<u8>, ApiError> {
        Ok(self.csv_bytes.clone())
    }

    fn cancel_optimization(&self, _job_id: &str) -> Result<CancelReply, ApiError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.cancel_reply.clone())
    }
}
