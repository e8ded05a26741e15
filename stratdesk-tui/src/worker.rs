//! Background worker thread — all HTTP calls run here.
//!
//! Communication with the TUI main thread is via `mpsc` channels. The
//! shared cancel flag is set by the main thread (cancel key, superseding
//! start) and observed by the polling loops; it resets before each new
//! command.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::NaiveDate;

use stratdesk_core::api::types::{
    BacktestReport, BacktestRequest, ChartRequest, OptimizationRequest,
};
use stratdesk_core::api::{BackendApi, HttpApi};
use stratdesk_core::domain::chart::ChartData;
use stratdesk_core::domain::context::RunContext;
use stratdesk_core::domain::instrument::SymbolEntry;
use stratdesk_core::schema::StrategyDescriptor;
use stratdesk_runner::autotune::{run_auto_tune, AutoTuneConfig, AutoTuneOutcome};
use stratdesk_runner::job::{run_optimization, JobConfig, JobOutcome, JobProgress};

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    LoadStrategies,
    LoadSymbols {
        exchange: String,
    },
    LoadChart {
        generation: u64,
        request: ChartRequest,
    },
    RunBacktest {
        generation: u64,
        request: BacktestRequest,
    },
    StartOptimization {
        generation: u64,
        request: OptimizationRequest,
    },
    DownloadResults {
        generation: u64,
        job_id: String,
        dest_dir: PathBuf,
    },
    AutoTune {
        generation: u64,
        ctx: RunContext,
        strategy: StrategyDescriptor,
        today: NaiveDate,
    },
    Shutdown,
}

/// Responses sent from the worker back to the TUI. Fallible operations
/// carry their error as a display string; the worker never panics on a
/// failed call.
#[derive(Debug)]
pub enum WorkerResponse {
    Strategies {
        result: Result<Vec<StrategyDescriptor>, String>,
    },
    Symbols {
        exchange: String,
        result: Result<Vec<SymbolEntry>, String>,
    },
    ChartLoaded {
        generation: u64,
        data: Box<ChartData>,
        header: Option<String>,
        message: Option<String>,
    },
    ChartFailed {
        generation: u64,
        error: String,
    },
    BacktestDone {
        generation: u64,
        report: Box<BacktestReport>,
    },
    BacktestFailed {
        generation: u64,
        error: String,
    },
    JobProgress {
        generation: u64,
        progress: JobProgress,
    },
    JobFinished {
        generation: u64,
        outcome: Box<JobOutcome>,
    },
    DownloadDone {
        generation: u64,
        path: PathBuf,
    },
    DownloadFailed {
        generation: u64,
        error: String,
    },
    AutoTuneFinished {
        generation: u64,
        outcome: Box<AutoTuneOutcome>,
    },
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    cancel: Arc<AtomicBool>,
    api: HttpApi,
    job_cfg: JobConfig,
    tune_cfg: AutoTuneConfig,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("stratdesk-worker".into())
        .spawn(move || {
            worker_loop(rx, tx, cancel, api, job_cfg, tune_cfg);
        })
        .expect("failed to spawn worker thread")
}

fn worker_loop(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    cancel: Arc<AtomicBool>,
    api: HttpApi,
    job_cfg: JobConfig,
    tune_cfg: AutoTuneConfig,
) {
    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(cmd) => {
                cancel.store(false, Ordering::Relaxed);
                handle_command(cmd, &api, &tx, &cancel, &job_cfg, &tune_cfg);
            }
        }
    }
}

fn handle_command(
    cmd: WorkerCommand,
    api: &HttpApi,
    tx: &Sender<WorkerResponse>,
    cancel: &Arc<AtomicBool>,
    job_cfg: &JobConfig,
    tune_cfg: &AutoTuneConfig,
) {
    match cmd {
        WorkerCommand::LoadStrategies => {
            let result = api
                .available_strategies()
                .map_err(|e| e.to_string());
            let _ = tx.send(WorkerResponse::Strategies { result });
        }
        WorkerCommand::LoadSymbols { exchange } => {
            let result = api.symbols(&exchange).map_err(|e| e.to_string());
            let _ = tx.send(WorkerResponse::Symbols { exchange, result });
        }
        WorkerCommand::LoadChart { generation, request } => match api.chart_data(&request) {
            Ok(resp) => {
                let header = resp.chart_header_info.clone();
                let message = resp.message.clone();
                let data = resp.into_chart_data();
                let _ = tx.send(WorkerResponse::ChartLoaded {
                    generation,
                    data: Box::new(data),
                    header,
                    message,
                });
            }
            Err(e) => {
                let _ = tx.send(WorkerResponse::ChartFailed {
                    generation,
                    error: e.to_string(),
                });
            }
        },
        WorkerCommand::RunBacktest { generation, request } => {
            match api.run_backtest(&request) {
                Ok(report) => {
                    let _ = tx.send(WorkerResponse::BacktestDone {
                        generation,
                        report: Box::new(report),
                    });
                }
                Err(e) => {
                    let _ = tx.send(WorkerResponse::BacktestFailed {
                        generation,
                        error: e.to_string(),
                    });
                }
            }
        }
        WorkerCommand::StartOptimization { generation, request } => {
            let tx_progress = tx.clone();
            let on_progress = move |p: &JobProgress| {
                let _ = tx_progress.send(WorkerResponse::JobProgress {
                    generation,
                    progress: p.clone(),
                });
            };
            let outcome = run_optimization(api, &request, job_cfg, cancel, Some(&on_progress));
            let _ = tx.send(WorkerResponse::JobFinished {
                generation,
                outcome: Box::new(outcome),
            });
        }
        WorkerCommand::DownloadResults {
            generation,
            job_id,
            dest_dir,
        } => match stratdesk_runner::job::download_results(api, &job_id, &dest_dir) {
            Ok(path) => {
                let _ = tx.send(WorkerResponse::DownloadDone { generation, path });
            }
            Err(e) => {
                let _ = tx.send(WorkerResponse::DownloadFailed {
                    generation,
                    error: e.to_string(),
                });
            }
        },
        WorkerCommand::AutoTune {
            generation,
            ctx,
            strategy,
            today,
        } => {
            let outcome = run_auto_tune(api, &ctx, &strategy, today, tune_cfg, cancel, None);
            let _ = tx.send(WorkerResponse::AutoTuneFinished {
                generation,
                outcome: Box::new(outcome),
            });
        }
        WorkerCommand::Shutdown => {} // handled in the loop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn worker_shutdown() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, _resp_rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        let handle = spawn_worker(
            cmd_rx,
            resp_tx,
            cancel,
            HttpApi::new("http://127.0.0.1:1"),
            JobConfig::default(),
            AutoTuneConfig::default(),
        );
        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().expect("worker should join cleanly");
    }

    #[test]
    fn dropped_sender_stops_worker() {
        let (cmd_tx, cmd_rx) = mpsc::channel::<WorkerCommand>();
        let (resp_tx, _resp_rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        let handle = spawn_worker(
            cmd_rx,
            resp_tx,
            cancel,
            HttpApi::new("http://127.0.0.1:1"),
            JobConfig::default(),
            AutoTuneConfig::default(),
        );
        drop(cmd_tx);
        handle.join().expect("worker should join cleanly");
    }
}
