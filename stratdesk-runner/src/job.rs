//! Optimization job lifecycle.
//!
//! One job runs at a time per owner: submit, then poll on a fixed cadence
//! until a terminal status, a poll error, cancellation, or the optional
//! poll budget runs out. The loop owns the only timer; when it returns, no
//! polling remains.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use stratdesk_core::api::{
    ApiError, BackendApi, CancelDisposition, JobStatus, OptimizationRequest,
    OptimizationResultSet,
};

/// Client-side phase of the job machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
    Cancelled,
    Error,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobPhase::Completed | JobPhase::Failed | JobPhase::Cancelled | JobPhase::Error
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            JobPhase::Idle => "idle",
            JobPhase::Submitting => "submitting",
            JobPhase::Polling => "polling",
            JobPhase::Completed => "completed",
            JobPhase::Failed => "failed",
            JobPhase::Cancelled => "cancelled",
            JobPhase::Error => "error",
        }
    }
}

/// Polling knobs. Production uses the 3-second cadence; auto-tune shortens
/// it and sets a budget; tests zero it out.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub poll_interval: Duration,
    /// Maximum number of status polls before giving up. `None` = unbounded.
    pub max_polls: Option<u32>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            max_polls: None,
        }
    }
}

/// Progress event emitted after the submit response and every poll.
/// `progress` is clamped monotonically non-decreasing for the job's life.
#[derive(Debug, Clone)]
pub struct JobProgress {
    pub phase: JobPhase,
    pub job_id: String,
    pub status: JobStatus,
    pub progress: f64,
    pub message: Option<String>,
    pub current_iteration: Option<u64>,
}

/// How the job ended.
#[derive(Debug)]
pub enum JobOutcome {
    Completed {
        job_id: String,
        results: OptimizationResultSet,
    },
    Failed {
        job_id: String,
        message: String,
    },
    Cancelled {
        job_id: String,
        results: Option<OptimizationResultSet>,
    },
    /// A transport/API failure at submit, poll, or results fetch.
    Error {
        job_id: Option<String>,
        message: String,
    },
    /// The poll budget ran out before a terminal status.
    TimedOut {
        job_id: String,
        last_progress: f64,
    },
}

impl JobOutcome {
    pub fn phase(&self) -> JobPhase {
        match self {
            JobOutcome::Completed { .. } => JobPhase::Completed,
            JobOutcome::Failed { .. } => JobPhase::Failed,
            JobOutcome::Cancelled { .. } => JobPhase::Cancelled,
            JobOutcome::Error { .. } | JobOutcome::TimedOut { .. } => JobPhase::Error,
        }
    }

    pub fn results(&self) -> Option<&OptimizationResultSet> {
        match self {
            JobOutcome::Completed { results, .. } => Some(results),
            JobOutcome::Cancelled { results, .. } => results.as_ref(),
            _ => None,
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            JobOutcome::Completed { job_id, .. }
            | JobOutcome::Failed { job_id, .. }
            | JobOutcome::Cancelled { job_id, .. }
            | JobOutcome::TimedOut { job_id, .. } => Some(job_id),
            JobOutcome::Error { job_id, .. } => job_id.as_deref(),
        }
    }
}

/// Drive one optimization job to its end.
///
/// Setting `cancel` stops the local poll at the next check and dispatches
/// the cancel RPC; the local stop happens regardless of what the server
/// replies. The progress callback fires once for the submit response and
/// once per poll.
pub fn run_optimization(
    api: &dyn BackendApi,
    request: &OptimizationRequest,
    cfg: &JobConfig,
    cancel: &AtomicBool,
    progress: Option<&dyn Fn(&JobProgress)>,
) -> JobOutcome {
    let emit = |p: &JobProgress| {
        if let Some(cb) = progress {
            cb(p);
        }
    };

    // Submit.
    let ticket = match api.start_optimization(request) {
        Ok(t) => t,
        Err(e) => {
            return JobOutcome::Error {
                job_id: None,
                message: e.to_string(),
            }
        }
    };
    let job_id = ticket.job_id.clone();
    let mut high_water = ticket.progress_percentage.clamp(0.0, 100.0);

    emit(&JobProgress {
        phase: JobPhase::Polling,
        job_id: job_id.clone(),
        status: ticket.status,
        progress: high_water,
        message: ticket.message.clone(),
        current_iteration: None,
    });

    // The submit response can already be terminal.
    if ticket.status.is_terminal() {
        return finish_terminal(api, &job_id, ticket.status, ticket.message, None);
    }

    // Poll.
    let mut polls = 0u32;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return cancel_job(api, &job_id);
        }
        if let Some(max) = cfg.max_polls {
            if polls >= max {
                return JobOutcome::TimedOut {
                    job_id,
                    last_progress: high_water,
                };
            }
        }
        if sleep_with_cancel(cfg.poll_interval, cancel) {
            return cancel_job(api, &job_id);
        }

        polls += 1;
        let report = match api.optimization_status(&job_id) {
            Ok(r) => r,
            Err(e) => {
                // Synthetic terminal status so the UI has something to show.
                emit(&JobProgress {
                    phase: JobPhase::Error,
                    job_id: job_id.clone(),
                    status: JobStatus::Error,
                    progress: 0.0,
                    message: Some(e.to_string()),
                    current_iteration: None,
                });
                return JobOutcome::Error {
                    job_id: Some(job_id),
                    message: e.to_string(),
                };
            }
        };

        high_water = high_water.max(report.progress_percentage.clamp(0.0, 100.0));
        let phase = if report.status.is_terminal() {
            phase_for(report.status)
        } else {
            JobPhase::Polling
        };
        emit(&JobProgress {
            phase,
            job_id: job_id.clone(),
            status: report.status,
            progress: high_water,
            message: report.message.clone(),
            current_iteration: report.current_iteration,
        });

        if report.status.is_terminal() {
            return finish_terminal(
                api,
                &job_id,
                report.status,
                report.message,
                report.results_available,
            );
        }
    }
}

fn phase_for(status: JobStatus) -> JobPhase {
    match status {
        JobStatus::Completed => JobPhase::Completed,
        JobStatus::Failed => JobPhase::Failed,
        JobStatus::Cancelled => JobPhase::Cancelled,
        JobStatus::Error => JobPhase::Error,
        JobStatus::Queued | JobStatus::Running => JobPhase::Polling,
    }
}

fn finish_terminal(
    api: &dyn BackendApi,
    job_id: &str,
    status: JobStatus,
    message: Option<String>,
    results_available: Option<bool>,
) -> JobOutcome {
    match status {
        JobStatus::Completed => match api.optimization_results(job_id) {
            Ok(results) => JobOutcome::Completed {
                job_id: job_id.into(),
                results,
            },
            Err(e) => JobOutcome::Error {
                job_id: Some(job_id.into()),
                message: e.to_string(),
            },
        },
        JobStatus::Failed => JobOutcome::Failed {
            job_id: job_id.into(),
            message: message.unwrap_or_else(|| "optimization failed".into()),
        },
        JobStatus::Cancelled => {
            let results = if results_available == Some(true) {
                api.optimization_results(job_id).ok()
            } else {
                None
            };
            JobOutcome::Cancelled {
                job_id: job_id.into(),
                results,
            }
        }
        JobStatus::Error => JobOutcome::Error {
            job_id: Some(job_id.into()),
            message: message.unwrap_or_else(|| "optimization error".into()),
        },
        JobStatus::Queued | JobStatus::Running => unreachable!("non-terminal status"),
    }
}

/// Dispatch the cancel RPC and stop locally no matter what comes back.
/// When the server reports a successful cancel with results available, the
/// partial result set is fetched before returning.
fn cancel_job(api: &dyn BackendApi, job_id: &str) -> JobOutcome {
    match api.cancel_optimization(job_id) {
        Ok(reply) => {
            let results = if reply.status == CancelDisposition::CancelledSuccessfully
                && reply.results_available == Some(true)
            {
                api.optimization_results(job_id).ok()
            } else {
                None
            };
            JobOutcome::Cancelled {
                job_id: job_id.into(),
                results,
            }
        }
        Err(_) => JobOutcome::Cancelled {
            job_id: job_id.into(),
            results: None,
        },
    }
}

/// Sleep in short slices so a cancel takes effect promptly. Returns true if
/// cancelled during the wait.
pub(crate) fn sleep_with_cancel(total: Duration, cancel: &AtomicBool) -> bool {
    const SLICE: Duration = Duration::from_millis(100);
    let mut remaining = total;
    while !remaining.is_zero() {
        if cancel.load(Ordering::Relaxed) {
            return true;
        }
        let nap = remaining.min(SLICE);
        std::thread::sleep(nap);
        remaining = remaining.saturating_sub(nap);
    }
    cancel.load(Ordering::Relaxed)
}

/// Download the results CSV. The caller picks the directory; the file name
/// is always derived from the job id.
pub fn download_results(
    api: &dyn BackendApi,
    job_id: &str,
    dest_dir: &std::path::Path,
) -> Result<std::path::PathBuf, ApiError> {
    let bytes = api.download_results_csv(job_id)?;
    crate::export::save_results_csv(dest_dir, job_id, &bytes).map_err(|e| ApiError::Decode {
        operation: "download results CSV",
        message: e.to_string(),
    })
}
