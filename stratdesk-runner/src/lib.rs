//! StratDesk Runner — orchestration on top of the backend API.
//!
//! Three concerns live here:
//! - the optimization job lifecycle (submit → poll → terminal → results)
//! - the dashboard auto-tune flow (range synthesis + bounded polling)
//! - result export (server CSV download, local trade/equity CSVs)

pub mod autotune;
pub mod export;
pub mod job;

pub use autotune::{run_auto_tune, synthesize_ranges, AutoTuneConfig, AutoTuneOutcome};
pub use job::{run_optimization, JobConfig, JobOutcome, JobPhase, JobProgress};
