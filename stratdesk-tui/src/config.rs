//! App configuration — TOML file with defaults for every field, so a
//! missing or corrupt file never blocks startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use stratdesk_runner::autotune::AutoTuneConfig;
use stratdesk_runner::job::JobConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend server origin.
    pub base_url: String,
    /// Where downloaded results CSVs land.
    pub download_dir: PathBuf,
    /// Render the full ranked optimization table in addition to the
    /// best-result summary.
    pub show_results_table: bool,
    /// Auto-tune on every (symbol, strategy, timeframe) change on the
    /// dashboard; off means auto-tune runs only on its key.
    pub auto_tune_on_select: bool,
    /// Optimization status poll cadence, seconds.
    pub poll_interval_secs: u64,
    /// Auto-tune poll cadence, seconds.
    pub auto_tune_poll_secs: u64,
    /// Auto-tune poll budget; attempts × cadence bounds the wait.
    pub auto_tune_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            download_dir: PathBuf::from("results"),
            show_results_table: true,
            auto_tune_on_select: true,
            poll_interval_secs: 3,
            auto_tune_poll_secs: 2,
            auto_tune_attempts: 60,
        }
    }
}

impl AppConfig {
    pub fn job_config(&self) -> JobConfig {
        JobConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_polls: None,
        }
    }

    pub fn auto_tune_config(&self) -> AutoTuneConfig {
        AutoTuneConfig {
            attempts: self.auto_tune_attempts,
            poll_interval: Duration::from_secs(self.auto_tune_poll_secs),
            ..AutoTuneConfig::default()
        }
    }
}

/// Default config location: `<config dir>/stratdesk/config.toml`.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stratdesk")
        .join("config.toml")
}

/// Load the config, falling back to defaults when the file is missing or
/// does not parse.
pub fn load(path: &Path) -> AppConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}
