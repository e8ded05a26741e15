//! Backend API client — trait seam plus the blocking HTTP implementation.
//!
//! The trait exists so orchestration code can run against a scripted
//! in-memory server in tests. `HttpApi` is stateless and idempotent per
//! call; retries are the caller's responsibility.

pub mod types;

pub use types::*;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::domain::instrument::SymbolEntry;
use crate::schema::{self, StrategyDescriptor};

/// Structured error body the server attaches to non-2xx responses. Field
/// spelling varies by endpoint revision.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ErrorBody {
    /// Best available human-readable message, in preference order.
    pub fn text(&self) -> Option<&str> {
        self.detail
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_message.as_deref())
    }
}

/// Error kinds a backend call can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{operation}: network error: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("{operation}: HTTP {status}: {}", .body.as_ref().and_then(|b| b.text()).unwrap_or(.text.as_str()))]
    Api {
        operation: &'static str,
        status: u16,
        body: Option<ErrorBody>,
        text: String,
    },

    #[error("{operation}: bad response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

impl ApiError {
    /// The server-provided message, when the failure carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Api { body, .. } => body.as_ref().and_then(|b| b.text()),
            _ => None,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            ApiError::Transport { operation, .. }
            | ApiError::Api { operation, .. }
            | ApiError::Decode { operation, .. } => operation,
        }
    }
}

/// The nine backend operations. One method per endpoint; no hidden state.
pub trait BackendApi: Send + Sync {
    fn available_strategies(&self) -> Result<Vec<StrategyDescriptor>, ApiError>;

    fn symbols(&self, exchange: &str) -> Result<Vec<SymbolEntry>, ApiError>;

    fn chart_data(&self, request: &ChartRequest) -> Result<ChartDataResponse, ApiError>;

    fn run_backtest(&self, request: &BacktestRequest) -> Result<BacktestReport, ApiError>;

    fn start_optimization(&self, request: &OptimizationRequest) -> Result<JobTicket, ApiError>;

    fn optimization_status(&self, job_id: &str) -> Result<JobStatusReport, ApiError>;

    fn optimization_results(&self, job_id: &str) -> Result<OptimizationResultSet, ApiError>;

    /// Raw CSV bytes; the caller decides where they land on disk.
    fn download_results_csv(&self, job_id: &str) -> Result<Vec<u8>, ApiError>;

    fn cancel_optimization(&self, job_id: &str) -> Result<CancelReply, ApiError>;
}

/// Blocking HTTP implementation of [`BackendApi`].
pub struct HttpApi {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T, ApiError> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .map_err(|e| ApiError::Transport {
                operation,
                message: e.to_string(),
            })?;
        Self::decode(operation, resp)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .map_err(|e| ApiError::Transport {
                operation,
                message: e.to_string(),
            })?;
        Self::decode(operation, resp)
    }

    fn decode<T: DeserializeOwned>(
        operation: &'static str,
        resp: reqwest::blocking::Response,
    ) -> Result<T, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            let body = serde_json::from_str::<ErrorBody>(&text).ok();
            return Err(ApiError::Api {
                operation,
                status: status.as_u16(),
                body,
                text,
            });
        }
        resp.json::<T>().map_err(|e| ApiError::Decode {
            operation,
            message: e.to_string(),
        })
    }
}

impl BackendApi for HttpApi {
    fn available_strategies(&self) -> Result<Vec<StrategyDescriptor>, ApiError> {
        const OP: &str = "list strategies";
        let resp: StrategyListResponse = self.get_json(OP, "/strategies/available")?;
        let strategies: Vec<StrategyDescriptor> =
            resp.strategies.into_iter().map(|s| s.resolve()).collect();
        schema::ensure_unique_ids(&strategies).map_err(|e| ApiError::Decode {
            operation: OP,
            message: e.to_string(),
        })?;
        Ok(strategies)
    }

    fn symbols(&self, exchange: &str) -> Result<Vec<SymbolEntry>, ApiError> {
        let resp: SymbolListResponse =
            self.get_json("list symbols", &format!("/symbols/{exchange}"))?;
        Ok(resp.symbols)
    }

    fn chart_data(&self, request: &ChartRequest) -> Result<ChartDataResponse, ApiError> {
        self.post_json("load chart data", "/chart_data_with_strategy", request)
    }

    fn run_backtest(&self, request: &BacktestRequest) -> Result<BacktestReport, ApiError> {
        self.post_json("run backtest", "/backtest/run", request)
    }

    fn start_optimization(&self, request: &OptimizationRequest) -> Result<JobTicket, ApiError> {
        self.post_json("start optimization", "/optimize/start", request)
    }

    fn optimization_status(&self, job_id: &str) -> Result<JobStatusReport, ApiError> {
        self.get_json("poll optimization", &format!("/optimize/status/{job_id}"))
    }

    fn optimization_results(&self, job_id: &str) -> Result<OptimizationResultSet, ApiError> {
        self.get_json(
            "fetch optimization results",
            &format!("/optimize/results/{job_id}"),
        )
    }

    fn download_results_csv(&self, job_id: &str) -> Result<Vec<u8>, ApiError> {
        const OP: &str = "download results CSV";
        let resp = self
            .client
            .get(self.url(&format!("/optimize/results/{job_id}/download")))
            .send()
            .map_err(|e| ApiError::Transport {
                operation: OP,
                message: e.to_string(),
            })?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            let body = serde_json::from_str::<ErrorBody>(&text).ok();
            return Err(ApiError::Api {
                operation: OP,
                status: status.as_u16(),
                body,
                text,
            });
        }
        let bytes = resp.bytes().map_err(|e| ApiError::Decode {
            operation: OP,
            message: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }

    fn cancel_optimization(&self, job_id: &str) -> Result<CancelReply, ApiError> {
        self.post_json(
            "cancel optimization",
            &format!("/optimize/cancel/{job_id}"),
            &serde_json::json!({}),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_preference_order() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"detail": "detail wins", "message": "m", "error_message": "em"}"#,
        )
        .unwrap();
        assert_eq!(body.text(), Some("detail wins"));

        let body: ErrorBody =
            serde_json::from_str(r#"{"message": "m", "error_message": "em"}"#).unwrap();
        assert_eq!(body.text(), Some("m"));

        let body: ErrorBody = serde_json::from_str(r#"{"error_message": "em"}"#).unwrap();
        assert_eq!(body.text(), Some("em"));
    }

    #[test]
    fn api_error_display_uses_server_message() {
        let err = ApiError::Api {
            operation: "start optimization",
            status: 422,
            body: Some(ErrorBody {
                detail: Some("invalid range".into()),
                message: None,
                error_message: None,
            }),
            text: "{...}".into(),
        };
        let shown = err.to_string();
        assert!(shown.contains("start optimization"));
        assert!(shown.contains("422"));
        assert!(shown.contains("invalid range"));
        assert_eq!(err.server_message(), Some("invalid range"));
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let api = HttpApi::new("http://localhost:8000/");
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.url("/symbols/NSE"), "http://localhost:8000/symbols/NSE");
    }
}
