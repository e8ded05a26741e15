//! StratDesk Core — domain types and backend plumbing for the trading desk client.
//!
//! This crate contains everything the UI and CLI share:
//! - Strategy descriptors and typed parameter values
//! - Domain types (instruments, timeframes, run context, chart series)
//! - The parameter form engine (render descriptors to inputs, read them back)
//! - The run-request builder (chart / backtest / optimization shapes)
//! - The backend API client (trait + blocking HTTP implementation)

pub mod api;
pub mod domain;
pub mod forms;
pub mod request;
pub mod schema;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything that crosses the worker channel is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<schema::StrategyDescriptor>();
        require_sync::<schema::StrategyDescriptor>();
        require_send::<schema::ParamValue>();
        require_sync::<schema::ParamValue>();
        require_send::<domain::RunContext>();
        require_sync::<domain::RunContext>();
        require_send::<domain::ChartData>();
        require_sync::<domain::ChartData>();
        require_send::<api::OptimizationResultSet>();
        require_sync::<api::OptimizationResultSet>();
        require_send::<api::ApiError>();
        require_sync::<api::ApiError>();
        require_send::<api::HttpApi>();
        require_sync::<api::HttpApi>();
    }
}
