//! Run-request builder — the only place request bodies are assembled.
//!
//! Everything the server sees goes through here: type coercion, the
//! `day` → `D` timeframe rewrite, date formatting, and the pre-dispatch
//! range validation that names the offending parameter.

use thiserror::Error;

use crate::api::types::{BacktestRequest, ChartRequest, OptimizationRequest, ParameterRange};
use crate::domain::context::RunContext;
use crate::domain::dates;
use crate::forms::{FieldValue, RangeInput, ReadOutcome};
use crate::schema::{ParamMap, ParamType, ParameterDescriptor};

/// Why a request could not be built. Nothing is dispatched when building
/// fails; the message is shown to the user as-is.
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("select an instrument first")]
    MissingInstrument,

    #[error("select a strategy first")]
    MissingStrategy,

    #[error("invalid range for parameter '{name}': {reason}")]
    InvalidRange { name: String, reason: String },
}

/// Merge a form read with the last-known context values and descriptor
/// defaults: a specified value wins, then the context, then the default.
pub fn resolve_params(
    descriptors: &[ParameterDescriptor],
    outcome: &ReadOutcome,
    last_known: &ParamMap,
) -> ParamMap {
    let mut params = ParamMap::new();
    for d in descriptors {
        let value = match outcome.values.get(&d.name) {
            Some(FieldValue::Value(v)) => v.clone(),
            _ => last_known
                .get(&d.name)
                .and_then(|v| v.coerce(d.param_type))
                .unwrap_or_else(|| d.typed_default()),
        };
        params.insert(d.name.clone(), value);
    }
    params
}

/// Chart request. `strategy_params` is empty exactly when no strategy is
/// selected (a raw OHLC request).
pub fn chart_request(ctx: &RunContext) -> Result<ChartRequest, RequestError> {
    if !ctx.has_instrument() {
        return Err(RequestError::MissingInstrument);
    }
    let strategy_params = match &ctx.strategy_id {
        Some(_) => ctx.strategy_params.clone(),
        None => ParamMap::new(),
    };
    Ok(ChartRequest {
        exchange: ctx.exchange.clone(),
        token: ctx.token.clone(),
        timeframe: ctx.timeframe.wire_token().into(),
        strategy_id: ctx.strategy_id.clone(),
        strategy_params,
        start_date: dates::wire_date(ctx.start_date),
        end_date: dates::wire_date(ctx.end_date),
    })
}

/// Raw OHLC variant of the chart request, used to observe dataset length
/// without running a strategy.
pub fn raw_chart_request(ctx: &RunContext) -> Result<ChartRequest, RequestError> {
    let mut bare = ctx.clone();
    bare.strategy_id = None;
    bare.strategy_params = ParamMap::new();
    chart_request(&bare)
}

/// Backtest request. A strategy is mandatory here.
pub fn backtest_request(ctx: &RunContext) -> Result<BacktestRequest, RequestError> {
    if !ctx.has_instrument() {
        return Err(RequestError::MissingInstrument);
    }
    let strategy_id = ctx
        .strategy_id
        .clone()
        .ok_or(RequestError::MissingStrategy)?;
    Ok(BacktestRequest {
        strategy_id,
        exchange: ctx.exchange.clone(),
        token: ctx.token.clone(),
        start_date: dates::wire_date(ctx.start_date),
        end_date: dates::wire_date(ctx.end_date),
        timeframe: ctx.timeframe.wire_token().into(),
        initial_capital: ctx.initial_capital,
        parameters: ctx.strategy_params.clone(),
    })
}

/// Fill unspecified range parts from the descriptor, then validate. All
/// checks run before anything is dispatched.
pub fn resolve_ranges(
    descriptors: &[ParameterDescriptor],
    raw: &[RangeInput],
) -> Result<Vec<ParameterRange>, RequestError> {
    let mut ranges = Vec::with_capacity(raw.len());
    for input in raw {
        let d = descriptors
            .iter()
            .find(|d| d.name == input.name)
            .ok_or_else(|| RequestError::InvalidRange {
                name: input.name.clone(),
                reason: "unknown parameter".into(),
            })?;
        let default = d.typed_default().as_f64().unwrap_or(0.0);
        let start = input.start.or(d.min_value).unwrap_or(default);
        let end = input.end.or(d.max_value).unwrap_or(default);
        let step = input.step.or(d.step).unwrap_or(1.0);

        validate_range(&d.name, d.param_type, start, end, step)?;
        ranges.push(ParameterRange {
            name: d.name.clone(),
            start_value: start,
            end_value: end,
            step,
        });
    }
    Ok(ranges)
}

fn validate_range(
    name: &str,
    ty: ParamType,
    start: f64,
    end: f64,
    step: f64,
) -> Result<(), RequestError> {
    let fail = |reason: String| {
        Err(RequestError::InvalidRange {
            name: name.into(),
            reason,
        })
    };
    if !start.is_finite() || !end.is_finite() || !step.is_finite() {
        return fail("values must be finite".into());
    }
    if step <= 0.0 {
        return fail(format!("step {step} must be positive"));
    }
    if start > end {
        return fail(format!("start {start} exceeds end {end}"));
    }
    if ty == ParamType::Integer
        && (start.fract() != 0.0 || end.fract() != 0.0 || step.fract() != 0.0)
    {
        return fail("integer parameter requires whole-number bounds and step".into());
    }
    Ok(())
}

/// Optimization request over already-validated ranges.
pub fn optimization_request(
    ctx: &RunContext,
    ranges: Vec<ParameterRange>,
) -> Result<OptimizationRequest, RequestError> {
    if !ctx.has_instrument() {
        return Err(RequestError::MissingInstrument);
    }
    let strategy_id = ctx
        .strategy_id
        .clone()
        .ok_or(RequestError::MissingStrategy)?;
    Ok(OptimizationRequest {
        strategy_id,
        exchange: ctx.exchange.clone(),
        token: ctx.token.clone(),
        start_date: dates::wire_date(ctx.start_date),
        end_date: dates::wire_date(ctx.end_date),
        timeframe: ctx.timeframe.wire_token().into(),
        initial_capital: ctx.initial_capital,
        parameter_ranges: ranges,
        metric_to_optimize: ctx.metric_to_optimize.clone(),
    })
}
