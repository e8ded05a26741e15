//! Dashboard auto-tune: seed a strategy with recommended parameters by
//! running a short optimization over ranges synthesized from the strategy
//! descriptor and the actual dataset length.
//!
//! The flow is linear: pre-fetch raw OHLC to size the dataset, synthesize
//! one range per numeric parameter, submit, poll inside a hard budget, and
//! either install the winning tuple or fall back to descriptor defaults.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use chrono::NaiveDate;

use stratdesk_core::api::{BackendApi, ParameterRange};
use stratdesk_core::domain::context::RunContext;
use stratdesk_core::domain::dates;
use stratdesk_core::request;
use stratdesk_core::schema::{ParamMap, ParamType, ParameterDescriptor, StrategyDescriptor};

use crate::job::{run_optimization, JobConfig, JobOutcome, JobProgress};

/// Budget and window knobs. Production: 60 polls at 2 s (two minutes) over
/// a trailing-year window, 252-bar fallback when the pre-fetch fails.
#[derive(Debug, Clone)]
pub struct AutoTuneConfig {
    pub attempts: u32,
    pub poll_interval: Duration,
    pub lookback_days: i64,
    pub fallback_dataset_len: usize,
}

impl Default for AutoTuneConfig {
    fn default() -> Self {
        Self {
            attempts: 60,
            poll_interval: Duration::from_secs(2),
            lookback_days: 365,
            fallback_dataset_len: 252,
        }
    }
}

/// What auto-tune produced. Either way `params` is a complete, typed map
/// ready to install into the context.
#[derive(Debug)]
pub enum AutoTuneOutcome {
    Applied {
        job_id: String,
        params: ParamMap,
        dataset_len: usize,
    },
    FellBack {
        reason: String,
        params: ParamMap,
    },
}

impl AutoTuneOutcome {
    pub fn params(&self) -> &ParamMap {
        match self {
            AutoTuneOutcome::Applied { params, .. } => params,
            AutoTuneOutcome::FellBack { params, .. } => params,
        }
    }

    pub fn applied(&self) -> bool {
        matches!(self, AutoTuneOutcome::Applied { .. })
    }
}

/// Synthesize one optimization range per numeric parameter.
///
/// - names containing "slow" are bounded above by ⌊n/3⌋, "fast" by ⌊n/5⌋;
///   the dataset-derived bound is authoritative there, the descriptor min
///   still seeds the start
/// - names ending `_pct` scan [0, 0.5] step 0.05 unless the descriptor
///   provides its own bounds
/// - everything else scans [default − 5·step, default + 10·step] clipped to
///   the descriptor bounds, with period-like names floored at 1
/// - integer parameters get whole-number endpoints and a step of at least 1
/// - a range that inverts after rounding collapses to a single point
pub fn synthesize_ranges(descriptors: &[ParameterDescriptor], n: usize) -> Vec<ParameterRange> {
    descriptors
        .iter()
        .filter(|d| d.is_numeric())
        .map(|d| synthesize_one(d, n))
        .collect()
}

fn synthesize_one(d: &ParameterDescriptor, n: usize) -> ParameterRange {
    let integer = d.param_type == ParamType::Integer;
    let default = d.typed_default().as_f64().unwrap_or(0.0);
    let step0 = d.step.unwrap_or(1.0);
    let name = d.name.to_ascii_lowercase();

    let (mut start, mut end, mut step);
    if name.ends_with("_pct") {
        start = d.min_value.unwrap_or(0.0);
        end = d.max_value.unwrap_or(0.5);
        step = d.step.unwrap_or(0.05);
    } else if name.contains("slow") || name.contains("fast") {
        let cap = if name.contains("slow") { n / 3 } else { n / 5 };
        start = d
            .min_value
            .unwrap_or_else(|| (default - 5.0 * step0).max(2.0));
        end = cap as f64;
        step = step0;
    } else {
        start = default - 5.0 * step0;
        end = default + 10.0 * step0;
        if let Some(min) = d.min_value {
            start = start.max(min);
        }
        if let Some(max) = d.max_value {
            end = end.min(max);
        }
        if is_period_like(&name) {
            start = start.max(1.0);
        }
        step = step0;
    }

    if integer {
        start = start.round();
        end = end.round();
        step = step.ceil().max(1.0);
    }
    if !(step > 0.0) || !step.is_finite() {
        step = if integer { 1.0 } else { 0.05 };
    }
    if end < start {
        end = start;
    }

    ParameterRange {
        name: d.name.clone(),
        start_value: start,
        end_value: end,
        step,
    }
}

fn is_period_like(name: &str) -> bool {
    name.contains("period") || name.contains("window") || name.contains("length")
}

/// Run the full auto-tune flow. Every failure path falls back to the
/// descriptor defaults with a reason the UI can show.
pub fn run_auto_tune(
    api: &dyn BackendApi,
    ctx: &RunContext,
    strategy: &StrategyDescriptor,
    today: NaiveDate,
    cfg: &AutoTuneConfig,
    cancel: &AtomicBool,
    progress: Option<&dyn Fn(&JobProgress)>,
) -> AutoTuneOutcome {
    let defaults = strategy.default_params();
    let fall_back = |reason: String| AutoTuneOutcome::FellBack {
        reason,
        params: defaults.clone(),
    };

    if !strategy.has_numeric_parameters() {
        return fall_back("strategy has no numeric parameters".into());
    }
    if !ctx.has_instrument() {
        return fall_back("no instrument selected".into());
    }

    let mut tune_ctx = ctx.clone();
    tune_ctx.strategy_id = Some(strategy.id.clone());
    let (start, end) = dates::lookback_window(today, cfg.lookback_days);
    tune_ctx.start_date = start;
    tune_ctx.end_date = end;

    // Pre-fetch raw OHLC to observe the real dataset length.
    let dataset_len = match request::raw_chart_request(&tune_ctx) {
        Ok(req) => match api.chart_data(&req) {
            Ok(resp) if !resp.ohlc_data.is_empty() => resp.ohlc_data.len(),
            _ => cfg.fallback_dataset_len,
        },
        Err(_) => cfg.fallback_dataset_len,
    };

    let ranges = synthesize_ranges(&strategy.parameters, dataset_len);
    let opt_request = match request::optimization_request(&tune_ctx, ranges) {
        Ok(r) => r,
        Err(e) => return fall_back(e.to_string()),
    };

    let job_cfg = JobConfig {
        poll_interval: cfg.poll_interval,
        max_polls: Some(cfg.attempts),
    };

    match run_optimization(api, &opt_request, &job_cfg, cancel, progress) {
        JobOutcome::Completed { job_id, results } => {
            let Some(best) = results.best_result else {
                return fall_back("optimization returned no best result".into());
            };
            let mut params = ParamMap::new();
            for d in &strategy.parameters {
                let value = best
                    .parameters
                    .get(&d.name)
                    .and_then(|v| v.coerce(d.param_type))
                    .unwrap_or_else(|| d.typed_default());
                params.insert(d.name.clone(), value);
            }
            AutoTuneOutcome::Applied {
                job_id,
                params,
                dataset_len,
            }
        }
        JobOutcome::TimedOut { .. } => {
            fall_back("auto-tune did not finish within its polling budget".into())
        }
        JobOutcome::Failed { message, .. } => fall_back(message),
        JobOutcome::Cancelled { .. } => fall_back("auto-tune cancelled".into()),
        JobOutcome::Error { message, .. } => fall_back(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratdesk_core::schema::ParamValue;

    fn descriptor(
        name: &str,
        ty: ParamType,
        default: ParamValue,
        min: Option<f64>,
        max: Option<f64>,
        step: Option<f64>,
    ) -> ParameterDescriptor {
        ParameterDescriptor {
            name: name.into(),
            param_type: ty,
            default,
            min_value: min,
            max_value: max,
            step,
        }
    }

    #[test]
    fn fast_and_slow_bounds_follow_dataset_length() {
        let ds = vec![
            descriptor(
                "fast_ema_period",
                ParamType::Integer,
                ParamValue::Int(10),
                Some(2.0),
                Some(50.0),
                Some(1.0),
            ),
            descriptor(
                "slow_ema_period",
                ParamType::Integer,
                ParamValue::Int(30),
                Some(5.0),
                Some(100.0),
                Some(1.0),
            ),
        ];
        let ranges = synthesize_ranges(&ds, 300);
        assert_eq!(
            ranges[0],
            ParameterRange {
                name: "fast_ema_period".into(),
                start_value: 2.0,
                end_value: 60.0,
                step: 1.0
            }
        );
        assert_eq!(
            ranges[1],
            ParameterRange {
                name: "slow_ema_period".into(),
                start_value: 5.0,
                end_value: 100.0,
                step: 1.0
            }
        );
    }

    #[test]
    fn pct_parameters_scan_a_half_unless_overridden() {
        let ds = vec![
            descriptor(
                "stop_loss_pct",
                ParamType::Float,
                ParamValue::Float(0.02),
                None,
                None,
                None,
            ),
            descriptor(
                "target_pct",
                ParamType::Float,
                ParamValue::Float(0.1),
                Some(0.05),
                Some(0.3),
                Some(0.01),
            ),
        ];
        let ranges = synthesize_ranges(&ds, 252);
        assert_eq!(ranges[0].start_value, 0.0);
        assert_eq!(ranges[0].end_value, 0.5);
        assert_eq!(ranges[0].step, 0.05);
        assert_eq!(ranges[1].start_value, 0.05);
        assert_eq!(ranges[1].end_value, 0.3);
        assert_eq!(ranges[1].step, 0.01);
    }

    #[test]
    fn generic_parameters_span_default_neighborhood() {
        let ds = vec![descriptor(
            "rsi_period",
            ParamType::Integer,
            ParamValue::Int(14),
            Some(2.0),
            Some(30.0),
            Some(1.0),
        )];
        let ranges = synthesize_ranges(&ds, 252);
        // default − 5·step = 9, default + 10·step = 24, inside [2, 30].
        assert_eq!(ranges[0].start_value, 9.0);
        assert_eq!(ranges[0].end_value, 24.0);
    }

    #[test]
    fn period_names_are_floored_positive() {
        let ds = vec![descriptor(
            "lookback_window",
            ParamType::Integer,
            ParamValue::Int(3),
            None,
            None,
            Some(1.0),
        )];
        let ranges = synthesize_ranges(&ds, 252);
        // default − 5·step would be −2; period-like names floor at 1.
        assert_eq!(ranges[0].start_value, 1.0);
        assert_eq!(ranges[0].end_value, 13.0);
    }

    #[test]
    fn inverted_range_collapses_to_a_point() {
        let ds = vec![descriptor(
            "fast_len",
            ParamType::Integer,
            ParamValue::Int(10),
            Some(40.0),
            None,
            Some(1.0),
        )];
        // n/5 = 6 < start 40.
        let ranges = synthesize_ranges(&ds, 30);
        assert_eq!(ranges[0].start_value, 40.0);
        assert_eq!(ranges[0].end_value, 40.0);
    }

    #[test]
    fn integer_step_rounds_up_to_one() {
        let ds = vec![descriptor(
            "atr_period",
            ParamType::Integer,
            ParamValue::Int(14),
            None,
            None,
            Some(0.5),
        )];
        let ranges = synthesize_ranges(&ds, 252);
        assert_eq!(ranges[0].step, 1.0);
    }

    #[test]
    fn every_synthesized_range_is_well_formed() {
        let ds = vec![
            descriptor("fast_sma", ParamType::Integer, ParamValue::Int(5), None, None, None),
            descriptor("slow_sma", ParamType::Integer, ParamValue::Int(50), None, None, None),
            descriptor("band_pct", ParamType::Float, ParamValue::Float(0.1), None, None, None),
            descriptor("threshold", ParamType::Float, ParamValue::Float(-1.0), None, None, Some(0.25)),
        ];
        for n in [0usize, 1, 10, 252, 5000] {
            for r in synthesize_ranges(&ds, n) {
                assert!(r.step > 0.0, "{}: step {}", r.name, r.step);
                assert!(r.start_value <= r.end_value, "{}", r.name);
                assert!(r.start_value.is_finite() && r.end_value.is_finite());
            }
        }
    }

    proptest::proptest! {
        /// The well-formedness invariant holds for arbitrary defaults,
        /// steps, and dataset lengths, across all three naming rules.
        #[test]
        fn synthesis_is_well_formed_for_arbitrary_inputs(
            n in 0usize..5000,
            default in -50i64..500,
            step in 1u32..20,
            name_kind in 0u8..4,
        ) {
            let name = match name_kind {
                0 => "fast_len",
                1 => "slow_len",
                2 => "target_pct",
                _ => "atr_period",
            };
            let d = descriptor(
                name,
                ParamType::Integer,
                ParamValue::Int(default),
                None,
                None,
                Some(step as f64),
            );
            let ranges = synthesize_ranges(&[d], n);
            proptest::prop_assert_eq!(ranges.len(), 1);
            let r = &ranges[0];
            proptest::prop_assert!(r.step > 0.0);
            proptest::prop_assert!(r.start_value <= r.end_value);
            proptest::prop_assert!(r.start_value.is_finite() && r.end_value.is_finite());
            proptest::prop_assert_eq!(r.start_value.fract(), 0.0);
            proptest::prop_assert_eq!(r.end_value.fract(), 0.0);
        }
    }

    #[test]
    fn booleans_and_strings_contribute_no_ranges() {
        let ds = vec![
            descriptor("long_only", ParamType::Boolean, ParamValue::Bool(true), None, None, None),
            descriptor("ma_kind", ParamType::String, ParamValue::Text("ema".into()), None, None, None),
            descriptor("fast_len", ParamType::Integer, ParamValue::Int(5), None, None, None),
        ];
        let ranges = synthesize_ranges(&ds, 252);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].name, "fast_len");
    }
}
