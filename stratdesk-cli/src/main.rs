//! StratDesk CLI — headless access to the backtesting server.
//!
//! Commands:
//! - `strategies` — list strategies and their parameter descriptors
//! - `symbols` — list tradeable symbols on an exchange
//! - `chart` — load chart data and print a summary
//! - `backtest` — run a backtest, print metrics, optionally export CSVs
//! - `optimize` — run an optimization end-to-end and download the CSV
//! - `cancel` — cancel a running optimization job

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use stratdesk_core::api::{BackendApi, HttpApi};
use stratdesk_core::domain::context::RunContext;
use stratdesk_core::domain::dates;
use stratdesk_core::domain::instrument;
use stratdesk_core::domain::timeframe::Timeframe;
use stratdesk_core::forms::RangeInput;
use stratdesk_core::request;
use stratdesk_core::schema::{ParamValue, StrategyDescriptor};
use stratdesk_runner::autotune::synthesize_ranges;
use stratdesk_runner::job::{run_optimization, JobConfig, JobOutcome, JobProgress};

#[derive(Parser)]
#[command(name = "stratdesk", about = "StratDesk CLI — remote backtest and optimization runner")]
struct Cli {
    /// Backend server origin.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    base_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SelectionArgs {
    /// Exchange code (NSE, BSE, NFO, MCX).
    #[arg(long, default_value = "NSE")]
    exchange: String,

    /// Backend instrument token.
    #[arg(long)]
    token: String,

    /// Bar period: 1min, 3min, 5min, 15min, 30min, 60min, day.
    #[arg(long, default_value = "day")]
    timeframe: String,

    /// Start date (YYYY-MM-DD). Defaults to one year back.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to the last weekday.
    #[arg(long)]
    end: Option<String>,

    /// Strategy id; omit for raw OHLC charts.
    #[arg(long)]
    strategy: Option<String>,

    /// Strategy parameter override, `name=value`. Repeatable.
    #[arg(long = "param")]
    params: Vec<String>,

    /// Initial capital.
    #[arg(long, default_value_t = 100_000.0)]
    capital: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// List available strategies and their parameters.
    Strategies,
    /// List tradeable symbols on an exchange.
    Symbols {
        exchange: String,
        /// Include entries outside the instrument whitelist.
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// Load chart data and print a summary.
    Chart {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Run a backtest and print its metrics.
    Backtest {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Export trades and equity CSVs into this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run an optimization end-to-end: start, poll, print the best run,
    /// download the results CSV.
    Optimize {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Range for one parameter, `name=start:end:step`. Repeatable;
        /// numeric parameters without an explicit range are synthesized
        /// from the dataset length.
        #[arg(long = "range")]
        ranges: Vec<String>,

        /// Metric the server ranks runs by.
        #[arg(long, default_value = "net_pnl")]
        metric: String,

        /// Directory for the downloaded results CSV.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Poll cadence in seconds.
        #[arg(long, default_value_t = 3)]
        poll_secs: u64,
    },
    /// Cancel a running optimization job.
    Cancel { job_id: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let api = HttpApi::new(cli.base_url.clone());

    match cli.command {
        Commands::Strategies => cmd_strategies(&api),
        Commands::Symbols { exchange, all } => cmd_symbols(&api, &exchange, all),
        Commands::Chart { selection } => cmd_chart(&api, selection),
        Commands::Backtest {
            selection,
            output_dir,
        } => cmd_backtest(&api, selection, output_dir),
        Commands::Optimize {
            selection,
            ranges,
            metric,
            output_dir,
            poll_secs,
        } => cmd_optimize(&api, selection, ranges, metric, output_dir, poll_secs),
        Commands::Cancel { job_id } => cmd_cancel(&api, &job_id),
    }
}

fn cmd_strategies(api: &HttpApi) -> Result<()> {
    let strategies = api.available_strategies()?;
    for s in &strategies {
        println!("{} — {}", s.id, s.name);
        for p in &s.parameters {
            let bounds = match (p.min_value, p.max_value) {
                (Some(min), Some(max)) => format!(" [{min}..{max}]"),
                (Some(min), None) => format!(" [{min}..]"),
                (None, Some(max)) => format!(" [..{max}]"),
                (None, None) => String::new(),
            };
            let step = p.step.map(|s| format!(" step {s}")).unwrap_or_default();
            println!(
                "    {:<24} {:?} default {}{bounds}{step}",
                p.name,
                p.param_type,
                p.typed_default()
            );
        }
    }
    println!("\n{} strategies", strategies.len());
    Ok(())
}

fn cmd_symbols(api: &HttpApi, exchange: &str, all: bool) -> Result<()> {
    let fetched = api.symbols(exchange)?;
    let shown = if all {
        fetched.clone()
    } else {
        instrument::filter_tradeable(&fetched)
    };
    for s in &shown {
        println!("{:<12} {:<28} {}", s.token, s.trading_symbol, s.instrument.label());
    }
    println!("\n{}/{} symbols shown on {exchange}", shown.len(), fetched.len());
    Ok(())
}

fn cmd_chart(api: &HttpApi, selection: SelectionArgs) -> Result<()> {
    let (ctx, _) = build_context(api, &selection)?;
    let req = request::chart_request(&ctx)?;
    let resp = api.chart_data(&req)?;
    if let Some(header) = &resp.chart_header_info {
        println!("{header}");
    }
    let data = resp.into_chart_data();
    println!(
        "{} bars, {} indicator series, {} markers",
        data.ohlc.len(),
        data.indicators.len(),
        data.markers.len()
    );
    for (name, points) in &data.indicators {
        println!("    {name}: {} points", points.len());
    }
    if data.dropped_points > 0 {
        eprintln!("warning: {} points dropped (bad timestamps)", data.dropped_points);
    }
    Ok(())
}

fn cmd_backtest(api: &HttpApi, selection: SelectionArgs, output_dir: Option<PathBuf>) -> Result<()> {
    let (ctx, _) = build_context(api, &selection)?;
    let req = request::backtest_request(&ctx)?;
    let report = api.run_backtest(&req)?;

    if let Some(err) = &report.error_message {
        bail!("backtest failed: {err}");
    }
    if let Some(summary) = &report.summary_message {
        println!("{summary}");
    }
    if let Some(metrics) = &report.performance_metrics {
        for (name, value) in metrics {
            println!("    {name:<24} {value}");
        }
    }
    let trades = report.trades.as_deref().unwrap_or(&[]);
    println!("{} trades", trades.len());

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let trades_csv = stratdesk_runner::export::export_trades_csv(trades)?;
        std::fs::write(dir.join("backtest_trades.csv"), trades_csv)?;
        if let Some(curve) = report.equity_curve.as_deref() {
            let (points, _) = stratdesk_core::api::types::normalize_points(curve);
            let equity_csv = stratdesk_runner::export::export_curve_csv(&points, "equity")?;
            std::fs::write(dir.join("backtest_equity.csv"), equity_csv)?;
        }
        println!("exported to {}", dir.display());
    }
    Ok(())
}

fn cmd_optimize(
    api: &HttpApi,
    selection: SelectionArgs,
    range_args: Vec<String>,
    metric: String,
    output_dir: PathBuf,
    poll_secs: u64,
) -> Result<()> {
    let (mut ctx, strategy) = build_context(api, &selection)?;
    let Some(strategy) = strategy else {
        bail!("--strategy is required for optimize");
    };
    ctx.metric_to_optimize = metric;

    let explicit = parse_range_args(&range_args)?;
    let ranges = if explicit.is_empty() {
        // No explicit ranges: synthesize from the actual dataset length.
        let raw_req = request::raw_chart_request(&ctx)?;
        let n = api
            .chart_data(&raw_req)
            .map(|r| r.ohlc_data.len())
            .unwrap_or(0);
        let n = if n == 0 { 252 } else { n };
        println!("synthesizing ranges from {n} bars");
        synthesize_ranges(&strategy.parameters, n)
    } else {
        let raw: Vec<RangeInput> = strategy
            .numeric_parameters()
            .map(|p| {
                explicit.get(&p.name).cloned().unwrap_or(RangeInput {
                    name: p.name.clone(),
                    start: None,
                    end: None,
                    step: None,
                })
            })
            .collect();
        request::resolve_ranges(&strategy.parameters, &raw)?
    };

    for r in &ranges {
        println!("    {}: [{} .. {}] step {}", r.name, r.start_value, r.end_value, r.step);
    }

    let req = request::optimization_request(&ctx, ranges)?;
    let cfg = JobConfig {
        poll_interval: std::time::Duration::from_secs(poll_secs),
        max_polls: None,
    };
    let cancel = AtomicBool::new(false);
    let on_progress = |p: &JobProgress| {
        println!(
            "[{}] {} {:.0}%{}",
            p.job_id,
            p.status.label(),
            p.progress,
            p.message.as_ref().map(|m| format!(" — {m}")).unwrap_or_default()
        );
    };

    match run_optimization(api, &req, &cfg, &cancel, Some(&on_progress)) {
        JobOutcome::Completed { job_id, results } => {
            println!("\ncompleted: {} runs", results.results.len());
            if let Some(best) = &results.best_result {
                println!("best parameters:");
                for (name, value) in &best.parameters {
                    println!("    {name} = {value}");
                }
                for (name, value) in &best.performance_metrics {
                    println!("    {name}: {value}");
                }
            }
            if results.has_results() {
                let path = stratdesk_runner::job::download_results(api, &job_id, &output_dir)?;
                println!("results CSV: {}", path.display());
            }
            Ok(())
        }
        JobOutcome::Failed { message, .. } => bail!("optimization failed: {message}"),
        JobOutcome::Cancelled { job_id, .. } => bail!("job {job_id} was cancelled"),
        JobOutcome::Error { message, .. } => bail!("optimization error: {message}"),
        JobOutcome::TimedOut { job_id, .. } => bail!("job {job_id} timed out"),
    }
}

fn cmd_cancel(api: &HttpApi, job_id: &str) -> Result<()> {
    let reply = api.cancel_optimization(job_id)?;
    println!("{:?}", reply.status);
    if let Some(message) = reply.message {
        println!("{message}");
    }
    if reply.results_available == Some(true) {
        println!("partial results are available: `optimize` download or the TUI can fetch them");
    }
    Ok(())
}

// ─── Argument plumbing ──────────────────────────────────────────────

/// Build a run context from CLI args, resolving the strategy descriptor so
/// parameter overrides coerce to their declared types.
fn build_context(
    api: &HttpApi,
    selection: &SelectionArgs,
) -> Result<(RunContext, Option<StrategyDescriptor>)> {
    let today = chrono::Local::now().date_naive();
    let mut ctx = RunContext::with_defaults(today);
    ctx.exchange = selection.exchange.clone();
    ctx.token = selection.token.clone();
    ctx.initial_capital = selection.capital;
    ctx.timeframe = Timeframe::parse(&selection.timeframe)
        .with_context(|| format!("unknown timeframe '{}'", selection.timeframe))?;

    let (default_start, default_end) = dates::lookback_window(today, 365);
    ctx.start_date = match &selection.start {
        Some(s) => parse_date(s)?,
        None => default_start,
    };
    ctx.end_date = match &selection.end {
        Some(s) => parse_date(s)?,
        None => default_end,
    };

    let strategy = match &selection.strategy {
        Some(id) => {
            let strategies = api.available_strategies()?;
            let descriptor = strategies
                .into_iter()
                .find(|s| s.id == *id)
                .with_context(|| format!("unknown strategy '{id}'"))?;
            ctx.strategy_id = Some(descriptor.id.clone());
            ctx.strategy_params = descriptor.default_params();
            apply_param_overrides(&mut ctx, &descriptor, &selection.params)?;
            Some(descriptor)
        }
        None => {
            if !selection.params.is_empty() {
                bail!("--param requires --strategy");
            }
            None
        }
    };

    Ok((ctx, strategy))
}

fn apply_param_overrides(
    ctx: &mut RunContext,
    strategy: &StrategyDescriptor,
    overrides: &[String],
) -> Result<()> {
    for pair in overrides {
        let (name, raw) = pair
            .split_once('=')
            .with_context(|| format!("expected name=value, got '{pair}'"))?;
        let descriptor = strategy
            .parameters
            .iter()
            .find(|p| p.name == name)
            .with_context(|| format!("strategy '{}' has no parameter '{name}'", strategy.id))?;
        let value = ParamValue::Text(raw.into())
            .coerce(descriptor.param_type)
            .with_context(|| format!("'{raw}' is not a valid {:?}", descriptor.param_type))?;
        ctx.strategy_params.insert(name.to_string(), value);
    }
    Ok(())
}

fn parse_range_args(args: &[String]) -> Result<BTreeMap<String, RangeInput>> {
    let mut out = BTreeMap::new();
    for arg in args {
        let (name, triple) = arg
            .split_once('=')
            .with_context(|| format!("expected name=start:end:step, got '{arg}'"))?;
        let parts: Vec<&str> = triple.split(':').collect();
        if parts.len() != 3 {
            bail!("expected name=start:end:step, got '{arg}'");
        }
        let parse = |s: &str| -> Result<f64> {
            s.parse::<f64>()
                .with_context(|| format!("'{s}' is not a number in '{arg}'"))
        };
        out.insert(
            name.to_string(),
            RangeInput {
                name: name.to_string(),
                start: Some(parse(parts[0])?),
                end: Some(parse(parts[1])?),
                step: Some(parse(parts[2])?),
            },
        );
    }
    Ok(out)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("'{s}' is not YYYY-MM-DD"))
}
