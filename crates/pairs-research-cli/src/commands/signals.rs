use std::path::Path;
use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use pairs_research_core::pipeline::DEFAULT_ZSCORE_WINDOW;
use pairs_research_core::signals::{
    compute_spread, compute_zscore, generate_signals, spread_table, SignalThresholds, SpreadRow,
};
use pairs_research_core::smt::{smt_divergence, DEFAULT_LOOKBACK};
use pairs_research_core::{Position, TimeSeries};

use super::{load_panel_args, resolve_pair, PairArgs, PanelArgs};
use crate::output::export;

/// Arguments for the rolling z-score of a pair spread
#[derive(Args)]
pub struct ZscoreArgs {
    #[command(flatten)]
    pub panel: PanelArgs,

    #[command(flatten)]
    pub pair: PairArgs,

    /// Rolling window length (observations)
    #[arg(long, default_value_t = DEFAULT_ZSCORE_WINDOW)]
    pub window: usize,

    /// Write `date,spread,z_score` to this CSV file
    #[arg(long)]
    pub out: Option<String>,
}

/// Arguments for threshold signals on a pair spread
#[derive(Args)]
pub struct SignalsArgs {
    #[command(flatten)]
    pub panel: PanelArgs,

    #[command(flatten)]
    pub pair: PairArgs,

    #[arg(long, default_value_t = DEFAULT_ZSCORE_WINDOW)]
    pub window: usize,

    /// |z| above which a position is opened
    #[arg(long)]
    pub entry: Decimal,

    /// |z| below which a position is closed
    #[arg(long)]
    pub exit: Decimal,
}

/// Arguments for SMT divergence between two instruments
#[derive(Args)]
pub struct SmtArgs {
    #[command(flatten)]
    pub panel: PanelArgs,

    /// Instrument expected to make the new high
    #[arg(long)]
    pub y: String,

    /// Instrument expected to confirm it
    #[arg(long)]
    pub x: String,

    /// Rolling-high window length
    #[arg(long, default_value_t = DEFAULT_LOOKBACK)]
    pub lookback: usize,
}

#[derive(Serialize)]
struct ZscoreOutput {
    pair: String,
    hedge_ratio: Decimal,
    window: usize,
    latest_z_score: Option<Decimal>,
    rows: Vec<SpreadRow>,
}

#[derive(Serialize)]
struct SignalRow {
    date: NaiveDate,
    z_score: Option<Decimal>,
    position: Position,
}

#[derive(Serialize)]
struct SignalsOutput {
    pair: String,
    hedge_ratio: Decimal,
    thresholds: SignalThresholds,
    latest_position: Position,
    rows: Vec<SignalRow>,
}

#[derive(Serialize)]
struct SmtRow {
    date: NaiveDate,
    y: Decimal,
    x: Decimal,
    divergence: bool,
}

#[derive(Serialize)]
struct SmtOutput {
    pair: String,
    lookback: usize,
    divergences: usize,
    rows: Vec<SmtRow>,
}

pub fn run_zscore(args: ZscoreArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let loaded = load_panel_args(&args.panel)?;
    let pair = resolve_pair(&loaded.panel, &args.pair)?;

    let spread = compute_spread(&pair.y, &pair.x, pair.beta)?;
    let zscore = compute_zscore(&spread, args.window)?;
    let rows = spread_table(&spread, &zscore)?;

    if let Some(ref out) = args.out {
        let path = Path::new(out);
        export::write_spread_table(&rows, path)?;
        info!(path = %path.display(), rows = rows.len(), "z-score table written");
    }

    let mut warnings = loaded.warnings();
    if spread.len() < args.window {
        warnings.push(format!(
            "{} observations is fewer than the {}-point window; every z-score is undefined",
            spread.len(),
            args.window
        ));
    }

    let output = ZscoreOutput {
        pair: pair.label(),
        hedge_ratio: pair.beta,
        window: args.window,
        latest_z_score: zscore.values().last().copied().flatten(),
        rows,
    };

    super::envelope(
        "Spread y - beta * x; trailing z-score with sample standard deviation",
        &json!({ "y": args.pair.y, "x": args.pair.x, "beta": pair.beta, "window": args.window }),
        warnings,
        start,
        output,
    )
}

pub fn run_signals(args: SignalsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let thresholds = SignalThresholds::new(args.entry, args.exit)?;
    let loaded = load_panel_args(&args.panel)?;
    let pair = resolve_pair(&loaded.panel, &args.pair)?;

    let spread = compute_spread(&pair.y, &pair.x, pair.beta)?;
    let zscore = compute_zscore(&spread, args.window)?;
    let signals = generate_signals(&zscore, &thresholds)?;

    let rows = signal_rows(&zscore, &signals);
    let output = SignalsOutput {
        pair: pair.label(),
        hedge_ratio: pair.beta,
        thresholds,
        latest_position: signals.values().last().copied().unwrap_or_default(),
        rows,
    };

    super::envelope(
        "Short above +entry, long below -entry, flat inside +/-exit, otherwise hold",
        &json!({ "y": args.pair.y, "x": args.pair.x, "beta": pair.beta, "window": args.window }),
        loaded.warnings(),
        start,
        output,
    )
}

pub fn run_smt(args: SmtArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let loaded = load_panel_args(&args.panel)?;
    let y = loaded.panel.series(&args.y)?;
    let x = loaded.panel.series(&args.x)?;

    let flags = smt_divergence(&y, &x, args.lookback)?;
    let rows: Vec<SmtRow> = flags
        .iter()
        .zip(y.values().iter().zip(x.values()))
        .map(|((date, divergence), (yv, xv))| SmtRow {
            date,
            y: *yv,
            x: *xv,
            divergence: *divergence,
        })
        .collect();

    let output = SmtOutput {
        pair: format!("{} & {}", args.y, args.x),
        lookback: args.lookback,
        divergences: rows.iter().filter(|r| r.divergence).count(),
        rows,
    };

    super::envelope(
        "Rolling-high divergence: y at its lookback high while x is below its own",
        &json!({ "y": args.y, "x": args.x, "lookback": args.lookback }),
        loaded.warnings(),
        start,
        output,
    )
}

fn signal_rows(zscore: &TimeSeries<Option<Decimal>>, signals: &TimeSeries<Position>) -> Vec<SignalRow> {
    zscore
        .iter()
        .zip(signals.values())
        .map(|((date, z), position)| SignalRow {
            date,
            z_score: *z,
            position: *position,
        })
        .collect()
}
