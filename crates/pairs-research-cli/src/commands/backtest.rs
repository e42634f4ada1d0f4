use std::path::Path;
use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use pairs_research_core::backtest::{backtest, summarize};
use pairs_research_core::pipeline::{DEFAULT_COST, DEFAULT_ZSCORE_WINDOW};
use pairs_research_core::signals::{compute_spread, compute_zscore, generate_signals, SignalThresholds};
use pairs_research_core::Position;

use super::{load_panel_args, resolve_pair, PairArgs, PanelArgs};
use crate::output::export;

/// Arguments for a threshold-rule backtest of a pair spread
#[derive(Args)]
pub struct BacktestArgs {
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

    /// Fee per leg for every period a position is held
    #[arg(long, default_value_t = DEFAULT_COST)]
    pub cost: Decimal,

    /// Write `date,pnl,cumulative_pnl` to this CSV file
    #[arg(long)]
    pub out: Option<String>,
}

#[derive(Serialize)]
struct PnlRow {
    date: NaiveDate,
    /// Position carried into this period
    position: Position,
    pnl: Decimal,
    cumulative_pnl: Decimal,
}

#[derive(Serialize)]
struct BacktestOutput {
    pair: String,
    hedge_ratio: Decimal,
    total_pnl: Decimal,
    sharpe_ratio: Decimal,
    max_drawdown: Decimal,
    periods_in_market: usize,
    win_rate: Decimal,
    rows: Vec<PnlRow>,
}

pub fn run_backtest(args: BacktestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let thresholds = SignalThresholds::new(args.entry, args.exit)?;
    let loaded = load_panel_args(&args.panel)?;
    let pair = resolve_pair(&loaded.panel, &args.pair)?;

    let spread = compute_spread(&pair.y, &pair.x, pair.beta)?;
    let zscore = compute_zscore(&spread, args.window)?;
    let signals = generate_signals(&zscore, &thresholds)?;
    let pnl = backtest(&pair.y, &pair.x, pair.beta, &signals, args.cost)?;
    let summary = summarize(&pnl, &signals)?;

    if let Some(ref out) = args.out {
        let path = Path::new(out);
        export::write_pnl(&pnl, &summary.cumulative_pnl, path)?;
        info!(path = %path.display(), rows = pnl.len(), "pnl written");
    }

    let rows = pnl
        .iter()
        .zip(signals.values())
        .zip(summary.cumulative_pnl.values())
        .map(|(((date, p), position), c)| PnlRow {
            date,
            position: *position,
            pnl: *p,
            cumulative_pnl: *c,
        })
        .collect();

    let output = BacktestOutput {
        pair: pair.label(),
        hedge_ratio: pair.beta,
        total_pnl: summary.total_pnl,
        sharpe_ratio: summary.sharpe_ratio.round_dp(6),
        max_drawdown: summary.max_drawdown,
        periods_in_market: summary.periods_in_market,
        win_rate: summary.win_rate.round_dp(6),
        rows,
    };

    super::envelope(
        "Position decided at t-1 earns pos * (dy - beta * dx) over t, less 2 * cost * |pos|",
        &json!({
            "y": args.pair.y,
            "x": args.pair.x,
            "beta": pair.beta,
            "window": args.window,
            "thresholds": thresholds,
            "cost": args.cost,
        }),
        loaded.warnings(),
        start,
        output,
    )
}
