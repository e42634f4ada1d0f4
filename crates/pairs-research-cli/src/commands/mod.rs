pub mod backtest;
pub mod data;
pub mod research;
pub mod screen;
pub mod signals;

use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use pairs_research_core::cointegration::estimate_hedge_ratio;
use pairs_research_core::data::{load_panel, UnavailableSymbol};
use pairs_research_core::{with_metadata, PricePanel, TimeSeries};

use crate::input;
use crate::input::csv_panel::CsvPriceSource;

/// Where the price panel comes from.
#[derive(Args)]
pub struct PanelArgs {
    /// Merged panel CSV (`date` column followed by one column per symbol)
    #[arg(long, conflicts_with = "data_dir")]
    pub panel: Option<String>,

    /// Directory of per-symbol `<SYMBOL>.csv` close files
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Symbols to load from --data-dir, comma separated
    #[arg(long, value_delimiter = ',', default_values = ["ES=F", "NQ=F", "YM=F"])]
    pub symbols: Vec<String>,

    /// First date to load (inclusive)
    #[arg(long, default_value = "2015-01-01")]
    pub start: NaiveDate,

    /// Last date to load (exclusive)
    #[arg(long, default_value = "2024-12-31")]
    pub end: NaiveDate,
}

/// The two legs of a pair: the spread is `y - beta * x`.
#[derive(Args)]
pub struct PairArgs {
    /// Dependent leg symbol
    #[arg(long)]
    pub y: String,

    /// Hedge leg symbol
    #[arg(long)]
    pub x: String,

    /// Hedge ratio; estimated by OLS of y on x when omitted
    #[arg(long)]
    pub beta: Option<Decimal>,
}

/// A loaded panel plus the symbols that could not be loaded.
pub struct LoadedPanel {
    pub panel: PricePanel,
    pub unavailable: Vec<UnavailableSymbol>,
}

impl LoadedPanel {
    pub fn warnings(&self) -> Vec<String> {
        self.unavailable
            .iter()
            .map(|u| format!("{} unavailable: {}", u.symbol, u.reason))
            .collect()
    }
}

/// Legs of a pair taken from a panel, with the hedge ratio to use.
pub struct ResolvedPair {
    pub y: TimeSeries,
    pub x: TimeSeries,
    pub beta: Decimal,
}

impl ResolvedPair {
    pub fn label(&self) -> String {
        format!("{} & {}", self.y.name(), self.x.name())
    }
}

pub fn load_panel_args(args: &PanelArgs) -> Result<LoadedPanel, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.panel {
        let resolved = input::file::resolve_path(path)?;
        let panel = input::csv_panel::read_panel(&resolved)?;
        info!(path = %resolved.display(), symbols = panel.symbols().len(), rows = panel.len(), "panel read");
        Ok(LoadedPanel {
            panel,
            unavailable: Vec::new(),
        })
    } else if let Some(ref dir) = args.data_dir {
        let source = CsvPriceSource::new(dir);
        let load = load_panel(&source, &args.symbols, args.start, args.end)?;
        Ok(LoadedPanel {
            panel: load.panel,
            unavailable: load.unavailable,
        })
    } else {
        Err("--panel <merged.csv> or --data-dir <dir> required".into())
    }
}

pub fn resolve_pair(panel: &PricePanel, args: &PairArgs) -> Result<ResolvedPair, Box<dyn std::error::Error>> {
    let y = panel.series(&args.y)?;
    let x = panel.series(&args.x)?;
    let beta = match args.beta {
        Some(b) => b,
        None => {
            let b = estimate_hedge_ratio(&y, &x)?;
            info!(y = %args.y, x = %args.x, beta = %b.round_dp(6), "estimated hedge ratio");
            b
        }
    };
    Ok(ResolvedPair { y, x, beta })
}

/// Wrap a command result in the standard envelope and convert it to JSON.
pub fn envelope<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    start: Instant,
    result: T,
) -> Result<Value, Box<dyn std::error::Error>> {
    let elapsed = start.elapsed().as_micros() as u64;
    let output = with_metadata(methodology, assumptions, warnings, elapsed, result);
    Ok(serde_json::to_value(output)?)
}
