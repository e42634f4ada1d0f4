use std::time::Instant;

use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use pairs_research_core::cointegration::{self, ScreenerConfig};
use pairs_research_core::stats::{adf_test, AdfTestResult};

use super::{load_panel_args, PanelArgs};
use crate::output::export;

/// Arguments for the pairwise cointegration screen
#[derive(Args)]
pub struct ScreenArgs {
    #[command(flatten)]
    pub panel: PanelArgs,

    /// Accept pairs whose Engle-Granger p-value is below this level
    #[arg(long, default_value = "0.05")]
    pub significance: Decimal,

    /// Lag ceiling for the residual ADF regression
    #[arg(long)]
    pub max_lag: Option<usize>,

    /// Write the `pair,p_value,beta` summary to this CSV file
    #[arg(long)]
    pub summary_out: Option<String>,
}

/// Arguments for a single-series augmented Dickey-Fuller test
#[derive(Args)]
pub struct AdfArgs {
    #[command(flatten)]
    pub panel: PanelArgs,

    /// Panel column to test
    #[arg(long)]
    pub symbol: String,

    /// Lag ceiling for AIC lag selection
    #[arg(long)]
    pub max_lag: Option<usize>,
}

#[derive(Serialize)]
struct AdfOutput {
    symbol: String,
    #[serde(flatten)]
    test: AdfTestResult,
    /// Unit root rejected at 5%
    stationary_at_5pct: bool,
}

pub fn run_screen(args: ScreenArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let loaded = load_panel_args(&args.panel)?;
    let mut warnings = loaded.warnings();

    let config = ScreenerConfig {
        significance: args.significance,
        max_lag: args.max_lag,
    };
    let result = cointegration::find_cointegrated_pairs(&loaded.panel, &config)?;
    warnings.extend(
        result
            .rejected
            .iter()
            .filter(|r| r.is_non_actionable())
            .map(|r| format!("{} rejected: {}", r.label(), r.reason)),
    );

    if let Some(ref out) = args.summary_out {
        let path = std::path::Path::new(out);
        export::write_summary(&result.summary, path)?;
        info!(path = %path.display(), pairs = result.summary.len(), "summary written");
    }

    super::envelope(
        "Engle-Granger two-step cointegration test on every unordered pair (MacKinnon p-values)",
        &config,
        warnings,
        start,
        result,
    )
}

pub fn run_adf(args: AdfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let loaded = load_panel_args(&args.panel)?;
    let series = loaded.panel.series(&args.symbol)?;

    let test = adf_test(series.values(), args.max_lag)?;
    let output = AdfOutput {
        symbol: args.symbol.clone(),
        stationary_at_5pct: test.statistic < test.critical_values.five_pct,
        test,
    };

    super::envelope(
        "Augmented Dickey-Fuller test with constant, lag order by AIC",
        &json!({ "symbol": args.symbol, "max_lag": args.max_lag }),
        loaded.warnings(),
        start,
        output,
    )
}
