use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backtest::{backtest, summarize, BacktestSummary};
use crate::cointegration::{
    find_cointegrated_pairs, CointegratedPair, ScreenerConfig, ScreeningResult,
};
use crate::cointegration::screener::DEFAULT_SIGNIFICANCE;
use crate::error::PairsError;
use crate::series::{PricePanel, TimeSeries};
use crate::signals::{
    compute_spread, compute_zscore, generate_signals, spread_table, SignalThresholds, SpreadRow,
};
use crate::types::{with_metadata, ComputationOutput, Position, Price, Probability};
use crate::PairsResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_ZSCORE_WINDOW: usize = 30;
pub const DEFAULT_COST: Decimal = dec!(0.0001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Every tunable of a research run. Only the signal thresholds have no default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default = "default_significance")]
    pub significance: Probability,
    /// Rolling z-score window (default 30)
    #[serde(default = "default_window")]
    pub window: usize,
    pub thresholds: SignalThresholds,
    /// Flat fee per leg per period held (default 0.0001)
    #[serde(default = "default_cost")]
    pub cost: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lag: Option<usize>,
}

fn default_significance() -> Probability {
    DEFAULT_SIGNIFICANCE
}

fn default_window() -> usize {
    DEFAULT_ZSCORE_WINDOW
}

fn default_cost() -> Price {
    DEFAULT_COST
}

impl ResearchConfig {
    /// Config with all defaults and the given thresholds.
    pub fn new(thresholds: SignalThresholds) -> Self {
        Self {
            significance: DEFAULT_SIGNIFICANCE,
            window: DEFAULT_ZSCORE_WINDOW,
            thresholds,
            cost: DEFAULT_COST,
            max_lag: None,
        }
    }

    pub fn validate(&self) -> PairsResult<()> {
        self.screener_config().validate()?;
        self.thresholds.validate()?;
        if self.window < 2 {
            return Err(PairsError::InvalidInput {
                field: "window".into(),
                reason: format!("rolling window must be at least 2, got {}", self.window),
            });
        }
        if self.cost < Decimal::ZERO {
            return Err(PairsError::InvalidInput {
                field: "cost".into(),
                reason: format!("transaction cost must be non-negative, got {}", self.cost),
            });
        }
        Ok(())
    }

    pub fn screener_config(&self) -> ScreenerConfig {
        ScreenerConfig {
            significance: self.significance,
            max_lag: self.max_lag,
        }
    }
}

/// Everything derived for one accepted pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairAnalysis {
    pub pair: CointegratedPair,
    pub spread: TimeSeries,
    pub zscore: TimeSeries<Option<Decimal>>,
    pub spread_table: Vec<SpreadRow>,
    pub signals: TimeSeries<Position>,
    pub pnl: TimeSeries,
    pub summary: BacktestSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResearchReport {
    pub screening: ScreeningResult,
    pub analyses: Vec<PairAnalysis>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Spread, z-score, signals and backtest for one pair of panel columns.
pub fn analyze_pair(
    panel: &PricePanel,
    pair: &CointegratedPair,
    config: &ResearchConfig,
) -> PairsResult<PairAnalysis> {
    let y = panel.series(&pair.symbol_a)?;
    let x = panel.series(&pair.symbol_b)?;

    let spread = compute_spread(&y, &x, pair.hedge_ratio)?;
    let zscore = compute_zscore(&spread, config.window)?;
    let table = spread_table(&spread, &zscore)?;
    let signals = generate_signals(&zscore, &config.thresholds)?;
    let pnl = backtest(&y, &x, pair.hedge_ratio, &signals, config.cost)?;
    let summary = summarize(&pnl, &signals)?;

    Ok(PairAnalysis {
        pair: pair.clone(),
        spread,
        zscore,
        spread_table: table,
        signals,
        pnl,
        summary,
    })
}

/// Screen the panel, then analyze every accepted pair.
pub fn run_research(
    panel: &PricePanel,
    config: &ResearchConfig,
) -> PairsResult<ComputationOutput<ResearchReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    config.validate()?;

    let screening = find_cointegrated_pairs(panel, &config.screener_config())?;
    for r in &screening.rejected {
        warnings.push(format!("{} rejected: {}", r.label(), r.reason));
    }
    if screening.pairs.is_empty() {
        warnings.push(format!(
            "No pair cointegrated at the {} significance level",
            config.significance
        ));
    }
    if panel.len() < config.window {
        warnings.push(format!(
            "Panel has {} rows, fewer than the z-score window of {}; no signals will fire",
            panel.len(),
            config.window
        ));
    }

    let mut analyses = Vec::with_capacity(screening.pairs.len());
    for pair in &screening.pairs {
        match analyze_pair(panel, pair, config) {
            Ok(a) => {
                info!(
                    pair = %pair.label(),
                    total_pnl = %a.summary.total_pnl,
                    sharpe = %a.summary.sharpe_ratio.round_dp(4),
                    "Pair analyzed"
                );
                analyses.push(a);
            }
            Err(e) => {
                warn!(pair = %pair.label(), error = %e, "Pair analysis failed");
                warnings.push(format!("{} analysis failed: {}", pair.label(), e));
            }
        }
    }

    let report = ResearchReport {
        screening,
        analyses,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Engle-Granger pair screen, rolling z-score hysteresis signals, position replay backtest",
        config,
        warnings,
        elapsed,
        report,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
