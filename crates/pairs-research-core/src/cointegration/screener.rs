use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::engle_granger::engle_granger_values;
use crate::error::PairsError;
use crate::series::PricePanel;
use crate::stats::adf::MIN_OBSERVATIONS;
use crate::types::{HedgeRatio, Probability};
use crate::PairsResult;

pub const DEFAULT_SIGNIFICANCE: Decimal = dec!(0.05);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Screening parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// Pairs with p-value strictly below this are accepted (default 0.05)
    #[serde(default = "default_significance")]
    pub significance: Probability,
    /// Lag ceiling for the residual ADF test (default: sample-size rule)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lag: Option<usize>,
}

fn default_significance() -> Probability {
    DEFAULT_SIGNIFICANCE
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            significance: DEFAULT_SIGNIFICANCE,
            max_lag: None,
        }
    }
}

impl ScreenerConfig {
    pub fn validate(&self) -> PairsResult<()> {
        if self.significance <= Decimal::ZERO || self.significance >= Decimal::ONE {
            return Err(PairsError::InvalidInput {
                field: "significance".into(),
                reason: format!("must lie strictly between 0 and 1, got {}", self.significance),
            });
        }
        Ok(())
    }
}

/// A pair accepted by the screen. `symbol_a` is the dependent leg (y),
/// `symbol_b` the hedge leg (x).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CointegratedPair {
    pub symbol_a: String,
    pub symbol_b: String,
    pub hedge_ratio: HedgeRatio,
    pub p_value: Probability,
}

impl CointegratedPair {
    pub fn label(&self) -> String {
        pair_label(&self.symbol_a, &self.symbol_b)
    }
}

/// One row of the cointegration summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub pair: String,
    pub p_value: Probability,
    pub beta: HedgeRatio,
}

/// Why a pair was not accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// Test ran; p-value at or above the significance level
    NotSignificant { p_value: Probability },
    /// The two series are (almost) exact linear functions of each other
    Collinear,
    /// The hedge-ratio or ADF design matrix was singular
    SingularRegression { context: String },
    /// Any other per-pair failure
    Failed { error: String },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::NotSignificant { p_value } => {
                write!(f, "not significant (p-value {})", p_value.round_dp(4))
            }
            RejectionReason::Collinear => write!(f, "series are collinear"),
            RejectionReason::SingularRegression { context } => {
                write!(f, "singular regression in {}", context)
            }
            RejectionReason::Failed { error } => write!(f, "{}", error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedPair {
    pub symbol_a: String,
    pub symbol_b: String,
    pub reason: RejectionReason,
}

impl RejectedPair {
    pub fn label(&self) -> String {
        pair_label(&self.symbol_a, &self.symbol_b)
    }

    /// Whether the pair could not be tested at all, as opposed to failing the test.
    pub fn is_non_actionable(&self) -> bool {
        !matches!(self.reason, RejectionReason::NotSignificant { .. })
    }
}

/// Output of a full pairwise screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningResult {
    /// Accepted pairs in enumeration order
    pub pairs: Vec<CointegratedPair>,
    /// One row per accepted pair, same order
    pub summary: Vec<SummaryRow>,
    /// Everything else, in enumeration order
    pub rejected: Vec<RejectedPair>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// All unordered column-position pairs `(i, j)` with `i < j`, lexicographic.
pub fn pair_indices(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect()
}

/// Test every unordered pair of panel columns for cointegration.
///
/// Column `i` is regressed on column `j` (`i < j`). A failure on one pair
/// (singular design, degenerate residuals) rejects that pair only.
pub fn find_cointegrated_pairs(
    panel: &PricePanel,
    config: &ScreenerConfig,
) -> PairsResult<ScreeningResult> {
    config.validate()?;
    let n_symbols = panel.symbols().len();
    if n_symbols < 2 {
        return Err(PairsError::InsufficientData(format!(
            "At least 2 instruments required for pair screening, got {}",
            n_symbols
        )));
    }
    if panel.len() < MIN_OBSERVATIONS {
        return Err(PairsError::InsufficientData(format!(
            "At least {} aligned observations required for pair screening, got {}",
            MIN_OBSERVATIONS,
            panel.len()
        )));
    }

    let mut pairs = Vec::new();
    let mut rejected = Vec::new();

    for (i, j) in pair_indices(n_symbols) {
        let symbol_a = panel.symbols()[i].clone();
        let symbol_b = panel.symbols()[j].clone();
        let label = pair_label(&symbol_a, &symbol_b);

        let (y, x) = match (panel.column_values(i), panel.column_values(j)) {
            (Some(y), Some(x)) => (y, x),
            _ => continue,
        };

        let outcome = engle_granger_values(y, x, &label, config.max_lag);
        let reason = match outcome {
            Ok(eg) if eg.collinear => RejectionReason::Collinear,
            Ok(eg) if eg.p_value < config.significance => {
                debug!(pair = %label, p_value = %eg.p_value, beta = %eg.hedge_ratio, "Pair accepted");
                pairs.push(CointegratedPair {
                    symbol_a,
                    symbol_b,
                    hedge_ratio: eg.hedge_ratio,
                    p_value: eg.p_value,
                });
                continue;
            }
            Ok(eg) => {
                debug!(pair = %label, p_value = %eg.p_value, "Pair not significant");
                RejectionReason::NotSignificant { p_value: eg.p_value }
            }
            Err(PairsError::SingularRegression { context }) => {
                RejectionReason::SingularRegression { context }
            }
            Err(e) => RejectionReason::Failed {
                error: e.to_string(),
            },
        };

        let rejection = RejectedPair {
            symbol_a,
            symbol_b,
            reason,
        };
        if rejection.is_non_actionable() {
            warn!(pair = %label, reason = ?rejection.reason, "Pair rejected as non-actionable");
        }
        rejected.push(rejection);
    }

    let summary = pairs
        .iter()
        .map(|p| SummaryRow {
            pair: p.label(),
            p_value: p.p_value,
            beta: p.hedge_ratio,
        })
        .collect();

    info!(
        instruments = n_symbols,
        accepted = pairs.len(),
        rejected = rejected.len(),
        "Cointegration screen complete"
    );

    Ok(ScreeningResult {
        pairs,
        summary,
        rejected,
    })
}

fn pair_label(a: &str, b: &str) -> String {
    format!("{} & {}", a, b)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::TimeSeries;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rust_decimal::prelude::FromPrimitive;

    fn to_dec(v: f64) -> Decimal {
        Decimal::from_f64(v).unwrap().round_dp(4)
    }

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2019, 6, 3).unwrap();
        (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect()
    }

    fn walk(rng: &mut StdRng, n: usize, start: f64) -> Vec<f64> {
        let mut level = start;
        (0..n)
            .map(|_| {
                level += rng.gen_range(-1.0..1.0);
                level
            })
            .collect()
    }

    fn panel_from(columns: Vec<(&str, Vec<f64>)>) -> PricePanel {
        let n = columns[0].1.len();
        let series: Vec<TimeSeries> = columns
            .into_iter()
            .map(|(name, vals)| {
                TimeSeries::new(name, dates(n), vals.into_iter().map(to_dec).collect()).unwrap()
            })
            .collect();
        PricePanel::merge(&series).unwrap()
    }

    #[test]
    fn test_pair_indices_lexicographic() {
        assert_eq!(pair_indices(3), vec![(0, 1), (0, 2), (1, 2)]);
        assert!(pair_indices(1).is_empty());
        assert_eq!(pair_indices(5).len(), 10);
    }

    #[test]
    fn test_config_validation() {
        let mut cfg = ScreenerConfig::default();
        assert_eq!(cfg.significance, dec!(0.05));
        assert!(cfg.validate().is_ok());
        cfg.significance = Decimal::ONE;
        assert!(cfg.validate().is_err());
        cfg.significance = Decimal::ZERO;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_screen_accepts_cointegrated_pair() {
        let mut rng = StdRng::seed_from_u64(17);
        let es = walk(&mut rng, 250, 100.0);
        let nq: Vec<f64> = es
            .iter()
            .map(|v| 3.0 * v + 5.0 + rng.gen_range(-0.5..0.5))
            .collect();
        let panel = panel_from(vec![("NQ=F", nq), ("ES=F", es)]);

        let result = find_cointegrated_pairs(&panel, &ScreenerConfig::default()).unwrap();
        assert_eq!(result.pairs.len(), 1);
        let pair = &result.pairs[0];
        assert_eq!(pair.symbol_a, "NQ=F");
        assert_eq!(pair.symbol_b, "ES=F");
        assert!((pair.hedge_ratio - dec!(3)).abs() < dec!(0.05));
        assert_eq!(result.summary[0].pair, "NQ=F & ES=F");
        assert!(result.rejected.is_empty());
    }

    #[test]
    fn test_identical_series_rejected_without_aborting() {
        let mut rng = StdRng::seed_from_u64(23);
        let es = walk(&mut rng, 150, 50.0);
        let es_copy = es.clone();
        let ym: Vec<f64> = es.iter().map(|v| 2.0 * v + rng.gen_range(-0.3..0.3)).collect();
        let panel = panel_from(vec![("ES=F", es), ("ES2", es_copy), ("YM=F", ym)]);

        let result = find_cointegrated_pairs(&panel, &ScreenerConfig::default()).unwrap();
        let collinear: Vec<_> = result
            .rejected
            .iter()
            .filter(|r| r.reason == RejectionReason::Collinear)
            .collect();
        assert_eq!(collinear.len(), 1);
        assert_eq!(collinear[0].label(), "ES=F & ES2");
        // The two YM=F pairs are still evaluated
        assert_eq!(result.pairs.len() + result.rejected.len(), 3);
        assert_eq!(result.pairs.len(), 2);
    }

    #[test]
    fn test_constant_column_singular_pair_isolated() {
        let mut rng = StdRng::seed_from_u64(4);
        let a = walk(&mut rng, 80, 20.0);
        let flat = vec![7.5; 80];
        let panel = panel_from(vec![("A", a), ("FLAT", flat)]);

        let result = find_cointegrated_pairs(&panel, &ScreenerConfig::default()).unwrap();
        assert!(result.pairs.is_empty());
        assert!(matches!(
            result.rejected[0].reason,
            RejectionReason::SingularRegression { .. }
        ));
        assert!(result.rejected[0].is_non_actionable());
    }

    #[test]
    fn test_accepted_p_values_below_threshold() {
        let mut rng = StdRng::seed_from_u64(99);
        let a = walk(&mut rng, 200, 100.0);
        let b = walk(&mut rng, 200, 80.0);
        let c: Vec<f64> = a.iter().map(|v| 0.5 * v + rng.gen_range(-0.2..0.2)).collect();
        let d = walk(&mut rng, 200, 60.0);
        let panel = panel_from(vec![("A", a), ("B", b), ("C", c), ("D", d)]);

        let cfg = ScreenerConfig {
            significance: dec!(0.10),
            max_lag: None,
        };
        let result = find_cointegrated_pairs(&panel, &cfg).unwrap();
        assert!(result.pairs.iter().all(|p| p.p_value < cfg.significance));
        assert_eq!(result.summary.len(), result.pairs.len());
        assert_eq!(result.pairs.len() + result.rejected.len(), 6);
        for r in &result.rejected {
            if let RejectionReason::NotSignificant { p_value } = r.reason {
                assert!(p_value >= cfg.significance);
            }
        }
        assert!(result.pairs.iter().any(|p| p.label() == "A & C"));
    }

    #[test]
    fn test_short_panel_rejected() {
        let panel = panel_from(vec![("A", vec![1.0; 10]), ("B", vec![2.0; 10])]);
        assert!(matches!(
            find_cointegrated_pairs(&panel, &ScreenerConfig::default()),
            Err(PairsError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_single_instrument_rejected() {
        let panel = panel_from(vec![("A", (0..30).map(|i| i as f64).collect())]);
        assert!(find_cointegrated_pairs(&panel, &ScreenerConfig::default()).is_err());
    }
}
