use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::PairsError;
use crate::series::math::{mean, sample_std, sqrt_decimal};
use crate::series::TimeSeries;
use crate::types::{Position, Price};
use crate::PairsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Performance statistics of a replayed position series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestSummary {
    /// Sum of per-period PnL, in price points
    pub total_pnl: Price,
    pub cumulative_pnl: TimeSeries,
    /// Annualized mean / std of per-period PnL (sqrt(252)); zero if undefined
    pub sharpe_ratio: Decimal,
    /// Largest peak-to-trough decline of the cumulative PnL curve, in price points
    pub max_drawdown: Price,
    /// Periods that started with a non-flat position
    pub periods_in_market: usize,
    /// Share of non-zero PnL periods that were positive; zero if there were none
    pub win_rate: Decimal,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const TRADING_DAYS_PER_YEAR: i64 = 252;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Summarize a PnL series produced by [`crate::backtest::backtest`] from `signals`.
///
/// `pnl` must carry the signal index without its first date.
pub fn summarize(pnl: &TimeSeries, signals: &TimeSeries<Position>) -> PairsResult<BacktestSummary> {
    if signals.index().get(1..).unwrap_or_default() != pnl.index() {
        return Err(PairsError::MisalignedSeries {
            left: pnl.name().to_string(),
            right: signals.name().to_string(),
            left_len: pnl.len(),
            right_len: signals.len(),
            detail: "pnl must cover every signal date after the first".into(),
        });
    }

    let values = pnl.values();
    let cumulative_pnl = pnl.cumsum();
    let total_pnl = cumulative_pnl.values().last().copied().unwrap_or(Decimal::ZERO);

    let periods_in_market = signals
        .values()
        .iter()
        .take(values.len())
        .filter(|p| !p.is_flat())
        .count();

    let traded: Vec<Decimal> = values.iter().copied().filter(|v| !v.is_zero()).collect();
    let win_rate = if traded.is_empty() {
        Decimal::ZERO
    } else {
        let wins = traded.iter().filter(|v| **v > Decimal::ZERO).count();
        Decimal::from(wins as i64) / Decimal::from(traded.len() as i64)
    };

    Ok(BacktestSummary {
        total_pnl,
        sharpe_ratio: compute_sharpe(values),
        max_drawdown: compute_max_drawdown(values),
        cumulative_pnl,
        periods_in_market,
        win_rate,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Sharpe = mean(pnl) / std(pnl) * sqrt(252)
fn compute_sharpe(pnl: &[Decimal]) -> Decimal {
    if pnl.len() < 2 {
        return Decimal::ZERO;
    }
    let std = sample_std(pnl);
    if std.is_zero() {
        return Decimal::ZERO;
    }
    mean(pnl) / std * sqrt_decimal(Decimal::from(TRADING_DAYS_PER_YEAR))
}

/// Absolute drawdown on the running sum, starting from a zero peak.
fn compute_max_drawdown(pnl: &[Decimal]) -> Decimal {
    let mut cumulative = Decimal::ZERO;
    let mut peak = Decimal::ZERO;
    let mut max_dd = Decimal::ZERO;
    for v in pnl {
        cumulative += *v;
        if cumulative > peak {
            peak = cumulative;
        }
        let dd = peak - cumulative;
        if dd > max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn index(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect()
    }

    fn fixture(positions: &[Position], pnl: &[Decimal]) -> (TimeSeries<Position>, TimeSeries) {
        let idx = index(positions.len());
        let s = TimeSeries::new("sig", idx.clone(), positions.to_vec()).unwrap();
        let p = TimeSeries::new("pnl", idx[1..].to_vec(), pnl.to_vec()).unwrap();
        (s, p)
    }

    #[test]
    fn test_summary_of_mixed_pnl() {
        use Position::*;
        let (s, p) = fixture(
            &[Long, Long, Flat, Short, Flat],
            &[dec!(1.5), dec!(-2), dec!(0), dec!(1)],
        );
        let summary = summarize(&p, &s).unwrap();
        assert_eq!(summary.total_pnl, dec!(0.5));
        assert_eq!(
            summary.cumulative_pnl.values(),
            &[dec!(1.5), dec!(-0.5), dec!(-0.5), dec!(0.5)]
        );
        assert_eq!(summary.max_drawdown, dec!(2));
        assert_eq!(summary.periods_in_market, 3);
        // 2 winners out of 3 non-zero periods
        assert!((summary.win_rate - dec!(0.6666666667)).abs() < dec!(0.000001));
        assert!(summary.sharpe_ratio > Decimal::ZERO);
    }

    #[test]
    fn test_flat_book_summary_is_zero() {
        let (s, p) = fixture(&[Position::Flat; 4], &[Decimal::ZERO; 3]);
        let summary = summarize(&p, &s).unwrap();
        assert_eq!(summary.total_pnl, Decimal::ZERO);
        assert_eq!(summary.sharpe_ratio, Decimal::ZERO);
        assert_eq!(summary.max_drawdown, Decimal::ZERO);
        assert_eq!(summary.periods_in_market, 0);
        assert_eq!(summary.win_rate, Decimal::ZERO);
    }

    #[test]
    fn test_drawdown_from_initial_loss() {
        let dd = compute_max_drawdown(&[dec!(-1), dec!(-0.5), dec!(3), dec!(-1)]);
        assert_eq!(dd, dec!(1.5));
    }

    #[test]
    fn test_sharpe_sign_follows_mean() {
        assert!(compute_sharpe(&[dec!(-1), dec!(-2), dec!(0.5)]) < Decimal::ZERO);
        assert_eq!(compute_sharpe(&[dec!(1)]), Decimal::ZERO);
        assert_eq!(compute_sharpe(&[dec!(0.3), dec!(0.3)]), Decimal::ZERO);
    }

    #[test]
    fn test_misaligned_pnl_rejected() {
        let idx = index(4);
        let s = TimeSeries::new("sig", idx.clone(), vec![Position::Flat; 4]).unwrap();
        let p = TimeSeries::new("pnl", idx[..3].to_vec(), vec![Decimal::ZERO; 3]).unwrap();
        assert!(matches!(
            summarize(&p, &s),
            Err(PairsError::MisalignedSeries { .. })
        ));
    }

    #[test]
    fn test_empty_pnl_from_single_signal() {
        let (s, p) = fixture(&[Position::Long], &[]);
        let summary = summarize(&p, &s).unwrap();
        assert_eq!(summary.total_pnl, Decimal::ZERO);
        assert_eq!(summary.periods_in_market, 0);
    }
}
