use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::PairsError;
use crate::series::TimeSeries;
use crate::types::{HedgeRatio, Position, Price};
use crate::PairsResult;

/// Replay a position series against the spread's price changes.
///
/// The position decided at `i - 1` earns `pos * (dy[i] - beta * dx[i])` over
/// period `i`, less `2 * cost * |pos|`. The cost is charged on every period
/// a position is held, not only when it changes. Returns one value per
/// period from the second date onward.
pub fn backtest(
    y: &TimeSeries,
    x: &TimeSeries,
    beta: HedgeRatio,
    signals: &TimeSeries<Position>,
    cost: Price,
) -> PairsResult<TimeSeries> {
    if cost < Decimal::ZERO {
        return Err(PairsError::InvalidInput {
            field: "cost".into(),
            reason: format!("transaction cost must be non-negative, got {}", cost),
        });
    }
    y.ensure_aligned(x)?;
    y.ensure_aligned(signals)?;

    let ys = y.values();
    let xs = x.values();
    let sig = signals.values();

    let mut pnl = Vec::with_capacity(sig.len().saturating_sub(1));
    let mut position = Position::Flat;
    for i in 1..sig.len() {
        let prev = position;
        position = sig[i];
        let ret = if prev.is_flat() {
            Decimal::ZERO
        } else {
            let dy = ys[i] - ys[i - 1];
            let dx = xs[i] - xs[i - 1];
            let p = prev.as_decimal();
            p * (dy - beta * dx) - dec!(2) * cost * p.abs()
        };
        pnl.push(ret);
    }

    Ok(TimeSeries::derived(
        format!("{} pnl", signals.name()),
        signals.index().iter().skip(1).copied().collect(),
        pnl,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn index(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2023, 9, 1).unwrap();
        (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect()
    }

    fn prices(name: &str, v: &[Decimal]) -> TimeSeries {
        TimeSeries::new(name, index(v.len()), v.to_vec()).unwrap()
    }

    fn signals(v: &[Position]) -> TimeSeries<Position> {
        TimeSeries::new("sig", index(v.len()), v.to_vec()).unwrap()
    }

    fn reference() -> (TimeSeries, TimeSeries) {
        (
            prices("ES=F", &[dec!(100), dec!(101), dec!(103), dec!(102), dec!(104)]),
            prices("NQ=F", &[dec!(50), dec!(50.2), dec!(50.6), dec!(50.4), dec!(50.8)]),
        )
    }

    #[test]
    fn test_flat_signals_zero_pnl() {
        let (y, x) = reference();
        let s = signals(&[Position::Flat; 5]);
        let pnl = backtest(&y, &x, dec!(2), &s, dec!(0.0001)).unwrap();
        assert_eq!(pnl.len(), 4);
        assert!(pnl.values().iter().all(|v| v.is_zero()));
        assert_eq!(pnl.index(), &y.index()[1..]);
    }

    #[test]
    fn test_long_position_pnl_uses_previous_signal() {
        let (y, x) = reference();
        use Position::*;
        // Long decided at t=1 earns the spread change from t=1 to t=2 (0.6 -> 1.8)
        let s = signals(&[Flat, Long, Flat, Flat, Flat]);
        let pnl = backtest(&y, &x, dec!(2), &s, Decimal::ZERO).unwrap();
        assert_eq!(pnl.values(), &[dec!(0), dec!(1.2), dec!(0), dec!(0)]);
    }

    #[test]
    fn test_short_position_with_cost_every_period() {
        let (y, x) = reference();
        use Position::*;
        // Short held over periods 2, 3, 4: spread changes +1.2, -0.6, +1.2
        let s = signals(&[Flat, Short, Short, Short, Flat]);
        let pnl = backtest(&y, &x, dec!(2), &s, dec!(0.01)).unwrap();
        assert_eq!(
            pnl.values(),
            &[dec!(0), dec!(-1.22), dec!(0.58), dec!(-1.22)]
        );
    }

    #[test]
    fn test_negative_cost_rejected() {
        let (y, x) = reference();
        let s = signals(&[Position::Flat; 5]);
        assert!(backtest(&y, &x, dec!(2), &s, dec!(-0.1)).is_err());
    }

    #[test]
    fn test_misaligned_signals_rejected() {
        let (y, x) = reference();
        let s = signals(&[Position::Flat; 4]);
        assert!(matches!(
            backtest(&y, &x, dec!(2), &s, Decimal::ZERO),
            Err(PairsError::MisalignedSeries { .. })
        ));
    }

    #[test]
    fn test_single_point_yields_empty_pnl() {
        let y = prices("Y", &[dec!(1)]);
        let x = prices("X", &[dec!(1)]);
        let s = signals(&[Position::Long]);
        let pnl = backtest(&y, &x, dec!(1), &s, Decimal::ZERO).unwrap();
        assert!(pnl.is_empty());
    }
}
