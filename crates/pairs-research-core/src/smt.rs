//! Smart-money-technique divergence between two correlated instruments.

use rust_decimal::Decimal;

use crate::error::PairsError;
use crate::series::TimeSeries;
use crate::PairsResult;

/// Default trailing window for the rolling highs.
pub const DEFAULT_LOOKBACK: usize = 20;

/// Flag the dates where `y` prints a new `lookback`-window high that `x`
/// fails to confirm.
///
/// At `t` the flag is set when `y[t]` is the maximum of `y[t-lookback+1..=t]`
/// while `x[t]` is strictly below the maximum of its own window. Dates before
/// a full window exists are never flagged.
pub fn smt_divergence(
    y: &TimeSeries,
    x: &TimeSeries,
    lookback: usize,
) -> PairsResult<TimeSeries<bool>> {
    if lookback == 0 {
        return Err(PairsError::InvalidInput {
            field: "lookback".into(),
            reason: "lookback must be at least 1".into(),
        });
    }
    y.ensure_aligned(x)?;

    let ys = y.values();
    let xs = x.values();
    let flags = (0..ys.len())
        .map(|t| {
            if t + 1 < lookback {
                return false;
            }
            let start = t + 1 - lookback;
            ys[t] >= window_high(&ys[start..=t]) && xs[t] < window_high(&xs[start..=t])
        })
        .collect();

    Ok(TimeSeries::derived(
        format!("{} / {} smt", y.name(), x.name()),
        y.index().to_vec(),
        flags,
    ))
}

fn window_high(window: &[Decimal]) -> Decimal {
    window.iter().copied().fold(Decimal::MIN, Decimal::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn series(name: &str, v: &[Decimal]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let index = (0..v.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        TimeSeries::new(name, index, v.to_vec()).unwrap()
    }

    #[test]
    fn test_unconfirmed_high_is_flagged() {
        let y = series("ES=F", &[dec!(10), dec!(11), dec!(12), dec!(13)]);
        let x = series("NQ=F", &[dec!(20), dec!(22), dec!(21), dec!(23)]);
        let flags = smt_divergence(&y, &x, 3).unwrap();
        // t=2: y makes a high at 12, x at 21 is below its window high of 22
        // t=3: both make new highs
        assert_eq!(flags.values(), &[false, false, true, false]);
    }

    #[test]
    fn test_warmup_never_flags() {
        let y = series("Y", &[dec!(5), dec!(6), dec!(7)]);
        let x = series("X", &[dec!(9), dec!(1), dec!(1)]);
        let flags = smt_divergence(&y, &x, 5).unwrap();
        assert!(flags.values().iter().all(|f| !f));
    }

    #[test]
    fn test_lookback_one_never_flags() {
        // every point is its own high, so x can never sit below it
        let y = series("Y", &[dec!(1), dec!(3), dec!(2)]);
        let x = series("X", &[dec!(4), dec!(2), dec!(5)]);
        let flags = smt_divergence(&y, &x, 1).unwrap();
        assert_eq!(flags.values(), &[false, false, false]);
    }

    #[test]
    fn test_zero_lookback_rejected() {
        let y = series("Y", &[dec!(1)]);
        assert!(smt_divergence(&y, &y, 0).is_err());
    }

    #[test]
    fn test_misaligned_rejected() {
        let y = series("Y", &[dec!(1), dec!(2)]);
        let x = series("X", &[dec!(1)]);
        assert!(matches!(
            smt_divergence(&y, &x, 1),
            Err(PairsError::MisalignedSeries { .. })
        ));
    }
}
