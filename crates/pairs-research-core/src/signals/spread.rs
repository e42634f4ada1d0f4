use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PairsError;
use crate::series::math::{mean, sample_std};
use crate::series::TimeSeries;
use crate::types::HedgeRatio;
use crate::PairsResult;

/// One row of the spread / z-score export table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadRow {
    pub date: NaiveDate,
    pub spread: Decimal,
    /// `None` until the rolling window is full, and where the window has no dispersion
    pub z_score: Option<Decimal>,
}

/// `y - beta * x` on the common index.
pub fn compute_spread(y: &TimeSeries, x: &TimeSeries, beta: HedgeRatio) -> PairsResult<TimeSeries> {
    y.ensure_aligned(x)?;
    let values = y
        .values()
        .iter()
        .zip(x.values().iter())
        .map(|(yi, xi)| *yi - beta * *xi)
        .collect();
    Ok(TimeSeries::derived(
        format!("{} - {} * {}", y.name(), beta, x.name()),
        y.index().to_vec(),
        values,
    ))
}

/// Rolling z-score over a trailing window that includes the current point.
///
/// `z[t] = (s[t] - mean(window)) / std(window)` with the sample (n - 1)
/// standard deviation. The first `window - 1` points, and any point whose
/// window has zero standard deviation, are `None`.
pub fn compute_zscore(
    spread: &TimeSeries,
    window: usize,
) -> PairsResult<TimeSeries<Option<Decimal>>> {
    if window < 2 {
        return Err(PairsError::InvalidInput {
            field: "window".into(),
            reason: format!("rolling window must be at least 2, got {}", window),
        });
    }
    let values = spread.values();
    let z = (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let w = &values[i + 1 - window..=i];
            let std = sample_std(w);
            if std.is_zero() {
                None
            } else {
                Some((values[i] - mean(w)) / std)
            }
        })
        .collect();
    Ok(TimeSeries::derived(
        format!("{} z-score", spread.name()),
        spread.index().to_vec(),
        z,
    ))
}

/// Zip a spread and its z-score into export rows.
pub fn spread_table(
    spread: &TimeSeries,
    zscore: &TimeSeries<Option<Decimal>>,
) -> PairsResult<Vec<SpreadRow>> {
    spread.ensure_aligned(zscore)?;
    Ok(spread
        .iter()
        .zip(zscore.values().iter())
        .map(|((date, s), z)| SpreadRow {
            date,
            spread: *s,
            z_score: *z,
        })
        .collect())
}
