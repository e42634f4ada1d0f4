use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::mackinnon::{mackinnon_critical_values, mackinnon_p_value, CriticalValues};
use super::ols::{ols, OlsFit};
use crate::error::PairsError;
use crate::PairsResult;

/// Shortest series accepted by the unit-root tests.
pub const MIN_OBSERVATIONS: usize = 20;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Deterministic terms included in the test regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deterministic {
    /// No constant. Used on cointegration residuals, which are mean zero.
    NoConstant,
    Constant,
}

impl Deterministic {
    fn terms(self) -> usize {
        match self {
            Deterministic::NoConstant => 0,
            Deterministic::Constant => 1,
        }
    }
}

/// Raw output of the Dickey-Fuller regression before p-value lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdfRegression {
    /// t-statistic on the lagged level
    pub statistic: Decimal,
    /// Number of lagged differences chosen by AIC
    pub used_lag: usize,
    /// Largest lag considered
    pub max_lag: usize,
    /// Observations in the final regression
    pub nobs: usize,
}

/// Augmented Dickey-Fuller test of a single series (constant term).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdfTestResult {
    pub statistic: Decimal,
    /// MacKinnon approximate p-value for the unit-root null
    pub p_value: Decimal,
    pub used_lag: usize,
    pub nobs: usize,
    pub critical_values: CriticalValues,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Augmented Dickey-Fuller test with a constant, lags selected by AIC.
///
/// `max_lag` defaults to `ceil(12 * (n / 100)^(1/4))`, capped by the sample size.
pub fn adf_test(series: &[Decimal], max_lag: Option<usize>) -> PairsResult<AdfTestResult> {
    let reg = adf_regression(series, Deterministic::Constant, max_lag)?;
    let p_value = mackinnon_p_value(reg.statistic, 1)?;
    let critical_values = mackinnon_critical_values(1, reg.nobs)?;
    Ok(AdfTestResult {
        statistic: reg.statistic,
        p_value,
        used_lag: reg.used_lag,
        nobs: reg.nobs,
        critical_values,
    })
}

/// Run the Dickey-Fuller regression
/// `dx_t = [c] + g * x_{t-1} + sum_{i=1..p} d_i * dx_{t-i} + e_t`
/// choosing `p` in `0..=max_lag` by AIC on a common sample, then refitting
/// on the longest sample available for the chosen `p`.
pub fn adf_regression(
    x: &[Decimal],
    deterministic: Deterministic,
    max_lag: Option<usize>,
) -> PairsResult<AdfRegression> {
    let n = x.len();
    if n < MIN_OBSERVATIONS {
        return Err(PairsError::InsufficientData(format!(
            "At least {} observations required for the ADF test, got {}",
            MIN_OBSERVATIONS, n
        )));
    }
    let ntrend = deterministic.terms();
    let cap = (n / 2).checked_sub(ntrend + 1).ok_or_else(|| {
        PairsError::InsufficientData(format!("sample of {} is too short for the ADF test", n))
    })?;
    let max_lag = match max_lag {
        Some(l) if l > cap => {
            return Err(PairsError::InvalidInput {
                field: "max_lag".into(),
                reason: format!("max_lag must be at most {} for {} observations, got {}", cap, n, l),
            })
        }
        Some(l) => l,
        None => default_max_lag(n).min(cap),
    };

    let dx: Vec<Decimal> = x.windows(2).map(|w| w[1] - w[0]).collect();

    // AIC search on the sample trimmed by max_lag so every candidate sees the same rows
    let mut best: Option<(Decimal, usize)> = None;
    for lag in 0..=max_lag {
        let (design, endog) = build_design(x, &dx, deterministic, max_lag, lag);
        if endog.len() <= design.first().map(Vec::len).unwrap_or(0) + 1 {
            continue;
        }
        let fit = ols(&design, &endog, "ADF lag selection")?;
        let aic = fit.aic();
        if best.map_or(true, |(b, _)| aic < b) {
            best = Some((aic, lag));
        }
    }
    let (_, used_lag) = best.ok_or_else(|| {
        PairsError::InsufficientData(format!("no ADF lag order fits {} observations", n))
    })?;

    let (design, endog) = build_design(x, &dx, deterministic, used_lag, used_lag);
    let fit: OlsFit = ols(&design, &endog, "ADF regression")?;
    let level_col = ntrend;
    let statistic = fit.t_value(level_col).ok_or_else(|| PairsError::SingularRegression {
        context: "ADF regression has zero residual variance".into(),
    })?;

    Ok(AdfRegression {
        statistic,
        used_lag,
        max_lag,
        nobs: fit.nobs,
    })
}

/// Default lag ceiling `ceil(12 * (nobs / 100)^(1/4))`.
pub fn default_max_lag(nobs: usize) -> usize {
    (12.0 * (nobs as f64 / 100.0).powf(0.25)).ceil() as usize
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Rows `t = trim..dx.len()` of `[c?, x_t, dx_{t-1}, ..., dx_{t-lag}]` against `dx_t`.
fn build_design(
    x: &[Decimal],
    dx: &[Decimal],
    deterministic: Deterministic,
    trim: usize,
    lag: usize,
) -> (Vec<Vec<Decimal>>, Vec<Decimal>) {
    let rows = dx.len().saturating_sub(trim);
    let mut design = Vec::with_capacity(rows);
    let mut endog = Vec::with_capacity(rows);
    for t in trim..dx.len() {
        let mut row = Vec::with_capacity(deterministic.terms() + 1 + lag);
        if deterministic == Deterministic::Constant {
            row.push(Decimal::ONE);
        }
        row.push(x[t]);
        for i in 1..=lag {
            row.push(dx[t - i]);
        }
        design.push(row);
        endog.push(dx[t]);
    }
    (design, endog)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
