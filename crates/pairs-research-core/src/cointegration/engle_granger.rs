use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PairsError;
use crate::series::TimeSeries;
use crate::stats::adf::{adf_regression, Deterministic};
use crate::stats::mackinnon::{mackinnon_critical_values, mackinnon_p_value, CriticalValues};
use crate::stats::ols::{simple_regression, OlsFit};
use crate::types::{HedgeRatio, Probability};
use crate::PairsResult;

/// A cointegrating regression with R-squared this close to 1 is treated as
/// collinear: the residuals carry no information to test.
const COLLINEAR_TOLERANCE: Decimal = dec!(0.0000015);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Outcome of a two-step Engle-Granger test of `y` against `x`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngleGrangerResult {
    /// ADF t-statistic on the residuals; `None` when the pair is collinear
    pub statistic: Option<Decimal>,
    /// MacKinnon p-value for the null of no cointegration (1 when collinear)
    pub p_value: Probability,
    /// Critical values for a bivariate system at 1%, 5%, 10%
    pub critical_values: CriticalValues,
    /// Slope of the cointegrating regression `y = a + beta * x`
    pub hedge_ratio: HedgeRatio,
    /// Intercept of the cointegrating regression
    pub intercept: Decimal,
    /// Lagged differences used in the residual ADF regression
    pub used_lag: usize,
    /// Observations in the cointegrating regression
    pub nobs: usize,
    /// y is (almost) an exact linear function of x
    pub collinear: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Engle-Granger cointegration test of `y` on `x` (constant in the
/// cointegrating regression, AIC-selected lags in the residual ADF test).
pub fn engle_granger_test(
    y: &TimeSeries,
    x: &TimeSeries,
    max_lag: Option<usize>,
) -> PairsResult<EngleGrangerResult> {
    y.ensure_aligned(x)?;
    let context = format!("{} on {}", y.name(), x.name());
    engle_granger_values(y.values(), x.values(), &context, max_lag)
}

/// OLS hedge ratio: slope of `y` regressed on `x` with an intercept.
pub fn estimate_hedge_ratio(y: &TimeSeries, x: &TimeSeries) -> PairsResult<HedgeRatio> {
    y.ensure_aligned(x)?;
    let context = format!("{} on {}", y.name(), x.name());
    let fit = hedge_regression(y.values(), x.values(), &context)?;
    Ok(fit.params[1])
}

/// Engle-Granger test on raw aligned slices. `context` labels errors.
pub(crate) fn engle_granger_values(
    y: &[Decimal],
    x: &[Decimal],
    context: &str,
    max_lag: Option<usize>,
) -> PairsResult<EngleGrangerResult> {
    if y.len() != x.len() {
        return Err(PairsError::MisalignedSeries {
            left: "y".into(),
            right: "x".into(),
            left_len: y.len(),
            right_len: x.len(),
            detail: context.to_string(),
        });
    }

    let fit = hedge_regression(y, x, context)?;
    let nobs = fit.nobs;
    let critical_values = mackinnon_critical_values(2, nobs - 1)?;
    let intercept = fit.params[0];
    let hedge_ratio = fit.params[1];

    if fit.r_squared >= Decimal::ONE - COLLINEAR_TOLERANCE {
        return Ok(EngleGrangerResult {
            statistic: None,
            p_value: Decimal::ONE,
            critical_values,
            hedge_ratio,
            intercept,
            used_lag: 0,
            nobs,
            collinear: true,
        });
    }

    let adf = adf_regression(&fit.residuals, Deterministic::NoConstant, max_lag)?;
    let p_value = mackinnon_p_value(adf.statistic, 2)?;

    Ok(EngleGrangerResult {
        statistic: Some(adf.statistic),
        p_value,
        critical_values,
        hedge_ratio,
        intercept,
        used_lag: adf.used_lag,
        nobs,
        collinear: false,
    })
}

fn hedge_regression(y: &[Decimal], x: &[Decimal], context: &str) -> PairsResult<OlsFit> {
    simple_regression(y, x, &format!("hedge ratio regression {}", context))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
