//! MacKinnon approximate p-values and finite-sample critical values for
//! Dickey-Fuller type statistics with a constant term.
//!
//! `n_vars` is the number of variables in the (co)integrating system:
//! 1 for a univariate ADF test, 2 for a bivariate Engle-Granger test.
//!
//! p-values: MacKinnon (1994), "Approximate asymptotic distribution functions
//! for unit-root and cointegration tests".
//! Critical values: MacKinnon (2010), "Critical values for cointegration
//! tests", response surface `b0 + b1/T + b2/T^2 + b3/T^3`.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::PairsError;
use crate::PairsResult;

// ---------------------------------------------------------------------------
// Tables (constant-term case, N = 1 and N = 2)
// ---------------------------------------------------------------------------

/// Above this statistic the p-value is 1.
const TAU_MAX: [Decimal; 2] = [dec!(2.74), dec!(0.92)];
/// Below this statistic the p-value is 0.
const TAU_MIN: [Decimal; 2] = [dec!(-18.83), dec!(-18.86)];
/// Boundary between the small-p and large-p polynomials.
const TAU_STAR: [Decimal; 2] = [dec!(-1.61), dec!(-2.62)];

const TAU_SMALL_P: [[Decimal; 3]; 2] = [
    [dec!(2.1659), dec!(1.4412), dec!(0.038269)],
    [dec!(2.92), dec!(1.5012), dec!(0.039796)],
];

const TAU_LARGE_P: [[Decimal; 4]; 2] = [
    [dec!(1.7339), dec!(0.93202), dec!(-0.12745), dec!(-0.010368)],
    [dec!(2.1945), dec!(0.64695), dec!(-0.29198), dec!(-0.042377)],
];

/// Response-surface coefficients for the 1%, 5% and 10% critical values.
const TAU_2010: [[[Decimal; 4]; 3]; 2] = [
    [
        [dec!(-3.43035), dec!(-6.5393), dec!(-16.786), dec!(-79.433)],
        [dec!(-2.86154), dec!(-2.8903), dec!(-4.234), dec!(-40.040)],
        [dec!(-2.56677), dec!(-1.5384), dec!(-2.809), dec!(0)],
    ],
    [
        [dec!(-3.89644), dec!(-10.9519), dec!(-22.527), dec!(0)],
        [dec!(-3.33613), dec!(-6.1101), dec!(-6.823), dec!(0)],
        [dec!(-3.04445), dec!(-4.2412), dec!(-2.720), dec!(0)],
    ],
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Critical values of the test statistic at conventional significance levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    pub one_pct: Decimal,
    pub five_pct: Decimal,
    pub ten_pct: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Approximate asymptotic p-value of a Dickey-Fuller statistic.
pub fn mackinnon_p_value(statistic: Decimal, n_vars: usize) -> PairsResult<Decimal> {
    let idx = table_index(n_vars)?;
    if statistic > TAU_MAX[idx] {
        return Ok(Decimal::ONE);
    }
    if statistic < TAU_MIN[idx] {
        return Ok(Decimal::ZERO);
    }
    let z = if statistic <= TAU_STAR[idx] {
        polyval(&TAU_SMALL_P[idx], statistic)
    } else {
        polyval(&TAU_LARGE_P[idx], statistic)
    };
    standard_normal_cdf(z)
}

/// Finite-sample critical values for a regression with `nobs` observations.
pub fn mackinnon_critical_values(n_vars: usize, nobs: usize) -> PairsResult<CriticalValues> {
    let idx = table_index(n_vars)?;
    if nobs == 0 {
        return Err(PairsError::InsufficientData(
            "critical values need at least one observation".into(),
        ));
    }
    let inv_t = Decimal::ONE / Decimal::from(nobs as i64);
    let table = &TAU_2010[idx];
    Ok(CriticalValues {
        one_pct: polyval(&table[0], inv_t),
        five_pct: polyval(&table[1], inv_t),
        ten_pct: polyval(&table[2], inv_t),
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn table_index(n_vars: usize) -> PairsResult<usize> {
    match n_vars {
        1 | 2 => Ok(n_vars - 1),
        _ => Err(PairsError::InvalidInput {
            field: "n_vars".into(),
            reason: format!("MacKinnon tables cover 1 or 2 variables, got {}", n_vars),
        }),
    }
}

/// Evaluate `c0 + c1 x + c2 x^2 + ...` by Horner's rule.
fn polyval(coefs: &[Decimal], x: Decimal) -> Decimal {
    coefs
        .iter()
        .rev()
        .fold(Decimal::ZERO, |acc, c| acc * x + *c)
}

fn standard_normal_cdf(z: Decimal) -> PairsResult<Decimal> {
    let normal = Normal::new(0.0, 1.0).map_err(|e| PairsError::InvalidInput {
        field: "normal distribution".into(),
        reason: e.to_string(),
    })?;
    let zf = z.to_f64().ok_or_else(|| PairsError::InvalidInput {
        field: "statistic".into(),
        reason: format!("{} cannot be represented as f64", z),
    })?;
    let p = Decimal::from_f64(normal.cdf(zf)).unwrap_or(Decimal::ZERO);
    Ok(p.max(Decimal::ZERO).min(Decimal::ONE))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
