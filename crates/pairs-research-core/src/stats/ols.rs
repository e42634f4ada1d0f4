use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PairsError;
use crate::series::math::{ln_decimal, sqrt_decimal};
use crate::PairsResult;

/// Pivots smaller than this fraction of the largest matrix entry count as zero.
const PIVOT_TOLERANCE: Decimal = dec!(0.000000000000000000001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Result of an ordinary least squares fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OlsFit {
    /// Coefficients in design-matrix column order
    pub params: Vec<Decimal>,
    /// Standard errors of the coefficients
    pub std_errors: Vec<Decimal>,
    /// y - X * params
    pub residuals: Vec<Decimal>,
    /// Sum of squared residuals
    pub ssr: Decimal,
    /// Centered R-squared; 1 when y has zero variance
    pub r_squared: Decimal,
    /// Number of observations
    pub nobs: usize,
}

impl OlsFit {
    /// t-statistic of coefficient `i`, or `None` when its standard error is zero.
    pub fn t_value(&self, i: usize) -> Option<Decimal> {
        let se = *self.std_errors.get(i)?;
        if se.is_zero() {
            None
        } else {
            Some(self.params[i] / se)
        }
    }

    /// Akaike information criterion up to an additive constant shared by
    /// models fitted on the same sample: `nobs * ln(ssr / nobs) + 2k`.
    /// A perfect fit returns `Decimal::MIN`.
    pub fn aic(&self) -> Decimal {
        if self.ssr.is_zero() {
            return Decimal::MIN;
        }
        let n = Decimal::from(self.nobs as i64);
        let k = Decimal::from(self.params.len() as i64);
        n * ln_decimal(self.ssr / n) + dec!(2) * k
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fit `y = X b + e` via the normal equations `b = (X'X)^-1 X'y`.
///
/// `x` is row-major (one row per observation). `context` names the
/// regression in the `SingularRegression` error.
pub fn ols(x: &[Vec<Decimal>], y: &[Decimal], context: &str) -> PairsResult<OlsFit> {
    let n = y.len();
    if x.len() != n {
        return Err(PairsError::InvalidInput {
            field: "design".into(),
            reason: format!("design has {} rows but y has {} observations", x.len(), n),
        });
    }
    let k = x.first().map(Vec::len).unwrap_or(0);
    if k == 0 {
        return Err(PairsError::InvalidInput {
            field: "design".into(),
            reason: "design matrix has no columns".into(),
        });
    }
    if n <= k {
        return Err(PairsError::InsufficientData(format!(
            "{}: {} observations for {} regressors",
            context, n, k
        )));
    }

    let xtx = gram(x, k);
    let xtx_inv = mat_inverse(&xtx).ok_or_else(|| PairsError::SingularRegression {
        context: context.to_string(),
    })?;
    let xty = cross(x, y, k);
    let params = mat_vec_multiply(&xtx_inv, &xty);

    let n_dec = Decimal::from(n as i64);
    let y_mean: Decimal = y.iter().copied().sum::<Decimal>() / n_dec;
    let mut residuals = Vec::with_capacity(n);
    let mut ssr = Decimal::ZERO;
    let mut tss = Decimal::ZERO;
    for (row, yi) in x.iter().zip(y.iter()) {
        let y_hat: Decimal = row.iter().zip(params.iter()).map(|(a, b)| *a * *b).sum();
        let e = *yi - y_hat;
        residuals.push(e);
        ssr += e * e;
        let d = *yi - y_mean;
        tss += d * d;
    }

    let r_squared = if tss.is_zero() {
        Decimal::ONE
    } else {
        Decimal::ONE - ssr / tss
    };

    let sigma_sq = ssr / Decimal::from((n - k) as i64);
    let std_errors = (0..k)
        .map(|j| sqrt_decimal(sigma_sq * xtx_inv[j][j]))
        .collect();

    Ok(OlsFit {
        params,
        std_errors,
        residuals,
        ssr,
        r_squared,
        nobs: n,
    })
}

/// Regress `y` on `[1, x]`, returning the fit with params `[intercept, slope]`.
pub fn simple_regression(y: &[Decimal], x: &[Decimal], context: &str) -> PairsResult<OlsFit> {
    let design: Vec<Vec<Decimal>> = x.iter().map(|xi| vec![Decimal::ONE, *xi]).collect();
    ols(&design, y, context)
}

// ---------------------------------------------------------------------------
// Matrix helpers (Decimal-based, small dimensions)
// ---------------------------------------------------------------------------

/// X'X for a row-major n x k matrix.
fn gram(x: &[Vec<Decimal>], k: usize) -> Vec<Vec<Decimal>> {
    let mut out = vec![vec![Decimal::ZERO; k]; k];
    for row in x {
        for i in 0..k {
            let ri = row[i];
            if ri.is_zero() {
                continue;
            }
            for j in i..k {
                out[i][j] += ri * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            out[i][j] = out[j][i];
        }
    }
    out
}

/// X'y for a row-major n x k matrix.
fn cross(x: &[Vec<Decimal>], y: &[Decimal], k: usize) -> Vec<Decimal> {
    let mut out = vec![Decimal::ZERO; k];
    for (row, yi) in x.iter().zip(y.iter()) {
        for (o, xij) in out.iter_mut().zip(row.iter()) {
            *o += *xij * *yi;
        }
    }
    out
}

/// Multiply m x n matrix by n-vector, returning m-vector.
fn mat_vec_multiply(a: &[Vec<Decimal>], v: &[Decimal]) -> Vec<Decimal> {
    a.iter()
        .map(|row| row.iter().zip(v.iter()).map(|(a, b)| *a * *b).sum())
        .collect()
}

/// Invert a square matrix via Gauss-Jordan elimination with partial pivoting.
/// Returns `None` if the matrix is singular.
#[allow(clippy::needless_range_loop)]
fn mat_inverse(a: &[Vec<Decimal>]) -> Option<Vec<Vec<Decimal>>> {
    let n = a.len();
    if n == 0 {
        return Some(Vec::new());
    }
    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .map(|v| v.abs())
        .max()
        .unwrap_or(Decimal::ZERO);
    if scale.is_zero() {
        return None;
    }
    let tolerance = scale * PIVOT_TOLERANCE;

    // Augmented matrix [A | I]
    let mut aug: Vec<Vec<Decimal>> = (0..n)
        .map(|i| {
            let mut row = Vec::with_capacity(2 * n);
            row.extend_from_slice(&a[i]);
            for j in 0..n {
                row.push(if i == j { Decimal::ONE } else { Decimal::ZERO });
            }
            row
        })
        .collect();

    for col in 0..n {
        let mut pivot_row = col;
        let mut max_val = aug[col][col].abs();
        for row in (col + 1)..n {
            let v = aug[row][col].abs();
            if v > max_val {
                max_val = v;
                pivot_row = row;
            }
        }
        if max_val <= tolerance {
            return None;
        }
        if pivot_row != col {
            aug.swap(col, pivot_row);
        }

        let pivot = aug[col][col];
        for j in 0..(2 * n) {
            aug[col][j] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[row][col];
            if factor.is_zero() {
                continue;
            }
            for j in 0..(2 * n) {
                let update = factor * aug[col][j];
                aug[row][j] -= update;
            }
        }
    }

    Some(aug.into_iter().map(|row| row[n..].to_vec()).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
