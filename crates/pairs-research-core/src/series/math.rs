use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Decimal math helpers
// ---------------------------------------------------------------------------

/// Square root: built-in `sqrt` as the initial guess, refined with Newton's method.
pub fn sqrt_decimal(val: Decimal) -> Decimal {
    if val <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut guess = val.sqrt().unwrap_or_else(|| val / dec!(2));
    let two = dec!(2);
    for _ in 0..20 {
        if guess.is_zero() {
            return Decimal::ZERO;
        }
        guess = (guess + val / guess) / two;
    }
    guess
}

/// Taylor-series natural logarithm.
/// ln(x) = 2 * sum_{k=0..20} (1/(2k+1)) * ((x-1)/(x+1))^(2k+1)
/// Range-reduced via powers of 2. Returns zero for non-positive input.
pub fn ln_decimal(x: Decimal) -> Decimal {
    if x <= Decimal::ZERO || x == Decimal::ONE {
        return Decimal::ZERO;
    }
    let ln2 = dec!(0.6931471805599453);
    let mut val = x;
    let mut k: i64 = 0;
    while val > dec!(2) {
        val /= dec!(2);
        k += 1;
    }
    while val < dec!(0.5) {
        val *= dec!(2);
        k -= 1;
    }
    let u = (val - Decimal::ONE) / (val + Decimal::ONE);
    let u2 = u * u;
    let mut term = u;
    let mut sum = u;
    for n in 1..=20 {
        term *= u2;
        sum += term / Decimal::from(2 * n + 1);
    }
    dec!(2) * sum + Decimal::from(k) * ln2
}

/// Arithmetic mean; zero for an empty slice.
pub fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().copied().sum::<Decimal>() / Decimal::from(values.len() as i64)
}

/// Sample variance (n - 1 denominator); zero with fewer than two points.
pub fn sample_variance(values: &[Decimal]) -> Decimal {
    let n = values.len();
    if n < 2 {
        return Decimal::ZERO;
    }
    let m = mean(values);
    let ss: Decimal = values
        .iter()
        .map(|v| {
            let d = *v - m;
            d * d
        })
        .sum();
    ss / Decimal::from((n - 1) as i64)
}

/// Sample standard deviation.
pub fn sample_std(values: &[Decimal]) -> Decimal {
    sqrt_decimal(sample_variance(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqrt_perfect_square() {
        assert!((sqrt_decimal(dec!(144)) - dec!(12)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_sqrt_non_positive_is_zero() {
        assert_eq!(sqrt_decimal(dec!(-4)), Decimal::ZERO);
        assert_eq!(sqrt_decimal(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_ln_known_values() {
        assert_eq!(ln_decimal(Decimal::ONE), Decimal::ZERO);
        assert!((ln_decimal(dec!(2)) - dec!(0.693147180559945)).abs() < dec!(0.000000001));
        assert!((ln_decimal(dec!(0.001)) - dec!(-6.907755278982137)).abs() < dec!(0.000000001));
        assert!((ln_decimal(dec!(1000000)) - dec!(13.815510557964274)).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_mean_and_variance() {
        let v = [dec!(2), dec!(4), dec!(4), dec!(4), dec!(5), dec!(5), dec!(7), dec!(9)];
        assert_eq!(mean(&v), dec!(5));
        // sum of squared deviations = 32, n - 1 = 7
        assert_eq!(sample_variance(&v), dec!(32) / dec!(7));
    }

    #[test]
    fn test_variance_of_constant_is_exactly_zero() {
        let v = [dec!(0.6); 5];
        assert_eq!(sample_variance(&v), Decimal::ZERO);
        assert_eq!(sample_std(&v), Decimal::ZERO);
    }

    #[test]
    fn test_short_inputs() {
        assert_eq!(mean(&[]), Decimal::ZERO);
        assert_eq!(sample_variance(&[dec!(3)]), Decimal::ZERO);
    }
}
