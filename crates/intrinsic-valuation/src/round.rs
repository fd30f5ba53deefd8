//! Half-to-even rounding used for reported figures.

/// Round to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Round to cents.
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// Replace NaN and infinities with zero.
pub(crate) const fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Missing and non-finite inputs count as zero.
pub(crate) fn value_or_zero(value: Option<f64>) -> f64 {
    value.map_or(0.0, finite_or_zero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(954.545_454), 954.55);
        assert_eq!(round2(0.083_333), 0.08);
        assert_eq!(round2(-1.006), -1.01);
    }

    #[test]
    fn test_ties_to_even() {
        assert_eq!(round_to(0.5, 0), 0.0);
        assert_eq!(round_to(1.5, 0), 2.0);
        assert_eq!(round_to(2.5, 0), 2.0);
    }

    #[test]
    fn test_value_or_zero() {
        assert_eq!(value_or_zero(None), 0.0);
        assert_eq!(value_or_zero(Some(f64::NAN)), 0.0);
        assert_eq!(value_or_zero(Some(f64::INFINITY)), 0.0);
        assert_eq!(value_or_zero(Some(3.5)), 3.5);
    }
}
