//! Monetary amounts and the shop's rounding rule.
//!
//! Amounts are `f64` in currency units. The order API recomputes every total
//! with IEEE-754 doubles and the same rounding rule, and rejects orders whose
//! figures differ, so amounts here must be produced bit-for-bit the same way
//! rather than with decimal arithmetic.

/// A monetary amount in currency units (not cents).
pub type Money = f64;

/// Round to two decimal places.
///
/// Computes `x * 100 + f64::EPSILON` (two separately rounded operations, not a
/// fused multiply-add), rounds to the nearest integer with ties going toward
/// positive infinity, and divides by 100.
///
/// ```
/// use agar_shop_core::round2;
///
/// assert_eq!(round2(123.4567), 123.46);
/// assert_eq!(round2(19.99), 19.99);
/// ```
#[must_use]
#[allow(clippy::suboptimal_flops)] // mul_add rounds once and changes results
pub fn round2(x: Money) -> Money {
    round_half_up(x * 100.0 + f64::EPSILON) / 100.0
}

/// Nearest integer, ties toward positive infinity.
fn round_half_up(v: f64) -> f64 {
    let floor = v.floor();
    if v - floor >= 0.5 { floor + 1.0 } else { floor }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_rounds_up_third_decimal() {
        assert_eq!(round2(123.4567), 123.46);
        assert_eq!(round2(0.125), 0.13);
    }

    #[test]
    fn test_round2_rounds_down_third_decimal() {
        assert_eq!(round2(10.004), 10.0);
        assert_eq!(round2(2.341), 2.34);
    }

    #[test]
    fn test_round2_is_identity_on_two_decimals() {
        for value in [0.0, 0.01, 0.1, 1.5, 19.99, 200.0, 200.01, 245.0, 1234.56] {
            assert_eq!(round2(value), value, "round2({value})");
        }
    }

    #[test]
    fn test_round2_ties_go_toward_positive_infinity() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
    }

    #[test]
    fn test_round2_absorbs_float_error() {
        // 0.1 + 0.2 == 0.30000000000000004
        assert_eq!(round2(0.1 + 0.2), 0.3);
        // 1.005 is stored as 1.00499999999999989..., and the nudge is far
        // below the spacing of doubles near 100.5.
        assert_eq!(round2(1.005), 1.0);
    }
}
