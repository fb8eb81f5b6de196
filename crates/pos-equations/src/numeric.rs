//! Rounding utilities shared by the inner-product tracker and the derivative
//! accumulator, so the `zeroRounding` rule (spec.md §3) is applied uniformly
//! instead of being baked into each arithmetic site individually.

use num_traits::Float;

/// `prev + delta`, flushed to exactly zero when the result is negligible
/// relative to the larger of the two operands. Mirrors the "nonzero entries
/// only" storage discipline of `CombinationVectors` and `InnerProductTracker`.
pub fn add_with_round<S: Float>(prev: S, delta: S, zero_rounding: S) -> S {
    let sum = prev + delta;
    ratio_to_zero(sum, prev.abs().max(delta.abs()), zero_rounding)
}

/// Snaps `value` to zero when `|value| / reference` is smaller than
/// `zero_rounding`, or when `reference` is itself zero and `value` already
/// is (within the same tolerance of zero).
pub fn ratio_to_zero<S: Float>(value: S, reference: S, zero_rounding: S) -> S {
    if reference <= S::zero() {
        if value.abs() <= zero_rounding {
            return S::zero();
        }
        return value;
    }
    if (value.abs() / reference) < zero_rounding {
        S::zero()
    } else {
        value
    }
}

/// Whether `value` should be treated as zero in isolation (no reference
/// magnitude available), e.g. when flattening a freshly computed solution
/// value (spec.md §3 "Solution x").
pub fn is_zero<S: Float>(value: S, zero_rounding: S) -> bool {
    value.abs() <= zero_rounding
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_with_round_flushes_negligible_sum() {
        let result = add_with_round(1.0f64, -0.999_999_999_9, 1e-6);
        assert_eq!(result, 0.0);
    }

    #[test]
    fn add_with_round_keeps_significant_sum() {
        let result = add_with_round(1.0f64, -0.5, 1e-6);
        assert!((result - 0.5).abs() < 1e-12);
    }

    #[test]
    fn ratio_to_zero_with_zero_reference() {
        assert_eq!(ratio_to_zero(1e-10, 0.0, 1e-6), 0.0);
        assert_eq!(ratio_to_zero(1.0, 0.0, 1e-6), 1.0);
    }
}
