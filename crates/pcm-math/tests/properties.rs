//! Property-based tests for pcm-math code lengths and order statistics.
//!
//! Uses proptest to verify the invariants the MDL cost model relies on.

use proptest::prelude::*;
use pcm_math::{
    absolute_deviation_sum, cmp_bits, corrections_code_length, frequency_code_length,
    lower_median, range_code_length, signed_correction_code_length, uniform_code_length,
};
use std::cmp::Ordering;

// ============================================================================
// Code length properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Correction cost is symmetric in the sign.
    #[test]
    fn correction_cost_symmetric(s in -1_000_000i64..1_000_000) {
        prop_assert_eq!(signed_correction_code_length(s), signed_correction_code_length(-s));
    }

    /// Correction cost never decreases as the magnitude grows.
    #[test]
    fn correction_cost_monotone(a in 0i64..1_000_000, delta in 0i64..1_000_000) {
        let small = signed_correction_code_length(a);
        let large = signed_correction_code_length(a + delta);
        prop_assert!(large >= small, "cost({})={} < cost({})={}", a + delta, large, a, small);
    }

    /// Correction cost is non-negative and finite over the whole domain.
    #[test]
    fn correction_cost_finite(s in any::<i64>()) {
        let bits = signed_correction_code_length(s);
        prop_assert!(bits.is_finite() && bits >= 0.0);
    }

    /// Summed cost equals the sum of the parts.
    #[test]
    fn corrections_additive(values in prop::collection::vec(-10_000i64..10_000, 0..40)) {
        let whole = corrections_code_length(&values);
        let parts: f64 = values.iter().map(|v| signed_correction_code_length(*v)).sum();
        prop_assert!((whole - parts).abs() < 1e-9);
    }

    /// A larger range never costs fewer bits.
    #[test]
    fn range_cost_monotone(a in 0u64..u64::MAX / 2, delta in 0u64..1_000_000) {
        prop_assert!(range_code_length(a + delta) >= range_code_length(a));
        prop_assert!(uniform_code_length(a + delta) >= uniform_code_length(a));
    }

    /// Rarer items cost more bits to name.
    #[test]
    fn frequency_cost_antitone(total in 2u64..100_000, count in 1u64..100_000) {
        let count = count.min(total);
        let rarer = (count / 2).max(1);
        prop_assert!(frequency_code_length(rarer, total) >= frequency_code_length(count, total));
    }
}

// ============================================================================
// Order statistic properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The lower median is an element of the input.
    #[test]
    fn lower_median_is_member(values in prop::collection::vec(-10_000i64..10_000, 1..60)) {
        let m = lower_median(&values).unwrap();
        prop_assert!(values.contains(&m));
    }

    /// The lower median minimizes the absolute deviation sum over the data range.
    #[test]
    fn lower_median_minimizes_l1(values in prop::collection::vec(-500i64..500, 1..30), candidate in -600i64..600) {
        let m = lower_median(&values).unwrap();
        prop_assert!(absolute_deviation_sum(&values, m) <= absolute_deviation_sum(&values, candidate));
    }

    /// Any better candidate must be larger: ties go to the smaller value.
    #[test]
    fn lower_median_prefers_smaller(values in prop::collection::vec(-500i64..500, 1..30), candidate in -600i64..600) {
        let m = lower_median(&values).unwrap();
        if candidate < m {
            prop_assert!(absolute_deviation_sum(&values, candidate) > absolute_deviation_sum(&values, m));
        }
    }

    /// Tolerant comparison is antisymmetric.
    #[test]
    fn cmp_bits_antisymmetric(a in -1e6f64..1e6, b in -1e6f64..1e6) {
        prop_assert_eq!(cmp_bits(a, b), cmp_bits(b, a).reverse());
        prop_assert_eq!(cmp_bits(a, a), Ordering::Equal);
    }
}
