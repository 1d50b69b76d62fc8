//! Robust order statistics and tolerant comparison of bit costs.

use std::cmp::Ordering;

/// Two costs closer than this many bits are considered tied.
pub const BITS_TOLERANCE: f64 = 1e-9;

/// Lower median of a set of integers.
///
/// For an even count the smaller of the two middle values is returned, so the
/// result always belongs to the input. Any value in the median interval
/// minimizes `sum(|v - m|)`; taking the lower end breaks that tie toward the
/// smaller value. Returns `None` for empty input.
pub fn lower_median(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    Some(sorted[(sorted.len() - 1) / 2])
}

/// Sum of absolute deviations `sum(|v - center|)`, saturating on overflow.
pub fn absolute_deviation_sum(values: &[i64], center: i64) -> u64 {
    values
        .iter()
        .fold(0u64, |acc, v| acc.saturating_add(v.abs_diff(center)))
}

/// Compare two bit costs, treating values within [`BITS_TOLERANCE`] as equal.
///
/// NaN compares as greater than every number so it never wins a minimum.
pub fn cmp_bits(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }
    if (a - b).abs() <= BITS_TOLERANCE {
        Ordering::Equal
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}
