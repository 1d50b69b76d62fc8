//! Code lengths (in bits) for the primitive values of an MDL encoding.
//!
//! Every function returns a non-negative, finite number of bits for any
//! input. Degenerate domains (a single possible value, an empty range)
//! cost zero bits.

/// Bits needed to name one of `choices` equally likely values: log2(choices).
///
/// Returns 0.0 when there is at most one choice.
pub fn uniform_code_length(choices: u64) -> f64 {
    if choices <= 1 {
        return 0.0;
    }
    (choices as f64).log2()
}

/// Bits needed to name a value drawn from the closed range `[0, range]`.
///
/// Equivalent to `uniform_code_length(range + 1)` without overflowing.
pub fn range_code_length(range: u64) -> f64 {
    if range == 0 {
        return 0.0;
    }
    (range as f64 + 1.0).log2()
}

/// Bits needed to name an item whose empirical frequency is `count / total`.
///
/// This is the Shannon code length `-log2(count / total)`. Returns 0.0 when
/// `count` covers the whole population or either argument is zero.
pub fn frequency_code_length(count: u64, total: u64) -> f64 {
    if count == 0 || total == 0 || count >= total {
        return 0.0;
    }
    (total as f64).log2() - (count as f64).log2()
}

/// Zig-zag magnitude of a signed value: 2|s| (the sign costs at most one more
/// code point, folded into the doubling).
pub fn zigzag_magnitude(value: i64) -> u64 {
    value.unsigned_abs().saturating_mul(2)
}

/// Two-part (gamma-style) code length for a signed correction.
///
/// `2 * log2(1 + 2|s|)`: a length prefix plus the zig-zag magnitude. Zero
/// costs nothing; the length is monotone non-decreasing in `|s|`.
pub fn signed_correction_code_length(value: i64) -> f64 {
    if value == 0 {
        return 0.0;
    }
    2.0 * (1.0 + zigzag_magnitude(value) as f64).log2()
}

/// Sum of correction code lengths over a slice.
pub fn corrections_code_length(values: &[i64]) -> f64 {
    values.iter().map(|v| signed_correction_code_length(*v)).sum()
}
