//! Shift codec.
//!
//! A cycle stores its occurrences as a start, a period and one signed
//! correction per gap: `gap[i] = period + shifts[i]`. Internally shifts are
//! always full length; only the external form drops trailing zeros, and
//! decoding treats any missing trailing entry as zero.

use pcm_common::Timestamp;
use pcm_math::lower_median;

/// Consecutive differences of a strictly increasing sequence.
///
/// Returns `None` if a difference does not fit in an `i64`.
pub fn gaps(timestamps: &[Timestamp]) -> Option<Vec<i64>> {
    timestamps
        .windows(2)
        .map(|w| w[1].checked_sub(w[0]))
        .collect()
}

/// Period minimizing `Σ|gap − p|`: the lower median of the gaps.
///
/// Returns `None` for an empty gap list or a non-positive median.
pub fn fit_period(gaps: &[i64]) -> Option<i64> {
    lower_median(gaps).filter(|p| *p > 0)
}

/// Encode the shift corrections of `timestamps` against `period`.
pub fn encode_shifts(timestamps: &[Timestamp], period: i64) -> Option<Vec<i64>> {
    gaps(timestamps)?
        .into_iter()
        .map(|g| g.checked_sub(period))
        .collect()
}

/// Decode `length` timestamps from a start, period and (possibly truncated)
/// shifts.
///
/// Arithmetic wraps on overflow; shifts produced by [`encode_shifts`] never
/// overflow.
pub fn decode_timestamps(
    start: Timestamp,
    length: usize,
    period: i64,
    shifts: &[i64],
) -> Vec<Timestamp> {
    let mut out = Vec::with_capacity(length);
    if length == 0 {
        return out;
    }
    let mut current = start;
    out.push(current);
    for i in 1..length {
        let shift = shifts.get(i - 1).copied().unwrap_or(0);
        current = current.wrapping_add(period.wrapping_add(shift));
        out.push(current);
    }
    out
}

/// External form of a shift vector: trailing zeros dropped.
pub fn trim_trailing_zeros(shifts: &[i64]) -> &[i64] {
    let keep = shifts.iter().rposition(|s| *s != 0).map_or(0, |i| i + 1);
    &shifts[..keep]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaps() {
        assert_eq!(gaps(&[0, 60, 130]), Some(vec![60, 70]));
        assert_eq!(gaps(&[5]), Some(vec![]));
        assert_eq!(gaps(&[i64::MIN, i64::MAX]), None);
    }

    #[test]
    fn test_fit_period_lower_median() {
        assert_eq!(fit_period(&[1439, 1440, 1441, 1442]), Some(1440));
        assert_eq!(fit_period(&[60]), Some(60));
        assert_eq!(fit_period(&[]), None);
        assert_eq!(fit_period(&[0, 0, 5]), None);
    }

    #[test]
    fn test_encode_shifts() {
        let ts = [0, 1439, 2879, 4320, 5762];
        assert_eq!(encode_shifts(&ts, 1440), Some(vec![-1, 0, 1, 2]));
    }

    #[test]
    fn test_decode_inverts_encode() {
        let ts = vec![100, 1539, 2979, 4420, 5862];
        let shifts = encode_shifts(&ts, 1440).unwrap();
        assert_eq!(decode_timestamps(100, ts.len(), 1440, &shifts), ts);
    }

    #[test]
    fn test_decode_missing_trailing_shifts_are_zero() {
        assert_eq!(decode_timestamps(0, 4, 10, &[3]), vec![0, 13, 23, 33]);
        assert_eq!(decode_timestamps(7, 1, 10, &[]), vec![7]);
        assert!(decode_timestamps(7, 0, 10, &[]).is_empty());
    }

    #[test]
    fn test_trim_trailing_zeros() {
        assert_eq!(trim_trailing_zeros(&[0, 2, 0, 0]), &[0, 2]);
        assert_eq!(trim_trailing_zeros(&[0, 0]), &[] as &[i64]);
        assert_eq!(trim_trailing_zeros(&[-1]), &[-1]);
    }

    #[test]
    fn test_trimmed_form_decodes_identically() {
        let shifts = [0, 4, 0, 0];
        let full = decode_timestamps(50, 5, 30, &shifts);
        let trimmed = decode_timestamps(50, 5, 30, trim_trailing_zeros(&shifts));
        assert_eq!(full, trimmed);
    }
}
