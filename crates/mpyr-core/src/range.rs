//! Scanline ranges and row partitioning.
//!
//! A [`ScanlineRange`] is a half-open interval of rows `[start, end)`.
//! [`partition_rows`] cuts `[0, height)` into `parts` contiguous bands whose
//! boundaries sit at `i * height / parts` (integer division). For two parts the
//! single boundary is `height / 2`, so on odd heights the first band is the
//! shorter one:
//!
//! ```text
//! height = 7, parts = 2
//!
//! rows:  0 1 2 | 3 4 5 6
//!        band A | band B
//! ```
//!
//! The bands never overlap and their union is exactly `[0, height)`; concurrent
//! writers over a shared buffer rely on that.

use std::ops::Range;

use crate::{CoreError, CoreResult};

/// Half-open row interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanlineRange {
    /// First row.
    pub start: usize,
    /// One past the last row.
    pub end: usize,
}

impl ScanlineRange {
    /// Creates a range. `end < start` is allowed here and rejected by
    /// [`validate`](Self::validate).
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// All rows of an image of the given height.
    #[inline]
    pub const fn full(height: usize) -> Self {
        Self::new(0, height)
    }

    /// Number of rows covered.
    #[inline]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// `true` when the range covers no rows.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` when `row` lies in the range.
    #[inline]
    pub const fn contains(&self, row: usize) -> bool {
        row >= self.start && row < self.end
    }

    /// `true` when the two ranges share at least one row.
    #[inline]
    pub fn overlaps(&self, other: &ScanlineRange) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }

    /// Checks that the range is ordered and lies within `[0, height]`.
    pub fn validate(&self, height: usize) -> CoreResult<()> {
        if self.start > self.end || self.end > height {
            return Err(CoreError::invalid_range(*self, height));
        }
        Ok(())
    }

    /// Range as a std [`Range`].
    #[inline]
    pub const fn rows(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for ScanlineRange {
    fn from(r: Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

/// Splits `[0, height)` into `parts` contiguous, disjoint bands.
///
/// Band `i` covers `[i * height / parts, (i + 1) * height / parts)`. When
/// `parts > height` some bands are empty; the last band is never empty for
/// `height > 0`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidParameter`] when `parts == 0`.
///
/// # Example
///
/// ```rust
/// use mpyr_core::{partition_rows, ScanlineRange};
///
/// let bands = partition_rows(7, 2).unwrap();
/// assert_eq!(bands, vec![ScanlineRange::new(0, 3), ScanlineRange::new(3, 7)]);
/// ```
pub fn partition_rows(height: usize, parts: usize) -> CoreResult<Vec<ScanlineRange>> {
    if parts == 0 {
        return Err(CoreError::invalid_parameter("partition needs at least one part"));
    }
    let boundary = |i: usize| -> usize {
        // u128 keeps i * height from overflowing on 64-bit sizes
        ((i as u128 * height as u128) / parts as u128) as usize
    };
    Ok((0..parts)
        .map(|i| ScanlineRange::new(boundary(i), boundary(i + 1)))
        .collect())
}

/// Two-way split at `height / 2`.
#[inline]
pub fn split_halves(height: usize) -> (ScanlineRange, ScanlineRange) {
    let mid = height / 2;
    (ScanlineRange::new(0, mid), ScanlineRange::new(mid, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(height: usize, parts: usize) {
        let bands = partition_rows(height, parts).unwrap();
        assert_eq!(bands.len(), parts);
        assert_eq!(bands.first().map(|b| b.start), Some(0));
        assert_eq!(bands.last().map(|b| b.end), Some(height));
        for pair in bands.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "gap or overlap in {:?}", bands);
            assert!(!pair[0].overlaps(&pair[1]));
        }
        let total: usize = bands.iter().map(ScanlineRange::len).sum();
        assert_eq!(total, height);
    }

    #[test]
    fn test_two_way_odd_height() {
        let bands = partition_rows(7, 2).unwrap();
        assert_eq!(bands[0], ScanlineRange::new(0, 3));
        assert_eq!(bands[1], ScanlineRange::new(3, 7));
        assert_eq!(split_halves(7), (bands[0], bands[1]));
    }

    #[test]
    fn test_two_way_matches_halves() {
        for h in 0..64 {
            let bands = partition_rows(h, 2).unwrap();
            assert_eq!((bands[0], bands[1]), split_halves(h));
        }
    }

    #[test]
    fn test_partition_invariants() {
        for h in 0..40 {
            for parts in 1..12 {
                assert_partition(h, parts);
            }
        }
        assert_partition(1080, 4);
        assert_partition(4321, 7);
    }

    #[test]
    fn test_more_parts_than_rows() {
        let bands = partition_rows(1, 2).unwrap();
        assert!(bands[0].is_empty());
        assert_eq!(bands[1], ScanlineRange::new(0, 1));
    }

    #[test]
    fn test_zero_parts_rejected() {
        assert!(partition_rows(10, 0).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(ScanlineRange::new(0, 5).validate(5).is_ok());
        assert!(ScanlineRange::new(5, 5).validate(5).is_ok());
        assert!(ScanlineRange::new(0, 6).validate(5).is_err());
        assert!(ScanlineRange::new(3, 2).validate(5).is_err());
    }

    #[test]
    fn test_contains_and_overlap() {
        let a = ScanlineRange::new(0, 3);
        let b = ScanlineRange::new(3, 7);
        assert!(a.contains(2));
        assert!(!a.contains(3));
        assert!(!a.overlaps(&b));
        assert!(ScanlineRange::new(2, 4).overlaps(&b));
        assert!(!ScanlineRange::new(3, 3).overlaps(&b));
    }
}
