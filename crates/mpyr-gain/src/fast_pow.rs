//! Approximate power function.
//!
//! [`fast_pow`] estimates `base^exponent` by treating the high 32 bits of an
//! IEEE-754 double as a scaled logarithm: subtracting the bias constant, scaling
//! by the exponent and adding the bias back gives the high word of the result.
//! The low word is cleared.
//!
//! ```text
//! hi(x)      = bits(x) >> 32
//! hi(result) = exponent * (hi(x) - 1072632447) + 1072632447
//! ```
//!
//! Cost is one multiply-add and no branches. Accuracy is coarse and gets worse
//! as `|exponent|` grows; [`characterize`] measures it. Measured maximum
//! relative error over magnitudes `[1e-3, 1e3]`:
//!
//! | exponent | max rel. error |
//! |----------|----------------|
//! | 1        | 9.4e-7         |
//! | 0.5      | 0.040          |
//! | 1/2.2    | 0.048          |
//! | 2        | 0.076          |
//! | 2.2      | 0.114          |
//! | 3        | 0.116          |
//!
//! With exponent 1 the result is `base` truncated to 20 mantissa bits, so a
//! second application is exact.
//!
//! Zero, negative, NaN and infinite bases produce meaningless values; callers
//! handle zero before calling.

use serde::{Deserialize, Serialize};

/// High-word bias of the log approximation.
pub const MAGIC: i64 = 1_072_632_447;

/// Lower end of the characterized magnitude range.
pub const ACCURACY_RANGE_MIN: f64 = 1e-3;
/// Upper end of the characterized magnitude range.
pub const ACCURACY_RANGE_MAX: f64 = 1e3;

/// Approximates `base^exponent` for positive `base`.
#[inline]
pub fn fast_pow(base: f64, exponent: f64) -> f64 {
    let hi = (base.to_bits() >> 32) as u32 as i32;
    let scaled = exponent * (i64::from(hi) - MAGIC) as f64 + MAGIC as f64;
    // `as i32` truncates toward zero and saturates
    let hi = scaled as i32 as u32;
    f64::from_bits(u64::from(hi) << 32)
}

/// Relative error statistics of [`fast_pow`] for one exponent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    /// Exponent measured.
    pub exponent: f64,
    /// Number of sample points.
    pub samples: usize,
    /// Largest relative error seen.
    pub max_rel_error: f64,
    /// Mean relative error.
    pub mean_rel_error: f64,
    /// Base at which the largest error occurred.
    pub worst_base: f64,
}

/// Measures [`fast_pow`] against [`f64::powf`] on `samples` log-spaced bases
/// in `[1e-3, 1e3]`.
///
/// `samples` below 2 is raised to 2.
pub fn characterize(exponent: f64, samples: usize) -> Accuracy {
    let n = samples.max(2);
    let (lo, hi) = (ACCURACY_RANGE_MIN.log10(), ACCURACY_RANGE_MAX.log10());
    let mut max = 0.0f64;
    let mut sum = 0.0f64;
    let mut worst = ACCURACY_RANGE_MIN;
    for i in 0..n {
        let t = i as f64 / (n - 1) as f64;
        let base = 10f64.powf(lo + (hi - lo) * t);
        let exact = base.powf(exponent);
        let rel = ((fast_pow(base, exponent) - exact) / exact).abs();
        sum += rel;
        if rel > max {
            max = rel;
            worst = base;
        }
    }
    Accuracy {
        exponent,
        samples: n,
        max_rel_error: max,
        mean_rel_error: sum / n as f64,
        worst_base: worst,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_base() {
        assert_eq!(fast_pow(1.0, 1.0), 1.0);
        assert_relative_eq!(fast_pow(1.0, 2.0), 1.058, epsilon = 1e-3);
        assert_relative_eq!(fast_pow(2.0, 2.0), 4.0, max_relative = 0.08);
    }

    #[test]
    fn test_identity_truncates_low_word() {
        for &x in &[0.001, 0.37, 1.0, 2.5, 123.456, 999.0] {
            let once = fast_pow(x, 1.0);
            assert_eq!(once.to_bits() & 0xFFFF_FFFF, 0);
            assert_relative_eq!(once, x, max_relative = 1.0 / (1u64 << 20) as f64);
            assert_eq!(fast_pow(once, 1.0), once);
        }
    }

    #[test]
    fn test_zero_base_is_not_zero() {
        // callers must special-case zero
        assert!(fast_pow(0.0, 2.0) < 0.0);
    }

    // Regression baselines. A failure here means the approximation changed.
    #[test]
    fn test_accuracy_baselines() {
        let baselines = [
            (1.0, 1e-6),
            (0.5, 0.045),
            (1.0 / 2.2, 0.05),
            (2.0, 0.08),
            (2.2, 0.12),
            (3.0, 0.125),
        ];
        for (exponent, bound) in baselines {
            let acc = characterize(exponent, 10_001);
            assert!(
                acc.max_rel_error < bound,
                "exponent {exponent}: max error {} exceeds {bound}",
                acc.max_rel_error
            );
            assert!(acc.mean_rel_error <= acc.max_rel_error);
        }
    }

    #[test]
    fn test_characterize_sample_floor() {
        let acc = characterize(2.0, 0);
        assert_eq!(acc.samples, 2);
    }
}
