//! The gain kernel.
//!
//! Every sample `p` of the selected rows is remapped in place:
//!
//! ```text
//! magnitude = |p| / divider                       (see MagnitudeMode)
//! result    = 0                                   if zero (see ZeroCheckPolicy)
//!           = fast_pow(magnitude, power) * multiplier   otherwise
//! p         = -result if p < 0 else result
//! ```
//!
//! The computation runs in `f64` and is stored back as `f32`. The sign is
//! applied after both branches, so a negative sample whose result is zero is
//! stored as `-0.0`.
//!
//! With [`MagnitudeMode::TruncatedInteger`] the magnitude is taken from `|p|`
//! truncated toward zero to a 32-bit integer, so every `|p| < 1` has magnitude
//! zero. That is where the two [`ZeroCheckPolicy`] choices part ways: the
//! magnitude check writes zero, the raw check calls [`fast_pow`] with a zero
//! base.
//!
//! Row padding is never touched.

use std::fmt;
use std::str::FromStr;

use mpyr_core::{CoreResult, ImageViewMut, RowBand, ScanlineRange};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::fast_pow;

/// Parameters of one gain-curve invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformParameters {
    /// Input magnitudes are divided by this first.
    pub divider: f64,
    /// Exponent of the power curve.
    pub power: f64,
    /// Scale applied after the power curve.
    pub multiplier: f64,
}

impl TransformParameters {
    /// `divider = power = multiplier = 1`.
    pub const IDENTITY: Self = Self::new(1.0, 1.0, 1.0);

    /// Creates a parameter set.
    pub const fn new(divider: f64, power: f64, multiplier: f64) -> Self {
        Self {
            divider,
            power,
            multiplier,
        }
    }
}

impl Default for TransformParameters {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Which value decides that a sample maps to zero.
///
/// The two choices differ when the magnitude is zero for a non-zero `p`: the
/// raw check still calls [`fast_pow`] with a zero base, the magnitude check
/// writes zero. With [`MagnitudeMode::Float`] that only happens when
/// `|p| / divider` underflows; with [`MagnitudeMode::TruncatedInteger`] it
/// happens for every `0 < |p| < 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroCheckPolicy {
    /// Zero iff the raw sample is zero.
    CheckRawValue,
    /// Zero iff `|p| / divider` is zero.
    #[default]
    CheckDerivedMagnitude,
}

impl ZeroCheckPolicy {
    /// Short name as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckRawValue => "raw",
            Self::CheckDerivedMagnitude => "magnitude",
        }
    }
}

impl fmt::Display for ZeroCheckPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZeroCheckPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" | "check-raw-value" => Ok(Self::CheckRawValue),
            "magnitude" | "check-derived-magnitude" => Ok(Self::CheckDerivedMagnitude),
            other => Err(format!("unknown zero-check policy '{other}' (expected raw or magnitude)")),
        }
    }
}

/// How `|p|` is formed before the division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MagnitudeMode {
    /// `|p|` in floating point.
    #[default]
    Float,
    /// `|p|` truncated toward zero and saturated to `i32`.
    TruncatedInteger,
}

impl MagnitudeMode {
    /// Short name as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::TruncatedInteger => "truncate",
        }
    }

    /// `|raw|` under this mode.
    #[inline]
    pub fn abs(&self, raw: f64) -> f64 {
        match self {
            Self::Float => raw.abs(),
            // `as i32` truncates toward zero, saturates, and maps NaN to 0
            Self::TruncatedInteger => f64::from((raw as i32).unsigned_abs()),
        }
    }
}

impl fmt::Display for MagnitudeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MagnitudeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float" => Ok(Self::Float),
            "truncate" | "truncated-integer" | "int" => Ok(Self::TruncatedInteger),
            other => Err(format!("unknown magnitude mode '{other}' (expected float or truncate)")),
        }
    }
}

/// Gain parameters bound to a zero-check policy and magnitude mode.
///
/// `Copy`, so each job of a split dispatch captures its own immutable copy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GainKernel {
    /// Curve parameters.
    pub params: TransformParameters,
    /// Zero handling.
    pub policy: ZeroCheckPolicy,
    /// Magnitude formation.
    #[serde(default)]
    pub magnitude: MagnitudeMode,
}

impl GainKernel {
    /// Kernel with the default policy.
    pub const fn new(params: TransformParameters) -> Self {
        Self {
            params,
            policy: ZeroCheckPolicy::CheckDerivedMagnitude,
            magnitude: MagnitudeMode::Float,
        }
    }

    /// Shorthand for `GainKernel::new(TransformParameters::new(..))`.
    pub const fn from_parts(divider: f64, power: f64, multiplier: f64) -> Self {
        Self::new(TransformParameters::new(divider, power, multiplier))
    }

    /// Replaces the zero-check policy.
    pub const fn with_policy(mut self, policy: ZeroCheckPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the magnitude mode.
    pub const fn with_magnitude(mut self, magnitude: MagnitudeMode) -> Self {
        self.magnitude = magnitude;
        self
    }

    /// Maps one sample.
    #[inline]
    pub fn apply_sample(&self, p: f32) -> f32 {
        let raw = f64::from(p);
        let magnitude = self.magnitude.abs(raw) / self.params.divider;
        let is_zero = match self.policy {
            ZeroCheckPolicy::CheckRawValue => raw == 0.0,
            ZeroCheckPolicy::CheckDerivedMagnitude => magnitude == 0.0,
        };
        let out = if is_zero {
            0.0
        } else {
            (fast_pow(magnitude, self.params.power) * self.params.multiplier) as f32
        };
        if raw < 0.0 { -out } else { out }
    }

    /// Maps every sample of a row slice.
    #[inline]
    pub fn apply_row(&self, row: &mut [f32]) {
        for p in row {
            *p = self.apply_sample(*p);
        }
    }

    /// Maps every row of a band.
    pub fn apply_band(&self, mut band: RowBand<'_, f32>) {
        trace!(start = band.range.start, end = band.range.end, "gain band");
        for row in band.view.rows_mut() {
            self.apply_row(row);
        }
    }
}

/// Applies `kernel` in place to rows `range` of `view`.
///
/// An empty range is a no-op.
///
/// # Errors
///
/// Returns [`mpyr_core::CoreError::InvalidRange`] if `range` is reversed or
/// extends past the last row; no sample is modified in that case.
pub fn transform(
    view: &mut ImageViewMut<'_, f32>,
    range: ScanlineRange,
    kernel: &GainKernel,
) -> CoreResult<()> {
    trace!(start = range.start, end = range.end, width = view.width(), "gain rows");
    for row in view.rows_in_mut(range)? {
        kernel.apply_row(row);
    }
    Ok(())
}
