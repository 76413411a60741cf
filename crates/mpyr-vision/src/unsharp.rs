//! Thresholded unsharp mask.
//!
//! ```text
//! blurred = gauss3x3(input, sigma = radius)
//! mask    = box3x3(input - blurred)
//! out     = input + amount * mask   where |mask| >= threshold
//!         = input                   elsewhere
//! ```
//!
//! Computation is in f32 whatever the source type; the result is converted to
//! the destination type, rounding and saturating for U16.

use mpyr_core::{ImageAdapter, ResizableImage};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Plane, VisionError, VisionResult};

/// Unsharp mask parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsharpParams {
    /// Gaussian sigma of the 3x3 blur. Zero or negative selects the fixed
    /// `[1 2 1] / 4` kernel.
    pub radius: f32,
    /// Gain applied to the mask.
    pub amount: f32,
    /// Minimum mask magnitude that gets sharpened.
    pub threshold: f32,
}

impl Default for UnsharpParams {
    fn default() -> Self {
        Self {
            radius: 0.0,
            amount: 1.0,
            threshold: 0.0,
        }
    }
}

impl UnsharpParams {
    /// Creates parameters.
    pub fn new(radius: f32, amount: f32, threshold: f32) -> Self {
        Self {
            radius,
            amount,
            threshold,
        }
    }

    /// # Errors
    ///
    /// [`VisionError::InvalidParameter`] if any field is NaN or infinite.
    pub fn validate(&self) -> VisionResult<()> {
        for (name, v) in [
            ("radius", self.radius),
            ("amount", self.amount),
            ("threshold", self.threshold),
        ] {
            if !v.is_finite() {
                return Err(VisionError::invalid_parameter(format!("{name} {v} is not finite")));
            }
        }
        Ok(())
    }
}

/// Normalized 3-tap Gaussian for `sigma`.
pub fn gaussian_taps(sigma: f32) -> [f32; 3] {
    if sigma <= 0.0 {
        return [0.25, 0.5, 0.25];
    }
    let side = (-1.0 / (2.0 * f64::from(sigma).powi(2))).exp();
    let sum = 1.0 + 2.0 * side;
    let side = (side / sum) as f32;
    [side, (1.0 / sum) as f32, side]
}

/// Sharpens a plane.
pub fn sharpen(input: &Plane, params: &UnsharpParams) -> Plane {
    let blurred = input.convolve3(gaussian_taps(params.radius));
    let mask = input
        .zip_map(&blurred, |a, b| a - b)
        .convolve3([1.0 / 3.0; 3]);
    let (amount, threshold) = (params.amount, params.threshold);
    input.zip_map(&mask, |p, m| {
        if m.abs() >= threshold {
            p + amount * m
        } else {
            p
        }
    })
}

/// Sharpens `src` into `dst`, which is resized to the source size.
///
/// Source and destination may each be U16 or F32.
///
/// # Errors
///
/// - [`mpyr_core::CoreError::InvalidImageType`] if either image is neither
///   U16 nor F32
/// - [`VisionError::InvalidParameter`] for non-finite parameters
///
/// `dst` is left untouched when an error is returned.
pub fn unsharp_mask(
    src: &dyn ImageAdapter,
    dst: &mut dyn ResizableImage,
    params: &UnsharpParams,
) -> VisionResult<()> {
    let image = src.resolve()?;
    dst.resolve()?;
    params.validate()?;

    let (w, h) = (image.width(), image.height());
    trace!(w, h, ?params, "unsharp_mask");
    let out = sharpen(&Plane::load(image), params);
    dst.set_size(w, h)?;
    out.store(dst.resolve_mut()?)?;
    Ok(())
}
