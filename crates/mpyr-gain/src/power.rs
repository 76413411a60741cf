//! Plain power transform.

use mpyr_core::ImageAdapter;

use crate::{GainResult, fast_pow};

/// Replaces every sample `p` of an F32 image with `fast_pow(p, power)`.
///
/// No sign or zero handling: only meaningful for strictly positive images.
///
/// # Errors
///
/// - [`mpyr_core::CoreError::InvalidImageType`] for non-F32 images
pub fn apply_power<A>(image: &mut A, power: f64) -> GainResult<()>
where
    A: ImageAdapter + ?Sized,
{
    let mut view = image.resolve_mut()?.into_f32("apply_power")?;
    for row in view.rows_mut() {
        for p in row {
            *p = fast_pow(f64::from(*p), power) as f32;
        }
    }
    Ok(())
}
