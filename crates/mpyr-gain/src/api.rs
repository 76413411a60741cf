//! Gain transform entry points.
//!
//! | Function | Rows | Pool |
//! |----------|------|------|
//! | [`apply_gain_transform`] | all | none |
//! | [`apply_gain_transform_rows`] | `[start, end)` | none |
//! | [`apply_gain_transform_parallel`] | all | process-wide shared pool |
//! | [`GainSession::apply_gain_transform_parallel`](crate::GainSession::apply_gain_transform_parallel) | all | prepared pool |
//!
//! Every entry point resolves the image and checks its type before a sample
//! is written; a rejected image is left untouched.

use mpyr_core::{ImageAdapter, ScanlineRange};
use tracing::trace;

use crate::{GainConfig, GainKernel, GainResult, transform};

/// Applies `kernel` to every sample of an F32 image.
///
/// # Errors
///
/// - [`mpyr_core::CoreError::InvalidImageType`] for non-F32 images
///
/// # Example
///
/// ```rust
/// use mpyr_core::HostImage;
/// use mpyr_gain::{GainKernel, apply_gain_transform};
///
/// let mut img = HostImage::from_f32(3, 1, vec![-4.0, 0.0, 4.0]).unwrap();
/// apply_gain_transform(&mut img, &GainKernel::from_parts(2.0, 2.0, 1.0)).unwrap();
///
/// let out = img.to_f32_vec().unwrap();
/// assert!((out[0] + 1.0).abs() < 0.06 && out[1] == 0.0 && (out[2] - 1.0).abs() < 0.06);
/// ```
pub fn apply_gain_transform<A>(image: &mut A, kernel: &GainKernel) -> GainResult<()>
where
    A: ImageAdapter + ?Sized,
{
    let mut view = image.resolve_mut()?.into_f32("apply_gain_transform")?;
    let range = view.full_range();
    transform(&mut view, range, kernel)?;
    Ok(())
}

/// Applies `kernel` to rows `[range.start, range.end)` of an F32 image.
///
/// # Errors
///
/// - [`mpyr_core::CoreError::InvalidImageType`] for non-F32 images
/// - [`mpyr_core::CoreError::InvalidRange`] if the range leaves `[0, height]`
pub fn apply_gain_transform_rows<A>(
    image: &mut A,
    range: ScanlineRange,
    kernel: &GainKernel,
) -> GainResult<()>
where
    A: ImageAdapter + ?Sized,
{
    let mut view = image
        .resolve_mut()?
        .into_f32("apply_gain_transform_rows")?;
    transform(&mut view, range, kernel)?;
    Ok(())
}

/// Applies `kernel` on the process-wide shared pool.
///
/// The pool is created on first use with `MPYR_WORKERS` workers and the image
/// is split into `MPYR_SPLIT_PARTS` bands (see [`GainConfig`]).
///
/// # Errors
///
/// - [`mpyr_core::CoreError::InvalidImageType`] for non-F32 images
/// - [`crate::GainError::Pool`] if the shared pool cannot be created
pub fn apply_gain_transform_parallel<A>(image: &mut A, kernel: &GainKernel) -> GainResult<()>
where
    A: ImageAdapter + ?Sized,
{
    let view = image
        .resolve_mut()?
        .into_f32("apply_gain_transform_parallel")?;
    let config = GainConfig::from_env();
    let pool = mpyr_pool::shared(config.workers)?;
    trace!(workers = pool.workers(), "using shared pool");
    config.dispatcher().dispatch(pool, view, kernel)
}
