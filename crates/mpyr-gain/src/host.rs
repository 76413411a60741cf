//! Host calling convention.
//!
//! These wrappers mirror how the host application calls in: image handles may
//! be missing (`None`), failures are written into an [`ErrorCluster`] instead of
//! being returned, and a cluster that already carries an error makes the call a
//! no-op. The zero-check policy comes from [`GainConfig::from_env`].

use mpyr_core::{CoreError, ErrorCluster, ErrorCode, ImageAdapter, ScanlineRange};
use tracing::error;

use crate::{
    CastMode, GainConfig, GainError, GainKernel, GainResult, GainSession, TransformParameters,
    api, cast, power,
};

fn kernel(divider: f64, power: f64, multiplier: f64) -> GainKernel {
    GainConfig::from_env().kernel(TransformParameters::new(divider, power, multiplier))
}

fn required<A: ?Sized>(image: Option<&mut A>) -> GainResult<&mut A> {
    image.ok_or_else(|| CoreError::InvalidImageHandle.into())
}

/// Sequential gain transform over the whole image.
pub fn apply_transform<A>(
    image: Option<&mut A>,
    divider: f64,
    power: f64,
    multiplier: f64,
    cluster: &mut ErrorCluster,
) where
    A: ImageAdapter + ?Sized,
{
    cluster.run("apply_transform", || -> GainResult<()> {
        api::apply_gain_transform(required(image)?, &kernel(divider, power, multiplier))
    });
}

/// Sequential gain transform over rows `[start_line, end_line)`.
///
/// Negative line numbers are rejected as an invalid range.
pub fn apply_transform_rows<A>(
    image: Option<&mut A>,
    start_line: i32,
    end_line: i32,
    divider: f64,
    power: f64,
    multiplier: f64,
    cluster: &mut ErrorCluster,
) where
    A: ImageAdapter + ?Sized,
{
    cluster.run("apply_transform_rows", || -> GainResult<()> {
        let image = required(image)?;
        let range = match (usize::try_from(start_line), usize::try_from(end_line)) {
            (Ok(s), Ok(e)) => ScanlineRange::new(s, e),
            _ => {
                let height = image.resolve()?.height();
                return Err(CoreError::InvalidRange {
                    start: start_line.max(0) as usize,
                    end: end_line.max(0) as usize,
                    height,
                }
                .into());
            }
        };
        api::apply_gain_transform_rows(image, range, &kernel(divider, power, multiplier))
    });
}

/// Split transform on the process-wide shared pool.
pub fn apply_transform_parallel<A>(
    image: Option<&mut A>,
    divider: f64,
    power: f64,
    multiplier: f64,
    cluster: &mut ErrorCluster,
) where
    A: ImageAdapter + ?Sized,
{
    cluster.run("apply_transform_parallel", || -> GainResult<()> {
        api::apply_gain_transform_parallel(required(image)?, &kernel(divider, power, multiplier))
    });
}

/// Split transform on the session's prepared pool.
pub fn apply_transform_prepared<A>(
    session: &GainSession,
    image: Option<&mut A>,
    divider: f64,
    power: f64,
    multiplier: f64,
    cluster: &mut ErrorCluster,
) where
    A: ImageAdapter + ?Sized,
{
    cluster.run("apply_transform_prepared", || -> GainResult<()> {
        let kernel = session
            .config()
            .kernel(TransformParameters::new(divider, power, multiplier));
        session.apply_gain_transform_parallel(required(image)?, &kernel)
    });
}

/// Prepares the session pool. Returns the worker count created, or a
/// negative error code when the pool could not be created.
///
/// `requested <= 0` selects the default worker count.
pub fn prepare_pool(session: &mut GainSession, requested: i32) -> i32 {
    let requested = usize::try_from(requested).unwrap_or(0);
    match session.prepare_pool(requested) {
        Ok(created) => i32::try_from(created).unwrap_or(i32::MAX),
        Err(e) => {
            error!(error = %e, "prepare_pool failed");
            e.code()
        }
    }
}

/// Discards the session pool. Returns `0`, or `1` if no pool was prepared.
pub fn unprepare_pool(session: &mut GainSession) -> i32 {
    session.unprepare_pool().code()
}

/// In-place `p <- fast_pow(p, power)`.
pub fn apply_power<A>(image: Option<&mut A>, power: f64, cluster: &mut ErrorCluster)
where
    A: ImageAdapter + ?Sized,
{
    cluster.run("apply_power", || -> GainResult<()> {
        power::apply_power(required(image)?, power)
    });
}

/// F32 to U16 cast over rows `[start_line, end_line)`.
pub fn cast_image<S, D>(
    src: Option<&S>,
    dst: Option<&mut D>,
    start_line: i32,
    end_line: i32,
    mode: CastMode,
    cluster: &mut ErrorCluster,
) where
    S: ImageAdapter + ?Sized,
    D: ImageAdapter + ?Sized,
{
    cluster.run("cast_image", || -> GainResult<()> {
        let src = src.ok_or(GainError::Core(CoreError::InvalidImageHandle))?;
        let dst = required(dst)?;
        let range = ScanlineRange::new(
            usize::try_from(start_line).unwrap_or(usize::MAX),
            usize::try_from(end_line).unwrap_or(usize::MAX),
        );
        cast::cast_to_u16(src, dst, range, mode)
    });
}
