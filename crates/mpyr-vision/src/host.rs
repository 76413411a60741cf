//! Host calling convention for vision operations.
//!
//! Missing handles are `None`, failures land in an [`ErrorCluster`], and a
//! cluster that already holds an error turns the call into a no-op.

use mpyr_core::{CoreError, ErrorCluster, ImageAdapter, ResizableImage};

use crate::{ClaheParams, UnsharpParams, VisionBackend, VisionError, VisionResult};

fn handles<'a, S, D>(
    src: Option<&'a S>,
    dst: Option<&'a mut D>,
) -> VisionResult<(&'a dyn ImageAdapter, &'a mut dyn ResizableImage)>
where
    S: ImageAdapter,
    D: ResizableImage,
{
    match (src, dst) {
        (Some(src), Some(dst)) => {
            let src: &dyn ImageAdapter = src;
            let dst: &mut dyn ResizableImage = dst;
            Ok((src, dst))
        }
        _ => Err(CoreError::InvalidImageHandle.into()),
    }
}

/// Gaussian downsample.
pub fn pyr_down<S, D>(
    backend: &dyn VisionBackend,
    src: Option<&S>,
    dst: Option<&mut D>,
    cluster: &mut ErrorCluster,
) where
    S: ImageAdapter,
    D: ResizableImage,
{
    cluster.run("pyr_down", || -> VisionResult<()> {
        let (src, dst) = handles(src, dst)?;
        backend.pyr_down(src, dst)
    });
}

/// Gaussian upsample.
pub fn pyr_up<S, D>(
    backend: &dyn VisionBackend,
    src: Option<&S>,
    dst: Option<&mut D>,
    cluster: &mut ErrorCluster,
) where
    S: ImageAdapter,
    D: ResizableImage,
{
    cluster.run("pyr_up", || -> VisionResult<()> {
        let (src, dst) = handles(src, dst)?;
        backend.pyr_up(src, dst)
    });
}

/// CLAHE with in/out parameters: zeros are replaced by the defaults that were
/// used. Negative tile counts are rejected.
pub fn clahe<S, D>(
    backend: &dyn VisionBackend,
    src: Option<&S>,
    dst: Option<&mut D>,
    clip_limit: &mut f64,
    tile_width: &mut i32,
    tile_height: &mut i32,
    cluster: &mut ErrorCluster,
) where
    S: ImageAdapter,
    D: ResizableImage,
{
    cluster.run("clahe", || -> VisionResult<()> {
        let (src, dst) = handles(src, dst)?;
        let tiles = |v: i32| {
            u32::try_from(v)
                .map_err(|_| VisionError::invalid_parameter(format!("tile count {v} is negative")))
        };
        let mut params = ClaheParams::new(*clip_limit, tiles(*tile_width)?, tiles(*tile_height)?);
        let result = backend.clahe(src, dst, &mut params);
        *clip_limit = params.clip_limit;
        *tile_width = i32::try_from(params.tile_width).unwrap_or(i32::MAX);
        *tile_height = i32::try_from(params.tile_height).unwrap_or(i32::MAX);
        result
    });
}

/// Thresholded unsharp mask.
pub fn unsharp_mask<S, D>(
    backend: &dyn VisionBackend,
    src: Option<&S>,
    dst: Option<&mut D>,
    radius: f32,
    amount: f32,
    threshold: f32,
    cluster: &mut ErrorCluster,
) where
    S: ImageAdapter,
    D: ResizableImage,
{
    cluster.run("unsharp_mask", || -> VisionResult<()> {
        let (src, dst) = handles(src, dst)?;
        backend.unsharp_mask(src, dst, &UnsharpParams::new(radius, amount, threshold))
    });
}
