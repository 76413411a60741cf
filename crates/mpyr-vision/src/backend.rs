//! Vision backend abstraction.
//!
//! Host entry points talk to a [`VisionBackend`] rather than to the
//! algorithms directly, so a binding to a native vision library can replace
//! the pure-Rust [`CpuVision`] without changing callers.

use mpyr_core::{ImageAdapter, ResizableImage};

use crate::{ClaheParams, UnsharpParams, VisionResult, clahe, pyramid, unsharp};

/// Whole-image operations a vision library provides.
///
/// Every operation validates both images before resizing or writing the
/// destination.
pub trait VisionBackend: Send + Sync {
    /// Backend name for logs and reports.
    fn name(&self) -> &'static str;

    /// Gaussian downsample into `dst`, resized to half the source size.
    fn pyr_down(&self, src: &dyn ImageAdapter, dst: &mut dyn ResizableImage) -> VisionResult<()>;

    /// Gaussian upsample into `dst`, resized to twice the source size.
    fn pyr_up(&self, src: &dyn ImageAdapter, dst: &mut dyn ResizableImage) -> VisionResult<()>;

    /// CLAHE on U16 images. Effective parameters are written back.
    fn clahe(
        &self,
        src: &dyn ImageAdapter,
        dst: &mut dyn ResizableImage,
        params: &mut ClaheParams,
    ) -> VisionResult<()>;

    /// Thresholded unsharp mask.
    fn unsharp_mask(
        &self,
        src: &dyn ImageAdapter,
        dst: &mut dyn ResizableImage,
        params: &UnsharpParams,
    ) -> VisionResult<()>;
}

/// Pure-Rust backend; row loops use rayon with the `parallel` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuVision;

impl VisionBackend for CpuVision {
    fn name(&self) -> &'static str {
        "CPU"
    }

    fn pyr_down(&self, src: &dyn ImageAdapter, dst: &mut dyn ResizableImage) -> VisionResult<()> {
        pyramid::pyr_down(src, dst)
    }

    fn pyr_up(&self, src: &dyn ImageAdapter, dst: &mut dyn ResizableImage) -> VisionResult<()> {
        pyramid::pyr_up(src, dst)
    }

    fn clahe(
        &self,
        src: &dyn ImageAdapter,
        dst: &mut dyn ResizableImage,
        params: &mut ClaheParams,
    ) -> VisionResult<()> {
        clahe::clahe(src, dst, params)
    }

    fn unsharp_mask(
        &self,
        src: &dyn ImageAdapter,
        dst: &mut dyn ResizableImage,
        params: &UnsharpParams,
    ) -> VisionResult<()> {
        unsharp::unsharp_mask(src, dst, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpyr_core::HostImage;

    #[test]
    fn test_backend_is_object_safe() {
        let backend: Box<dyn VisionBackend> = Box::new(CpuVision);
        assert_eq!(backend.name(), "CPU");

        let src = HostImage::from_f32(2, 2, vec![1.0; 4]).unwrap();
        let mut dst = HostImage::f32(0, 0);
        backend.pyr_up(&src, &mut dst).unwrap();
        assert_eq!(dst.to_f32_vec().unwrap(), vec![1.0; 16]);
    }
}
