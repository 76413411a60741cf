//! Host handle resolution.
//!
//! An [`ImageAdapter`] turns whatever the host passed in into a typed, strided
//! view that lives no longer than the borrow of the adapter. Two adapters are
//! provided:
//!
//! - [`crate::HostImage`] - an owned buffer, used by tests and by Rust callers
//! - [`RawImage`] - a host descriptor reached through a raw pointer
//!
//! [`resolve_handle`] adds the null-handle check the host calling convention
//! needs: a missing handle is [`CoreError::InvalidImageHandle`].

use std::ffi::c_void;

use crate::{
    CoreError, CoreResult, HostImage, HostImageType, ImageMut, ImageRef, ImageView, ImageViewMut,
    check_geometry,
};

/// Resolves a host image into a borrowed typed view.
pub trait ImageAdapter {
    /// Immutable view of the image.
    fn resolve(&self) -> CoreResult<ImageRef<'_>>;

    /// Mutable view of the image.
    fn resolve_mut(&mut self) -> CoreResult<ImageMut<'_>>;
}

/// An adapter whose logical size can be changed by the callee, as destination
/// images of resampling operations require.
pub trait ResizableImage: ImageAdapter {
    /// Reallocates to `width x height`, discarding contents.
    fn set_size(&mut self, width: usize, height: usize) -> CoreResult<()>;
}

impl ImageAdapter for HostImage {
    fn resolve(&self) -> CoreResult<ImageRef<'_>> {
        self.view()
    }

    fn resolve_mut(&mut self) -> CoreResult<ImageMut<'_>> {
        self.view_mut()
    }
}

impl ResizableImage for HostImage {
    fn set_size(&mut self, width: usize, height: usize) -> CoreResult<()> {
        HostImage::set_size(self, width, height);
        Ok(())
    }
}

/// Resolves an optional handle mutably; `None` models a null host handle.
pub fn resolve_handle<'a, A>(handle: Option<&'a mut A>) -> CoreResult<ImageMut<'a>>
where
    A: ImageAdapter + ?Sized,
{
    handle.ok_or(CoreError::InvalidImageHandle)?.resolve_mut()
}

/// Resolves an optional handle immutably; `None` models a null host handle.
pub fn resolve_handle_ref<'a, A>(handle: Option<&'a A>) -> CoreResult<ImageRef<'a>>
where
    A: ImageAdapter + ?Sized,
{
    handle.ok_or(CoreError::InvalidImageHandle)?.resolve()
}

// =============================================================================
// Raw host descriptor
// =============================================================================

/// Host image descriptor layout.
#[repr(C)]
#[derive(Debug)]
pub struct RawImageInfo {
    /// Host pixel type code (see [`HostImageType::from_code`]).
    pub image_type: i32,
    /// Width in pixels.
    pub x_res: i32,
    /// Height in rows.
    pub y_res: i32,
    /// Row pitch in samples.
    pub pixels_per_line: i32,
    /// First visible sample.
    pub image_start: *mut c_void,
}

/// Adapter over a [`RawImageInfo`] owned by the host.
#[derive(Debug)]
pub struct RawImage<'a> {
    info: &'a mut RawImageInfo,
}

impl<'a> RawImage<'a> {
    /// Wraps a descriptor pointer; returns `None` for null.
    ///
    /// # Safety
    ///
    /// If non-null, `ptr` must point to a valid descriptor for `'a`. When
    /// `image_start` is non-null it must point to at least
    /// `(y_res - 1) * pixels_per_line + x_res` properly aligned samples of the
    /// declared type, and nothing else may access those samples while a view
    /// obtained from this adapter is alive.
    pub unsafe fn from_ptr(ptr: *mut RawImageInfo) -> Option<Self> {
        // SAFETY: validity and exclusivity are the caller's contract.
        unsafe { ptr.as_mut() }.map(|info| Self { info })
    }

    /// Reported host pixel type.
    pub fn image_type(&self) -> HostImageType {
        HostImageType::from_code(self.info.image_type)
    }

    fn geometry(&self) -> CoreResult<(usize, usize, usize, usize)> {
        let info = &*self.info;
        if info.image_start.is_null() {
            return Err(CoreError::InvalidImageHandle);
        }
        let bad = || CoreError::InvalidGeometry {
            width: info.x_res.max(0) as usize,
            height: info.y_res.max(0) as usize,
            stride: info.pixels_per_line.max(0) as usize,
            len: 0,
        };
        let width = usize::try_from(info.x_res).map_err(|_| bad())?;
        let height = usize::try_from(info.y_res).map_err(|_| bad())?;
        let stride = usize::try_from(info.pixels_per_line).map_err(|_| bad())?;
        let len = if height == 0 { 0 } else { (height - 1) * stride + width };
        check_geometry(width, height, stride, len)?;
        Ok((width, height, stride, len))
    }
}

impl ImageAdapter for RawImage<'_> {
    fn resolve(&self) -> CoreResult<ImageRef<'_>> {
        let (w, h, s, len) = self.geometry()?;
        let ptr = self.info.image_start;
        match self.image_type() {
            HostImageType::Sgl => {
                // SAFETY: `from_ptr` guarantees `len` readable f32 samples.
                let data = unsafe { std::slice::from_raw_parts(ptr as *const f32, len) };
                Ok(ImageRef::F32(ImageView::new(data, w, h, s)?))
            }
            HostImageType::U16 => {
                // SAFETY: `from_ptr` guarantees `len` readable u16 samples.
                let data = unsafe { std::slice::from_raw_parts(ptr as *const u16, len) };
                Ok(ImageRef::U16(ImageView::new(data, w, h, s)?))
            }
            other => Err(CoreError::invalid_type("resolve", other)),
        }
    }

    fn resolve_mut(&mut self) -> CoreResult<ImageMut<'_>> {
        let (w, h, s, len) = self.geometry()?;
        let ptr = self.info.image_start;
        match self.image_type() {
            HostImageType::Sgl => {
                // SAFETY: `from_ptr` guarantees `len` exclusive f32 samples.
                let data = unsafe { std::slice::from_raw_parts_mut(ptr as *mut f32, len) };
                Ok(ImageMut::F32(ImageViewMut::new(data, w, h, s)?))
            }
            HostImageType::U16 => {
                // SAFETY: `from_ptr` guarantees `len` exclusive u16 samples.
                let data = unsafe { std::slice::from_raw_parts_mut(ptr as *mut u16, len) };
                Ok(ImageMut::U16(ImageViewMut::new(data, w, h, s)?))
            }
            other => Err(CoreError::invalid_type("resolve", other)),
        }
    }
}
