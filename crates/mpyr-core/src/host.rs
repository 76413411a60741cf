//! Owned host image model.
//!
//! [`HostImage`] stands in for an image allocated and owned by the host
//! application: a typed buffer with a logical size, per-row padding, and a
//! host pixel type that may or may not be one mpyr can process. Operations
//! borrow it through [`crate::ImageAdapter`] for the duration of one call.
//!
//! # Example
//!
//! ```rust
//! use mpyr_core::{HostImage, ImageAdapter, ElementType};
//!
//! let mut img = HostImage::f32_with_padding(640, 480, 16);
//! assert_eq!(img.stride(), 656);
//!
//! let view = img.resolve_mut().unwrap();
//! assert_eq!(view.element_type(), ElementType::F32);
//! ```

use crate::{CoreError, CoreResult, ElementType, HostImageType, ImageMut, ImageRef, ImageView, ImageViewMut};

/// Pixel storage of a [`HostImage`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostPixels {
    /// Float samples.
    F32(Vec<f32>),
    /// 16-bit unsigned samples.
    U16(Vec<u16>),
    /// A host pixel type mpyr does not process. Carries no samples.
    Unsupported(HostImageType),
}

/// Image buffer owned by the host side.
#[derive(Debug, Clone, PartialEq)]
pub struct HostImage {
    width: usize,
    height: usize,
    padding: usize,
    pixels: HostPixels,
}

impl HostImage {
    /// Zero-filled float image without row padding.
    pub fn f32(width: usize, height: usize) -> Self {
        Self::f32_with_padding(width, height, 0)
    }

    /// Zero-filled float image with `padding` extra samples per row.
    pub fn f32_with_padding(width: usize, height: usize, padding: usize) -> Self {
        Self {
            width,
            height,
            padding,
            pixels: HostPixels::F32(vec![0.0; (width + padding) * height]),
        }
    }

    /// Zero-filled u16 image without row padding.
    pub fn u16(width: usize, height: usize) -> Self {
        Self::u16_with_padding(width, height, 0)
    }

    /// Zero-filled u16 image with `padding` extra samples per row.
    pub fn u16_with_padding(width: usize, height: usize, padding: usize) -> Self {
        Self {
            width,
            height,
            padding,
            pixels: HostPixels::U16(vec![0; (width + padding) * height]),
        }
    }

    /// Image of a host type mpyr rejects.
    pub fn unsupported(kind: HostImageType, width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            padding: 0,
            pixels: HostPixels::Unsupported(kind),
        }
    }

    /// Float image from tightly packed rows.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidGeometry`] if `data.len() != width * height`.
    pub fn from_f32(width: usize, height: usize, data: Vec<f32>) -> CoreResult<Self> {
        Self::from_packed(width, height, 0, data.len())?;
        Ok(Self {
            width,
            height,
            padding: 0,
            pixels: HostPixels::F32(data),
        })
    }

    /// U16 image from tightly packed rows.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidGeometry`] if `data.len() != width * height`.
    pub fn from_u16(width: usize, height: usize, data: Vec<u16>) -> CoreResult<Self> {
        Self::from_packed(width, height, 0, data.len())?;
        Ok(Self {
            width,
            height,
            padding: 0,
            pixels: HostPixels::U16(data),
        })
    }

    /// Float image from rows of `stride` samples, of which the first `width`
    /// are visible.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidGeometry`] if `stride < width` or
    /// `data.len() != stride * height`.
    pub fn from_f32_strided(
        width: usize,
        height: usize,
        stride: usize,
        data: Vec<f32>,
    ) -> CoreResult<Self> {
        let padding = stride.checked_sub(width).ok_or(CoreError::InvalidGeometry {
            width,
            height,
            stride,
            len: data.len(),
        })?;
        Self::from_packed(width, height, padding, data.len())?;
        Ok(Self {
            width,
            height,
            padding,
            pixels: HostPixels::F32(data),
        })
    }

    fn from_packed(width: usize, height: usize, padding: usize, len: usize) -> CoreResult<()> {
        if (width + padding) * height != len {
            return Err(CoreError::InvalidGeometry {
                width,
                height,
                stride: width + padding,
                len,
            });
        }
        Ok(())
    }

    /// Logical width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Extra samples at the end of every row.
    #[inline]
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Row pitch in samples.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width + self.padding
    }

    /// Host pixel type.
    pub fn image_type(&self) -> HostImageType {
        match &self.pixels {
            HostPixels::F32(_) => HostImageType::Sgl,
            HostPixels::U16(_) => HostImageType::U16,
            HostPixels::Unsupported(kind) => *kind,
        }
    }

    /// Supported element type, if any.
    pub fn element_type(&self) -> Option<ElementType> {
        self.image_type().element_type()
    }

    /// Raw storage, padding included.
    pub fn pixels(&self) -> &HostPixels {
        &self.pixels
    }

    /// Changes the logical size, reallocating zero-filled storage of the same
    /// type and padding. Existing contents are discarded.
    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let len = (width + self.padding) * height;
        match &mut self.pixels {
            HostPixels::F32(data) => {
                data.clear();
                data.resize(len, 0.0);
            }
            HostPixels::U16(data) => {
                data.clear();
                data.resize(len, 0);
            }
            HostPixels::Unsupported(_) => {}
        }
    }

    /// Immutable typed view.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidImageType`] for unsupported host types.
    pub fn view(&self) -> CoreResult<ImageRef<'_>> {
        let (w, h, s) = (self.width, self.height, self.stride());
        match &self.pixels {
            HostPixels::F32(data) => Ok(ImageRef::F32(ImageView::new(data, w, h, s)?)),
            HostPixels::U16(data) => Ok(ImageRef::U16(ImageView::new(data, w, h, s)?)),
            HostPixels::Unsupported(kind) => Err(CoreError::invalid_type("resolve", *kind)),
        }
    }

    /// Mutable typed view.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidImageType`] for unsupported host types.
    pub fn view_mut(&mut self) -> CoreResult<ImageMut<'_>> {
        let (w, h, s) = (self.width, self.height, self.stride());
        match &mut self.pixels {
            HostPixels::F32(data) => Ok(ImageMut::F32(ImageViewMut::new(data, w, h, s)?)),
            HostPixels::U16(data) => Ok(ImageMut::U16(ImageViewMut::new(data, w, h, s)?)),
            HostPixels::Unsupported(kind) => Err(CoreError::invalid_type("resolve", *kind)),
        }
    }

    /// Visible float samples, row-major without padding.
    pub fn to_f32_vec(&self) -> Option<Vec<f32>> {
        match self.view().ok()? {
            ImageRef::F32(v) => Some(v.to_contiguous()),
            ImageRef::U16(_) => None,
        }
    }

    /// Visible u16 samples, row-major without padding.
    pub fn to_u16_vec(&self) -> Option<Vec<u16>> {
        match self.view().ok()? {
            ImageRef::U16(v) => Some(v.to_contiguous()),
            ImageRef::F32(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_and_stride() {
        let img = HostImage::u16_with_padding(10, 4, 6);
        assert_eq!(img.stride(), 16);
        match img.pixels() {
            HostPixels::U16(d) => assert_eq!(d.len(), 64),
            other => panic!("unexpected storage {:?}", other),
        }
    }

    #[test]
    fn test_set_size_keeps_type_and_padding() {
        let mut img = HostImage::f32_with_padding(8, 8, 2);
        img.set_size(4, 3);
        assert_eq!((img.width(), img.height(), img.stride()), (4, 3, 6));
        assert_eq!(img.element_type(), Some(ElementType::F32));
        assert_eq!(img.to_f32_vec().map(|v| v.len()), Some(12));
    }

    #[test]
    fn test_unsupported_view_fails() {
        let mut img = HostImage::unsupported(HostImageType::Rgb, 4, 4);
        assert!(matches!(
            img.view_mut(),
            Err(CoreError::InvalidImageType {
                found: HostImageType::Rgb,
                ..
            })
        ));
        assert_eq!(img.element_type(), None);
    }

    #[test]
    fn test_from_packed_checks_length() {
        assert!(HostImage::from_f32(3, 3, vec![0.0; 9]).is_ok());
        assert!(HostImage::from_u16(3, 3, vec![0; 8]).is_err());
    }

    #[test]
    fn test_from_f32_strided() {
        let img = HostImage::from_f32_strided(2, 2, 3, vec![1.0, 2.0, 9.0, 3.0, 4.0, 9.0]).unwrap();
        assert_eq!(img.padding(), 1);
        assert_eq!(img.to_f32_vec().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert!(HostImage::from_f32_strided(3, 2, 2, vec![0.0; 6]).is_err());
        assert!(HostImage::from_f32_strided(2, 2, 3, vec![0.0; 5]).is_err());
    }
}
