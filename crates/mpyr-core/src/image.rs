//! Strided image views.
//!
//! This module provides borrowed views over host-owned pixel buffers:
//! - [`ImageView`] - immutable view with row stride
//! - [`ImageViewMut`] - mutable view with row stride, splittable into disjoint row bands
//! - [`ImageRef`] / [`ImageMut`] - views tagged with their runtime element type
//!
//! # Memory Layout
//!
//! Samples are stored row-major. Each row holds `width` samples followed by
//! `stride - width` padding samples that are never read or written:
//!
//! ```text
//! [p p p p . .]  <- row 0 (width 4, stride 6)
//! [p p p p . .]  <- row 1
//! [p p p p]      <- last row may omit its padding
//! ```
//!
//! A buffer is valid when it holds at least `(height - 1) * stride + width`
//! samples.
//!
//! # Hot path
//!
//! Kernels iterate whole rows as slices ([`ImageViewMut::rows_mut`]), so the
//! bounds check happens once per row rather than once per pixel. Per-pixel
//! accessors ([`ImageView::get`], [`ImageViewMut::set`]) are checked.
//!
//! # Splitting
//!
//! [`ImageViewMut::split_rows`] consumes a view and hands out one
//! [`RowBand`] per scanline range. The ranges must tile `[0, height)` in order,
//! so every band borrows a disjoint slice of the buffer and bands can be moved
//! to different threads without locking.

use std::mem;

use crate::{CoreError, CoreResult, ElementType, HostImageType, Sample, ScanlineRange};

/// Validates width/height/stride against an available sample count.
pub fn check_geometry(width: usize, height: usize, stride: usize, len: usize) -> CoreResult<()> {
    let err = || CoreError::InvalidGeometry {
        width,
        height,
        stride,
        len,
    };
    if stride < width {
        return Err(err());
    }
    if height == 0 {
        return Ok(());
    }
    let required = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or_else(err)?;
    if len < required {
        return Err(err());
    }
    Ok(())
}

// =============================================================================
// Immutable view
// =============================================================================

/// Immutable strided view.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a, T: Sample> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T: Sample> ImageView<'a, T> {
    /// Creates a view over `data`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidGeometry`] if `stride < width` or the buffer is
    /// too short.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> CoreResult<Self> {
        check_geometry(width, height, stride, data.len())?;
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row pitch in samples.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Element type of the samples.
    #[inline]
    pub fn element_type(&self) -> ElementType {
        T::ELEMENT
    }

    /// Row `y` without padding.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: usize) -> &'a [T] {
        assert!(y < self.height, "row {y} out of bounds for height {}", self.height);
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Iterates rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &'a [T]> + 'a {
        let data = self.data;
        let (width, stride) = (self.width, self.stride);
        (0..self.height).map(move |y| &data[y * stride..y * stride + width])
    }

    /// Sample at `(x, y)`, or `None` outside the image.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        (x < self.width && y < self.height).then(|| self.data[y * self.stride + x])
    }

    /// Copies the visible samples into a tightly packed buffer.
    pub fn to_contiguous(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.width * self.height);
        for row in self.rows() {
            out.extend_from_slice(row);
        }
        out
    }
}

// =============================================================================
// Mutable view
// =============================================================================

/// Mutable strided view.
#[derive(Debug)]
pub struct ImageViewMut<'a, T: Sample> {
    data: &'a mut [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T: Sample> ImageViewMut<'a, T> {
    /// Creates a mutable view over `data`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidGeometry`] if `stride < width` or the buffer is
    /// too short.
    pub fn new(data: &'a mut [T], width: usize, height: usize, stride: usize) -> CoreResult<Self> {
        check_geometry(width, height, stride, data.len())?;
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row pitch in samples.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Element type of the samples.
    #[inline]
    pub fn element_type(&self) -> ElementType {
        T::ELEMENT
    }

    /// All rows of this view.
    #[inline]
    pub fn full_range(&self) -> ScanlineRange {
        ScanlineRange::full(self.height)
    }

    /// Reborrows as an immutable view.
    pub fn as_view(&self) -> ImageView<'_, T> {
        ImageView {
            data: &*self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }

    /// Reborrows mutably for a shorter lifetime.
    pub fn reborrow(&mut self) -> ImageViewMut<'_, T> {
        ImageViewMut {
            data: &mut *self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }

    /// Mutable row `y` without padding.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.height, "row {y} out of bounds for height {}", self.height);
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    /// Sample at `(x, y)`, or `None` outside the image.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        (x < self.width && y < self.height).then(|| self.data[y * self.stride + x])
    }

    /// Writes a sample; returns `false` outside the image.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) -> bool {
        if x < self.width && y < self.height {
            self.data[y * self.stride + x] = value;
            true
        } else {
            false
        }
    }

    /// Iterates all rows mutably, top to bottom.
    pub fn rows_mut(&mut self) -> RowsMut<'_, T> {
        RowsMut {
            rest: &mut *self.data,
            remaining: self.height,
            width: self.width,
            stride: self.stride,
        }
    }

    /// Iterates the rows of `range` mutably.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRange`] if the range is reversed or extends
    /// past the last row.
    pub fn rows_in_mut(&mut self, range: ScanlineRange) -> CoreResult<RowsMut<'_, T>> {
        range.validate(self.height)?;
        if range.is_empty() {
            return Ok(RowsMut {
                rest: &mut [],
                remaining: 0,
                width: self.width,
                stride: self.stride,
            });
        }
        let offset = range.start * self.stride;
        Ok(RowsMut {
            rest: &mut self.data[offset..],
            remaining: range.len(),
            width: self.width,
            stride: self.stride,
        })
    }

    /// Fills every visible sample; padding is left untouched.
    pub fn fill(&mut self, value: T) {
        for row in self.rows_mut() {
            row.fill(value);
        }
    }

    /// Copies visible samples from a view of the same size.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidGeometry`] when the sizes differ.
    pub fn copy_from(&mut self, src: &ImageView<'_, T>) -> CoreResult<()> {
        if src.width() != self.width || src.height() != self.height {
            return Err(CoreError::InvalidGeometry {
                width: src.width(),
                height: src.height(),
                stride: self.stride,
                len: self.data.len(),
            });
        }
        for (dst, src) in self.rows_mut().zip(src.rows()) {
            dst.copy_from_slice(src);
        }
        Ok(())
    }

    /// Consumes the view and splits it into disjoint row bands.
    ///
    /// `ranges` must be ordered, contiguous, start at row 0 and end at
    /// `height` (as produced by [`crate::partition_rows`]). Empty ranges are
    /// allowed and yield empty bands.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRange`] if the ranges leave a gap, overlap,
    /// or do not cover the image exactly.
    pub fn split_rows(self, ranges: &[ScanlineRange]) -> CoreResult<Vec<RowBand<'a, T>>> {
        let mut expected_start = 0;
        for range in ranges {
            if range.start != expected_start || range.end < range.start {
                return Err(CoreError::invalid_range(*range, self.height));
            }
            expected_start = range.end;
        }
        if expected_start != self.height {
            return Err(CoreError::invalid_range(
                ScanlineRange::new(expected_start, self.height),
                self.height,
            ));
        }

        let Self {
            data,
            width,
            height,
            stride,
        } = self;
        let mut rest: &'a mut [T] = data;
        let mut rows_left = height;
        let mut bands = Vec::with_capacity(ranges.len());
        for range in ranges {
            let rows = range.len();
            let chunk = if rows == rows_left {
                mem::take(&mut rest)
            } else {
                let (head, tail) = mem::take(&mut rest).split_at_mut(rows * stride);
                rest = tail;
                head
            };
            rows_left -= rows;
            bands.push(RowBand {
                range: *range,
                view: ImageViewMut {
                    data: chunk,
                    width,
                    height: rows,
                    stride,
                },
            });
        }
        Ok(bands)
    }
}

/// Iterator over mutable rows, produced by [`ImageViewMut::rows_mut`].
#[derive(Debug)]
pub struct RowsMut<'a, T> {
    rest: &'a mut [T],
    remaining: usize,
    width: usize,
    stride: usize,
}

impl<'a, T> Iterator for RowsMut<'a, T> {
    type Item = &'a mut [T];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let rest = mem::take(&mut self.rest);
        if self.remaining == 0 {
            return Some(&mut rest[..self.width]);
        }
        let (head, tail) = rest.split_at_mut(self.stride);
        self.rest = tail;
        Some(&mut head[..self.width])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for RowsMut<'_, T> {}

/// A mutable band of rows cut out of a larger view.
#[derive(Debug)]
pub struct RowBand<'a, T: Sample> {
    /// Rows of the parent image this band covers.
    pub range: ScanlineRange,
    /// View over just those rows; its row 0 is `range.start` of the parent.
    pub view: ImageViewMut<'a, T>,
}

// =============================================================================
// Runtime-typed views
// =============================================================================

/// Immutable view tagged with its element type.
#[derive(Debug, Clone, Copy)]
pub enum ImageRef<'a> {
    /// Float samples.
    F32(ImageView<'a, f32>),
    /// 16-bit unsigned samples.
    U16(ImageView<'a, u16>),
}

/// Mutable view tagged with its element type.
#[derive(Debug)]
pub enum ImageMut<'a> {
    /// Float samples.
    F32(ImageViewMut<'a, f32>),
    /// 16-bit unsigned samples.
    U16(ImageViewMut<'a, u16>),
}

macro_rules! tagged_accessors {
    ($ty:ident) => {
        impl<'a> $ty<'a> {
            /// Element type of the samples.
            pub fn element_type(&self) -> ElementType {
                match self {
                    Self::F32(_) => ElementType::F32,
                    Self::U16(_) => ElementType::U16,
                }
            }

            /// Width in pixels.
            pub fn width(&self) -> usize {
                match self {
                    Self::F32(v) => v.width(),
                    Self::U16(v) => v.width(),
                }
            }

            /// Height in rows.
            pub fn height(&self) -> usize {
                match self {
                    Self::F32(v) => v.height(),
                    Self::U16(v) => v.height(),
                }
            }

            /// Row pitch in samples.
            pub fn stride(&self) -> usize {
                match self {
                    Self::F32(v) => v.stride(),
                    Self::U16(v) => v.stride(),
                }
            }
        }
    };
}

tagged_accessors!(ImageRef);
tagged_accessors!(ImageMut);

impl<'a> ImageRef<'a> {
    /// Unwraps a float view or reports the type `op` rejected.
    pub fn into_f32(self, op: &'static str) -> CoreResult<ImageView<'a, f32>> {
        match self {
            Self::F32(v) => Ok(v),
            other => Err(CoreError::invalid_type(op, HostImageType::from(other.element_type()))),
        }
    }

    /// Unwraps a u16 view or reports the type `op` rejected.
    pub fn into_u16(self, op: &'static str) -> CoreResult<ImageView<'a, u16>> {
        match self {
            Self::U16(v) => Ok(v),
            other => Err(CoreError::invalid_type(op, HostImageType::from(other.element_type()))),
        }
    }
}

impl<'a> ImageMut<'a> {
    /// Unwraps a float view or reports the type `op` rejected.
    pub fn into_f32(self, op: &'static str) -> CoreResult<ImageViewMut<'a, f32>> {
        match self {
            Self::F32(v) => Ok(v),
            other => Err(CoreError::invalid_type(op, HostImageType::from(other.element_type()))),
        }
    }

    /// Unwraps a u16 view or reports the type `op` rejected.
    pub fn into_u16(self, op: &'static str) -> CoreResult<ImageViewMut<'a, u16>> {
        match self {
            Self::U16(v) => Ok(v),
            other => Err(CoreError::invalid_type(op, HostImageType::from(other.element_type()))),
        }
    }
}
