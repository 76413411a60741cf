//! Error types for mpyr-core operations.
//!
//! Every failure that can be detected before a pixel is touched lives here:
//! unresolvable host handles, unsupported element types, source/destination
//! type mismatches, inconsistent buffer geometry and out-of-range scanlines.
//!
//! # Usage
//!
//! ```rust
//! use mpyr_core::{CoreError, CoreResult, ScanlineRange};
//!
//! fn check(range: ScanlineRange, height: usize) -> CoreResult<()> {
//!     if range.end > height {
//!         return Err(CoreError::invalid_range(range, height));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check(ScanlineRange::new(0, 4), 3).is_err());
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - derive macro for [`std::error::Error`] and [`std::fmt::Display`]
//!
//! # Used By
//!
//! - [`crate::adapter`] - handle resolution
//! - [`crate::image`] - view construction and row splitting
//! - `mpyr-gain`, `mpyr-vision` - wrapped into their own error enums

use thiserror::Error;

use crate::{ElementType, HostImageType, ScanlineRange};

/// Result type alias using [`CoreError`] as the error type.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Stable integer codes reported through an [`crate::ErrorCluster`].
///
/// Codes are negative so that `0` keeps meaning "no error" on the host side.
pub trait ErrorCode {
    /// Integer code for this error.
    fn code(&self) -> i32;
}

/// Code for a null or unresolvable host handle.
pub const CODE_INVALID_IMAGE_HANDLE: i32 = -2001;
/// Code for an element type the operation does not support.
pub const CODE_INVALID_IMAGE_TYPE: i32 = -2002;
/// Code for differing source and destination element types.
pub const CODE_TYPE_MISMATCH: i32 = -2003;
/// Code for inconsistent width/height/stride/length.
pub const CODE_INVALID_GEOMETRY: i32 = -2004;
/// Code for a scanline range outside the image.
pub const CODE_INVALID_RANGE: i32 = -2005;
/// Code for an invalid scalar parameter.
pub const CODE_INVALID_PARAMETER: i32 = -2006;

/// Validation errors raised before any pixel is read or written.
///
/// # Categories
///
/// - **Handle errors**: [`InvalidImageHandle`](CoreError::InvalidImageHandle)
/// - **Type errors**: [`InvalidImageType`](CoreError::InvalidImageType),
///   [`TypeMismatch`](CoreError::TypeMismatch)
/// - **Geometry errors**: [`InvalidGeometry`](CoreError::InvalidGeometry),
///   [`InvalidRange`](CoreError::InvalidRange)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The host handle is null or does not resolve to an image.
    #[error("invalid image handle")]
    InvalidImageHandle,

    /// The image element type is not supported by the requested operation.
    #[error("{op}: unsupported image type {found}")]
    InvalidImageType {
        /// Operation that rejected the image.
        op: &'static str,
        /// Element type reported by the host.
        found: HostImageType,
    },

    /// Source and destination element types differ where they must match.
    #[error("image type mismatch: source {src}, destination {dst}")]
    TypeMismatch {
        /// Source element type.
        src: ElementType,
        /// Destination element type.
        dst: ElementType,
    },

    /// Width, height, stride and buffer length are inconsistent.
    ///
    /// The buffer must hold at least `(height - 1) * stride + width` samples
    /// and `stride` must be at least `width`.
    #[error("invalid geometry: {width}x{height} stride {stride} over {len} samples")]
    InvalidGeometry {
        /// Logical width in pixels.
        width: usize,
        /// Height in rows.
        height: usize,
        /// Row pitch in samples.
        stride: usize,
        /// Available samples.
        len: usize,
    },

    /// Scanline range falls outside `[0, height]` or is reversed.
    #[error("scanline range [{start}, {end}) outside image of height {height}")]
    InvalidRange {
        /// First row.
        start: usize,
        /// One past the last row.
        end: usize,
        /// Image height.
        height: usize,
    },

    /// A scalar parameter is out of its domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl CoreError {
    /// Creates a [`CoreError::InvalidImageType`] error.
    #[inline]
    pub fn invalid_type(op: &'static str, found: impl Into<HostImageType>) -> Self {
        Self::InvalidImageType {
            op,
            found: found.into(),
        }
    }

    /// Creates a [`CoreError::InvalidRange`] error.
    #[inline]
    pub fn invalid_range(range: ScanlineRange, height: usize) -> Self {
        Self::InvalidRange {
            start: range.start,
            end: range.end,
            height,
        }
    }

    /// Creates a [`CoreError::InvalidParameter`] error.
    #[inline]
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Returns `true` for handle and type validation failures.
    #[inline]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidImageHandle | Self::InvalidImageType { .. } | Self::TypeMismatch { .. }
        )
    }
}

impl ErrorCode for CoreError {
    fn code(&self) -> i32 {
        match self {
            Self::InvalidImageHandle => CODE_INVALID_IMAGE_HANDLE,
            Self::InvalidImageType { .. } => CODE_INVALID_IMAGE_TYPE,
            Self::TypeMismatch { .. } => CODE_TYPE_MISMATCH,
            Self::InvalidGeometry { .. } => CODE_INVALID_GEOMETRY,
            Self::InvalidRange { .. } => CODE_INVALID_RANGE,
            Self::InvalidParameter(_) => CODE_INVALID_PARAMETER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_type_message() {
        let err = CoreError::invalid_type("apply_gain_transform", HostImageType::U8);
        let msg = err.to_string();
        assert!(msg.contains("apply_gain_transform"));
        assert!(msg.contains("U8"));
        assert_eq!(err.code(), CODE_INVALID_IMAGE_TYPE);
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_invalid_range_message() {
        let err = CoreError::invalid_range(ScanlineRange::new(2, 9), 7);
        assert_eq!(err.to_string(), "scanline range [2, 9) outside image of height 7");
        assert!(!err.is_validation_error());
    }

    #[test]
    fn test_codes_are_distinct_and_negative() {
        let errs = [
            CoreError::InvalidImageHandle,
            CoreError::invalid_type("op", ElementType::U16),
            CoreError::TypeMismatch {
                src: ElementType::F32,
                dst: ElementType::U16,
            },
            CoreError::InvalidGeometry {
                width: 1,
                height: 1,
                stride: 0,
                len: 0,
            },
            CoreError::invalid_range(ScanlineRange::new(0, 1), 0),
            CoreError::invalid_parameter("x"),
        ];
        let mut codes: Vec<i32> = errs.iter().map(ErrorCode::code).collect();
        assert!(codes.iter().all(|c| *c < 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errs.len());
    }
}
