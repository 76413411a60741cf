//! # mpyr-core
//!
//! Core types shared by every mpyr crate.
//!
//! - [`HostImage`] / [`RawImage`] - images owned by the host application
//! - [`ImageAdapter`] - resolves a host image into a borrowed typed view
//! - [`ImageView`], [`ImageViewMut`] - strided views with row padding
//! - [`ScanlineRange`], [`partition_rows`] - row bands for parallel work
//! - [`CoreError`], [`ErrorCluster`] - validation errors and host-style reporting
//!
//! ## Borrowing model
//!
//! Pixel buffers always belong to the host. An operation resolves the handle,
//! works on the borrowed view, and returns; nothing in mpyr holds on to a view
//! after the call. Parallel work splits one [`ImageViewMut`] into disjoint
//! [`RowBand`]s, so concurrent writers never alias:
//!
//! ```
//! use mpyr_core::{HostImage, ImageAdapter, partition_rows};
//!
//! let mut img = HostImage::f32(4, 7);
//! let view = img.resolve_mut().unwrap().into_f32("example").unwrap();
//! let ranges = partition_rows(view.height(), 2).unwrap();
//! let bands = view.split_rows(&ranges).unwrap();
//! assert_eq!(bands[0].range.end, 3);
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//! mpyr-core (this crate)
//!    ^
//!    +-- mpyr-gain   (fast pow, gain kernel, split dispatch)
//!    +-- mpyr-vision (pyramid, CLAHE, unsharp mask)
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Serialize/Deserialize for ranges, element types and [`ErrorCluster`]

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod adapter;
pub mod cluster;
pub mod error;
pub mod format;
pub mod host;
pub mod image;
pub mod range;

pub use adapter::*;
pub use cluster::*;
pub use error::*;
pub use format::*;
pub use host::*;
pub use image::*;
pub use range::*;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use mpyr_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::adapter::{ImageAdapter, ResizableImage, resolve_handle};
    pub use crate::cluster::ErrorCluster;
    pub use crate::error::{CoreError, CoreResult, ErrorCode};
    pub use crate::format::{ElementType, HostImageType, Sample};
    pub use crate::host::HostImage;
    pub use crate::image::{ImageMut, ImageRef, ImageView, ImageViewMut, RowBand};
    pub use crate::range::{ScanlineRange, partition_rows};
}
