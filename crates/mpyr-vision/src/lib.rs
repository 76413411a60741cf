//! # mpyr-vision
//!
//! Whole-image vision operations on host images:
//!
//! - [`pyramid`] - Gaussian pyramid down/up sampling (U16, F32)
//! - [`clahe`] - contrast-limited adaptive histogram equalization (U16)
//! - [`unsharp`] - thresholded unsharp mask (U16, F32)
//!
//! Each operation validates handles and element types, resizes the
//! destination, and works on a contiguous f32 [`Plane`] copy of the source.
//! [`VisionBackend`] is the seam a native library binding would implement;
//! [`CpuVision`] is the built-in implementation.
//!
//! ## Example
//!
//! ```rust
//! use mpyr_core::HostImage;
//! use mpyr_vision::{CpuVision, VisionBackend};
//!
//! let src = HostImage::from_u16(8, 8, vec![1000; 64]).unwrap();
//! let mut half = HostImage::u16(0, 0);
//! CpuVision.pyr_down(&src, &mut half).unwrap();
//! assert_eq!((half.width(), half.height()), (4, 4));
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod clahe;
mod error;
pub mod host;
pub mod plane;
pub mod pyramid;
pub mod unsharp;

pub use backend::{CpuVision, VisionBackend};
pub use clahe::ClaheParams;
pub use error::{VisionError, VisionResult};
pub(crate) use plane::for_each_row;
pub use plane::{Plane, reflect101};
pub use pyramid::{pyr_down, pyr_up};
pub use unsharp::{UnsharpParams, unsharp_mask};
