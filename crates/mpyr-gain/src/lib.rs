//! # mpyr-gain
//!
//! Power-law gain transform for F32 host images:
//!
//! ```text
//! p <- sign(p) * multiplier * (|p| / divider)^power
//! ```
//!
//! The power is computed with [`fast_pow`], a bit-level approximation that
//! trades accuracy for speed (see [`fast_pow::characterize`]).
//!
//! ## Entry points
//!
//! - [`apply_gain_transform`] / [`apply_gain_transform_rows`] - sequential
//! - [`apply_gain_transform_parallel`] - split across the shared pool
//! - [`GainSession`] - prepare/unprepare a caller-owned pool and split across it
//! - [`host`] - the same operations with host-style error clusters
//!
//! Extras: [`apply_power`] and [`cast_to_u16`].
//!
//! ## Configuration
//!
//! [`GainConfig`] reads `MPYR_WORKERS`, `MPYR_SPLIT_PARTS`, `MPYR_ZERO_CHECK` and
//! `MPYR_MAGNITUDE`.
//!
//! ## Example
//!
//! ```rust
//! use mpyr_core::HostImage;
//! use mpyr_gain::{GainKernel, ZeroCheckPolicy, apply_gain_transform};
//!
//! let mut img = HostImage::from_f32(4, 4, vec![2.0; 16]).unwrap();
//! let kernel = GainKernel::from_parts(2.0, 2.0, 1.0)
//!     .with_policy(ZeroCheckPolicy::CheckRawValue);
//! apply_gain_transform(&mut img, &kernel).unwrap();
//! ```

#![warn(missing_docs)]

pub mod api;
pub mod cast;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fast_pow;
pub mod host;
pub mod kernel;
pub mod power;
pub mod session;

pub use api::{apply_gain_transform, apply_gain_transform_parallel, apply_gain_transform_rows};
pub use cast::{CastMode, cast_to_u16};
pub use config::GainConfig;
pub use dispatch::SplitDispatcher;
pub use error::*;
pub use fast_pow::{Accuracy, fast_pow};
pub use kernel::{GainKernel, MagnitudeMode, TransformParameters, ZeroCheckPolicy, transform};
pub use power::apply_power;
pub use session::{GainSession, PoolStatus};
