//! Split-row parallel dispatch.
//!
//! [`SplitDispatcher`] cuts an image into `parts` row bands with
//! [`partition_rows`], schedules one gain job per band on a [`ThreadPool`] and
//! returns once every job has been waited on and released.
//!
//! ```text
//! height 7, parts 2
//!
//!   rows 0..3  -> job A ─┐
//!   rows 3..7  -> job B ─┴─> wait A, wait B, release A, release B
//! ```
//!
//! Bands are disjoint slices of the same buffer, so jobs write without locks.
//! Each job captures its own copy of the kernel.
//!
//! For small images the scheduling cost can exceed the gain from running two
//! bands at once; `mpyr bench` measures the crossover.

use mpyr_core::{CoreError, ImageViewMut, partition_rows};
use mpyr_pool::{JobId, ThreadPool, Timeout};
use tracing::debug;

use crate::{GainKernel, GainResult};

/// Row-band dispatcher over a worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitDispatcher {
    parts: usize,
}

impl Default for SplitDispatcher {
    fn default() -> Self {
        Self {
            parts: Self::DEFAULT_PARTS,
        }
    }
}

impl SplitDispatcher {
    /// Two bands split at `height / 2`.
    pub const DEFAULT_PARTS: usize = 2;

    /// Dispatcher producing `parts` bands.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidParameter`] when `parts == 0`.
    pub fn new(parts: usize) -> GainResult<Self> {
        if parts == 0 {
            return Err(CoreError::invalid_parameter("split needs at least one part").into());
        }
        Ok(Self { parts })
    }

    /// Number of bands.
    #[inline]
    pub fn parts(&self) -> usize {
        self.parts
    }

    /// Applies `kernel` to every row of `view` using `pool`, one job per band.
    ///
    /// Blocks until all jobs have finished. Every job is waited on and released
    /// even if an earlier one failed; the first failure is returned.
    ///
    /// # Errors
    ///
    /// - [`mpyr_pool::PoolError::JobPanicked`] if a band job panicked
    pub fn dispatch(
        &self,
        pool: &ThreadPool,
        view: ImageViewMut<'_, f32>,
        kernel: &GainKernel,
    ) -> GainResult<()> {
        let height = view.height();
        let ranges = partition_rows(height, self.parts)?;
        let bands = view.split_rows(&ranges)?;
        debug!(rows = height, parts = self.parts, workers = pool.workers(), "split dispatch");

        let kernel = *kernel;
        pool.scope(|s| {
            let ids: Vec<JobId> = bands
                .into_iter()
                .map(|band| s.schedule(move || kernel.apply_band(band)))
                .collect();

            let mut result = Ok(());
            for id in ids {
                let waited = s.wait(id, Timeout::Infinite);
                let released = s.release(id);
                if result.is_ok() {
                    result = waited.and(released);
                }
            }
            result
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpyr_core::ScanlineRange;

    use crate::transform;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| ((i % 97) as f32 - 48.0) * 0.37).collect()
    }

    #[test]
    fn test_zero_parts_rejected() {
        assert!(SplitDispatcher::new(0).is_err());
        assert_eq!(SplitDispatcher::default().parts(), 2);
    }

    #[test]
    fn test_matches_sequential_bitwise() {
        let pool = ThreadPool::new(2).unwrap();
        let kernel = GainKernel::from_parts(3.0, 2.2, 1.5);
        for &(w, h, s) in &[(5, 7, 8), (16, 1, 16), (3, 0, 3), (1, 33, 4)] {
            let input = ramp(s * h);
            let mut seq = input.clone();

            let mut view = ImageViewMut::new(&mut seq, w, h, s).unwrap();
            transform(&mut view, ScanlineRange::full(h), &kernel).unwrap();

            for parts in [1, 2, 3, 8] {
                let mut buf = input.clone();
                let view = ImageViewMut::new(&mut buf, w, h, s).unwrap();
                SplitDispatcher::new(parts)
                    .unwrap()
                    .dispatch(&pool, view, &kernel)
                    .unwrap();
                let a: Vec<u32> = seq.iter().map(|v| v.to_bits()).collect();
                let b: Vec<u32> = buf.iter().map(|v| v.to_bits()).collect();
                assert_eq!(a, b, "{w}x{h} stride {s} parts {parts}");
            }
        }
        assert_eq!(pool.tracked_jobs(), 0);
    }
}
