//! Caller-owned pool session.
//!
//! [`GainSession`] owns the prepared worker pool that the prepared-pool
//! parallel transform runs on. The pool lives from
//! [`prepare_pool`](GainSession::prepare_pool) until
//! [`unprepare_pool`](GainSession::unprepare_pool) or until the session is
//! dropped, whichever comes first.
//!
//! ```rust
//! use mpyr_core::HostImage;
//! use mpyr_gain::{GainKernel, GainSession, PoolStatus};
//!
//! let mut session = GainSession::default();
//! assert_eq!(session.prepare_pool(0).unwrap(), 4);
//!
//! let mut img = HostImage::f32(64, 64);
//! session
//!     .apply_gain_transform_parallel(&mut img, &GainKernel::from_parts(1.0, 2.0, 1.0))
//!     .unwrap();
//!
//! assert!(matches!(session.unprepare_pool(), PoolStatus::Discarded { .. }));
//! assert_eq!(session.unprepare_pool(), PoolStatus::NotPrepared);
//! ```

use mpyr_core::ImageAdapter;
use mpyr_pool::{PoolBuilder, ThreadPool};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{GainConfig, GainError, GainKernel, GainResult, SplitDispatcher};

/// Outcome of [`GainSession::unprepare_pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolStatus {
    /// The pool was torn down.
    Discarded {
        /// Workers that exited.
        workers_joined: usize,
    },
    /// No pool was prepared; nothing was done.
    NotPrepared,
}

impl PoolStatus {
    /// Host status code: `0` after a discard, `1` when nothing was prepared.
    pub fn code(&self) -> i32 {
        match self {
            Self::Discarded { .. } => 0,
            Self::NotPrepared => 1,
        }
    }
}

/// Holds the prepared pool and the split settings.
#[derive(Debug)]
pub struct GainSession {
    config: GainConfig,
    dispatcher: SplitDispatcher,
    pool: Option<ThreadPool>,
}

impl Default for GainSession {
    fn default() -> Self {
        Self::new(GainConfig::default())
    }
}

impl GainSession {
    /// Session with no pool yet.
    pub fn new(config: GainConfig) -> Self {
        Self {
            dispatcher: config.dispatcher(),
            config,
            pool: None,
        }
    }

    /// Session configured from the environment.
    pub fn from_env() -> Self {
        Self::new(GainConfig::from_env())
    }

    /// Settings in use.
    pub fn config(&self) -> &GainConfig {
        &self.config
    }

    /// Dispatcher used by the parallel transform.
    pub fn dispatcher(&self) -> SplitDispatcher {
        self.dispatcher
    }

    /// `true` while a pool is prepared.
    pub fn is_prepared(&self) -> bool {
        self.pool.is_some()
    }

    /// The prepared pool, if any.
    pub fn pool(&self) -> Option<&ThreadPool> {
        self.pool.as_ref()
    }

    /// Creates and pre-warms the pool; returns the number of workers created.
    ///
    /// `requested == 0` selects the configured worker count (4 unless
    /// overridden). A pool prepared earlier is discarded first.
    ///
    /// # Errors
    ///
    /// A [`GainError::Pool`] for which
    /// [`is_pool_creation_failure`](GainError::is_pool_creation_failure) holds.
    /// The session has no pool afterwards.
    pub fn prepare_pool(&mut self, requested: usize) -> GainResult<usize> {
        if let Some(old) = self.pool.take() {
            warn!(workers = old.workers(), "replacing prepared pool");
            old.discard();
        }
        let workers = if requested == 0 {
            self.config.workers
        } else {
            requested
        };
        let pool = PoolBuilder::new()
            .workers(workers)
            .name_prefix("mpyr-gain")
            .build()?;
        let created = pool.workers();
        debug!(requested, created, "pool prepared");
        self.pool = Some(pool);
        Ok(created)
    }

    /// Discards the prepared pool.
    ///
    /// Calling it again, or without a prior prepare, returns
    /// [`PoolStatus::NotPrepared`].
    pub fn unprepare_pool(&mut self) -> PoolStatus {
        match self.pool.take() {
            Some(pool) => PoolStatus::Discarded {
                workers_joined: pool.discard(),
            },
            None => {
                debug!("unprepare without a prepared pool");
                PoolStatus::NotPrepared
            }
        }
    }

    /// Applies `kernel` to an F32 image using the prepared pool.
    ///
    /// # Errors
    ///
    /// - [`mpyr_core::CoreError::InvalidImageType`] for non-F32 images
    /// - [`GainError::PoolNotPrepared`] without a prepared pool
    pub fn apply_gain_transform_parallel<A>(&self, image: &mut A, kernel: &GainKernel) -> GainResult<()>
    where
        A: ImageAdapter + ?Sized,
    {
        let view = image
            .resolve_mut()?
            .into_f32("apply_gain_transform_parallel")?;
        let pool = self.pool.as_ref().ok_or(GainError::PoolNotPrepared)?;
        self.dispatcher.dispatch(pool, view, kernel)
    }
}

impl Drop for GainSession {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.discard();
        }
    }
}
