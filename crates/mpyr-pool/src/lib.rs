//! # mpyr-pool
//!
//! Pre-warmed worker pool for split image transforms.
//!
//! Two ways to get a pool:
//!
//! - [`ThreadPool::new`] - an owned pool with explicit create/discard
//! - [`shared`] - a process-wide pool created on first use and never torn down
//!
//! Both hand out [`JobId`]s from [`ThreadPool::schedule`] that must be waited on
//! and released. Jobs that borrow stack data use [`ThreadPool::scope`].
//!
//! ```rust
//! use mpyr_pool::{ThreadPool, Timeout};
//!
//! let pool = ThreadPool::new(0).unwrap(); // 0 -> 4 workers
//! let id = pool.schedule(|| {});
//! pool.wait(id, Timeout::Infinite).unwrap();
//! pool.release(id).unwrap();
//! assert_eq!(pool.discard(), 4);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod job;
pub mod pool;

use std::sync::OnceLock;

pub use error::{PoolError, PoolResult};
pub use job::{JobId, Timeout};
pub use pool::{DEFAULT_SETTLE_TIMEOUT, DEFAULT_WORKERS, JobScope, PoolBuilder, ThreadPool};

static SHARED: OnceLock<PoolResult<ThreadPool>> = OnceLock::new();

/// Process-wide pool, created with `workers` threads on the first call.
///
/// Later calls return the same pool and ignore `workers`. A creation failure
/// is cached as well and returned on every call.
///
/// # Errors
///
/// See [`PoolBuilder::build`].
pub fn shared(workers: usize) -> PoolResult<&'static ThreadPool> {
    SHARED
        .get_or_init(|| {
            PoolBuilder::new()
                .workers(workers)
                .name_prefix("mpyr-shared")
                .build()
        })
        .as_ref()
        .map_err(Clone::clone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_is_singleton() {
        let a = shared(2).unwrap();
        let b = shared(7).unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.workers(), b.workers());
    }
}
