//! Error types for pool lifecycle and job bookkeeping.

use std::time::Duration;

use thiserror::Error;

use crate::JobId;

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Error type for pool operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The worker threads could not be spawned.
    #[error("failed to create pool of {requested} workers: {reason}")]
    Creation {
        /// Requested worker count.
        requested: usize,
        /// Message from the thread spawner.
        reason: String,
    },

    /// Fewer workers came up than requested.
    #[error("pool requested {requested} workers but only {created} started")]
    WorkerCountMismatch {
        /// Requested worker count.
        requested: usize,
        /// Workers that reported in before the start timeout.
        created: usize,
    },

    /// The job id was never issued by this pool or was already released.
    #[error("unknown job {0}")]
    UnknownJob(JobId),

    /// The job did not complete within the wait timeout. It keeps running.
    #[error("job {job} still running after {timeout:?}")]
    WaitTimeout {
        /// Job waited on.
        job: JobId,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// The job panicked on its worker.
    #[error("job {0} panicked")]
    JobPanicked(JobId),

    /// Release was called before the job completed.
    #[error("job {0} cannot be released while running")]
    JobStillRunning(JobId),
}

impl PoolError {
    /// `true` for failures to bring the pool up.
    #[inline]
    pub fn is_creation_failure(&self) -> bool {
        matches!(self, Self::Creation { .. } | Self::WorkerCountMismatch { .. })
    }
}
