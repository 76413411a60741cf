//! Error types for gain operations.

use mpyr_core::{CoreError, ErrorCode};
use mpyr_pool::PoolError;
use thiserror::Error;

/// Result type for gain operations.
pub type GainResult<T> = Result<T, GainError>;

/// Code for a pool that could not be created with the requested workers.
pub const CODE_POOL_CREATION_FAILURE: i32 = -2101;
/// Code for a job id the pool does not know.
pub const CODE_UNKNOWN_JOB: i32 = -2102;
/// Code for a wait that timed out.
pub const CODE_WAIT_TIMEOUT: i32 = -2103;
/// Code for a job that panicked on its worker.
pub const CODE_JOB_PANICKED: i32 = -2104;
/// Code for releasing a job that is still running.
pub const CODE_JOB_STILL_RUNNING: i32 = -2105;
/// Code for a parallel call made before the pool was prepared.
pub const CODE_POOL_NOT_PREPARED: i32 = -2106;

/// Error type for gain operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GainError {
    /// Handle, type, geometry or range validation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Pool creation or job bookkeeping failed.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// A prepared-pool call was made with no pool prepared.
    #[error("thread pool not prepared")]
    PoolNotPrepared,
}

impl GainError {
    /// `true` when the worker pool could not be brought up, either because
    /// thread creation failed or because fewer workers started than requested.
    pub fn is_pool_creation_failure(&self) -> bool {
        matches!(self, Self::Pool(e) if e.is_creation_failure())
    }

    /// `true` for errors raised before any pixel was touched.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Core(_) | Self::PoolNotPrepared)
    }
}

impl ErrorCode for GainError {
    fn code(&self) -> i32 {
        match self {
            Self::Core(e) => e.code(),
            Self::Pool(e) => match e {
                PoolError::Creation { .. } | PoolError::WorkerCountMismatch { .. } => {
                    CODE_POOL_CREATION_FAILURE
                }
                PoolError::UnknownJob(_) => CODE_UNKNOWN_JOB,
                PoolError::WaitTimeout { .. } => CODE_WAIT_TIMEOUT,
                PoolError::JobPanicked(_) => CODE_JOB_PANICKED,
                PoolError::JobStillRunning(_) => CODE_JOB_STILL_RUNNING,
            },
            Self::PoolNotPrepared => CODE_POOL_NOT_PREPARED,
        }
    }
}
