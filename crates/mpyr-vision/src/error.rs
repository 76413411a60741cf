//! Error types for vision operations.

use mpyr_core::{CODE_INVALID_PARAMETER, CoreError, ErrorCode};
use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Error type for vision operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VisionError {
    /// Handle, type or geometry validation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An algorithm parameter is out of its domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl VisionError {
    /// Creates an invalid parameter error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

impl ErrorCode for VisionError {
    fn code(&self) -> i32 {
        match self {
            Self::Core(e) => e.code(),
            Self::InvalidParameter(_) => CODE_INVALID_PARAMETER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpyr_core::{CODE_TYPE_MISMATCH, ElementType};

    #[test]
    fn test_codes() {
        let err: VisionError = CoreError::TypeMismatch {
            src: ElementType::U16,
            dst: ElementType::F32,
        }
        .into();
        assert_eq!(err.code(), CODE_TYPE_MISMATCH);
        assert_eq!(
            VisionError::invalid_parameter("tiles").code(),
            CODE_INVALID_PARAMETER
        );
    }
}
