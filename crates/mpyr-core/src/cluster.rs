//! Host-style out-of-band error reporting.
//!
//! The host passes an error cluster `{status, code, source}` into every call
//! and reads it back afterwards. A call that finds an error already set does
//! nothing and leaves the cluster untouched, so a chain of calls stops at the
//! first failure. [`ErrorCluster::run`] implements that convention around any
//! fallible Rust operation whose error implements [`ErrorCode`].

use std::fmt;

use crate::ErrorCode;

/// Error state carried through a chain of host calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorCluster {
    /// `true` once an error has been recorded.
    pub status: bool,
    /// Error code, `0` when clear.
    pub code: i32,
    /// `"<function>: <message>"` of the failing call.
    pub source: String,
}

impl ErrorCluster {
    /// A cluster with no error.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when an error is recorded.
    #[inline]
    pub fn is_err(&self) -> bool {
        self.status
    }

    /// Records `err` as raised by `func`.
    pub fn set<E>(&mut self, func: &str, err: &E)
    where
        E: ErrorCode + fmt::Display + ?Sized,
    {
        self.status = true;
        self.code = err.code();
        self.source = format!("{func}: {err}");
    }

    /// Clears the recorded error.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Runs `op` unless an error is already recorded.
    ///
    /// Returns `None` without calling `op` when the cluster arrives in error,
    /// and `None` after recording the failure when `op` fails.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mpyr_core::{CoreError, ErrorCluster};
    ///
    /// let mut cluster = ErrorCluster::new();
    /// let r: Option<()> = cluster.run("resize", || Err(CoreError::InvalidImageHandle));
    /// assert!(r.is_none() && cluster.status);
    ///
    /// // later calls are skipped
    /// let mut called = false;
    /// cluster.run("blur", || -> Result<(), CoreError> { called = true; Ok(()) });
    /// assert!(!called);
    /// assert!(cluster.source.starts_with("resize"));
    /// ```
    pub fn run<T, E, F>(&mut self, func: &str, op: F) -> Option<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: ErrorCode + fmt::Display,
    {
        if self.status {
            return None;
        }
        match op() {
            Ok(v) => Some(v),
            Err(e) => {
                self.set(func, &e);
                None
            }
        }
    }
}

impl fmt::Display for ErrorCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status {
            write!(f, "error {}: {}", self.code, self.source)
        } else {
            f.write_str("no error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CODE_INVALID_IMAGE_HANDLE, CoreError};

    #[test]
    fn test_records_failure() {
        let mut c = ErrorCluster::new();
        let out: Option<u32> = c.run("apply", || Err(CoreError::InvalidImageHandle));
        assert_eq!(out, None);
        assert!(c.is_err());
        assert_eq!(c.code, CODE_INVALID_IMAGE_HANDLE);
        assert_eq!(c.source, "apply: invalid image handle");
    }

    #[test]
    fn test_success_leaves_cluster_clear() {
        let mut c = ErrorCluster::new();
        let out = c.run("apply", || Ok::<_, CoreError>(7));
        assert_eq!(out, Some(7));
        assert_eq!(c, ErrorCluster::default());
        assert_eq!(c.to_string(), "no error");
    }

    #[test]
    fn test_error_in_passthrough() {
        let mut c = ErrorCluster {
            status: true,
            code: 42,
            source: "upstream".into(),
        };
        let before = c.clone();
        let mut called = false;
        let out = c.run("apply", || {
            called = true;
            Ok::<_, CoreError>(())
        });
        assert!(out.is_none());
        assert!(!called);
        assert_eq!(c, before);

        c.clear();
        assert!(!c.is_err());
    }
}
