//! Runtime configuration with environment overrides.
//!
//! # Environment Variables
//!
//! - `MPYR_WORKERS` - Worker count for prepared and shared pools (`0` or unset: 4)
//! - `MPYR_SPLIT_PARTS` - Row bands per split dispatch (unset: 2, must be >= 1)
//! - `MPYR_ZERO_CHECK` - `raw` or `magnitude` (unset: `magnitude`)
//! - `MPYR_MAGNITUDE` - `float` or `truncate` (unset: `float`)
//!
//! Unparsable values are ignored with a warning and the default is used.

use std::env;

use mpyr_pool::DEFAULT_WORKERS;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{GainKernel, MagnitudeMode, SplitDispatcher, TransformParameters, ZeroCheckPolicy};

/// Worker count override variable.
pub const ENV_WORKERS: &str = "MPYR_WORKERS";
/// Split part count override variable.
pub const ENV_SPLIT_PARTS: &str = "MPYR_SPLIT_PARTS";
/// Zero-check policy override variable.
pub const ENV_ZERO_CHECK: &str = "MPYR_ZERO_CHECK";
/// Magnitude mode override variable.
pub const ENV_MAGNITUDE: &str = "MPYR_MAGNITUDE";

/// Resolved gain settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainConfig {
    /// Pool worker count.
    pub workers: usize,
    /// Bands per split dispatch.
    pub parts: usize,
    /// Zero handling of the kernel.
    pub zero_check: ZeroCheckPolicy,
    /// Magnitude formation of the kernel.
    #[serde(default)]
    pub magnitude: MagnitudeMode,
}

impl Default for GainConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            parts: SplitDispatcher::DEFAULT_PARTS,
            zero_check: ZeroCheckPolicy::default(),
            magnitude: MagnitudeMode::default(),
        }
    }
}

impl GainConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(n) = parse_var::<usize>(&lookup, ENV_WORKERS) {
            cfg.workers = if n == 0 { DEFAULT_WORKERS } else { n };
        }
        if let Some(n) = parse_var::<usize>(&lookup, ENV_SPLIT_PARTS) {
            if n == 0 {
                warn!(var = ENV_SPLIT_PARTS, "must be at least 1, using default");
            } else {
                cfg.parts = n;
            }
        }
        if let Some(policy) = parse_var::<ZeroCheckPolicy>(&lookup, ENV_ZERO_CHECK) {
            cfg.zero_check = policy;
        }
        if let Some(mode) = parse_var::<MagnitudeMode>(&lookup, ENV_MAGNITUDE) {
            cfg.magnitude = mode;
        }
        cfg
    }

    /// Kernel for `params` using the configured policy and magnitude mode.
    pub fn kernel(&self, params: TransformParameters) -> GainKernel {
        GainKernel::new(params)
            .with_policy(self.zero_check)
            .with_magnitude(self.magnitude)
    }

    /// Dispatcher with the configured part count (at least one).
    pub fn dispatcher(&self) -> SplitDispatcher {
        SplitDispatcher::new(self.parts).unwrap_or_default()
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = key, value = %raw, "ignoring unparsable override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = GainConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg, GainConfig::default());
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.parts, 2);
        assert_eq!(cfg.zero_check, ZeroCheckPolicy::CheckDerivedMagnitude);
        assert_eq!(cfg.magnitude, MagnitudeMode::Float);
    }

    #[test]
    fn test_overrides() {
        let cfg = GainConfig::from_lookup(lookup(&[
            ("MPYR_WORKERS", "8"),
            ("MPYR_SPLIT_PARTS", "3"),
            ("MPYR_ZERO_CHECK", "raw"),
            ("MPYR_MAGNITUDE", "truncate"),
        ]));
        assert_eq!(cfg.workers, 8);
        assert_eq!(cfg.dispatcher().parts(), 3);
        let kernel = cfg.kernel(TransformParameters::IDENTITY);
        assert_eq!(kernel.policy, ZeroCheckPolicy::CheckRawValue);
        assert_eq!(kernel.magnitude, MagnitudeMode::TruncatedInteger);
        assert_ne!(kernel.apply_sample(0.5), 0.0);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = GainConfig::from_lookup(lookup(&[
            ("MPYR_WORKERS", "0"),
            ("MPYR_SPLIT_PARTS", "0"),
            ("MPYR_ZERO_CHECK", "sometimes"),
            ("MPYR_MAGNITUDE", "rounded"),
        ]));
        assert_eq!(cfg, GainConfig::default());

        let cfg = GainConfig::from_lookup(lookup(&[("MPYR_WORKERS", "many")]));
        assert_eq!(cfg.workers, 4);
    }

    #[test]
    fn test_serializes() {
        let json = serde_json::to_string(&GainConfig::default()).unwrap();
        assert_eq!(
            json,
            r#"{"workers":4,"parts":2,"zero_check":"check-derived-magnitude","magnitude":"float"}"#
        );
    }
}
