//! Configuration info command.
//!
//! Shows the settings every other command resolves from the environment
//! and the global flags.

use anyhow::Result;
use mpyr_gain::config::{ENV_MAGNITUDE, ENV_SPLIT_PARTS, ENV_WORKERS, ENV_ZERO_CHECK};
use mpyr_gain::{GainConfig, MagnitudeMode, ZeroCheckPolicy};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Serialize)]
struct InfoReport {
    version: &'static str,
    workers: usize,
    parts: usize,
    zero_check: ZeroCheckPolicy,
    magnitude: MagnitudeMode,
    available_parallelism: Option<usize>,
    variables: Vec<(&'static str, Option<String>)>,
}

impl fmt::Display for InfoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "mpyr {}", self.version)?;
        writeln!(f, "  Workers:     {}", self.workers)?;
        writeln!(f, "  Split parts: {}", self.parts)?;
        writeln!(f, "  Zero check:  {}", self.zero_check)?;
        writeln!(f, "  Magnitude:   {}", self.magnitude)?;
        match self.available_parallelism {
            Some(n) => writeln!(f, "  CPU threads: {n}")?,
            None => writeln!(f, "  CPU threads: unknown")?,
        }
        writeln!(f, "Environment:")?;
        for (name, value) in &self.variables {
            writeln!(f, "  {name:<18} {}", value.as_deref().unwrap_or("(unset)"))?;
        }
        Ok(())
    }
}

/// Runs the info command.
pub fn run(config: &GainConfig, json: bool) -> Result<()> {
    let report = InfoReport {
        version: env!("CARGO_PKG_VERSION"),
        workers: config.workers,
        parts: config.parts,
        zero_check: config.zero_check,
        magnitude: config.magnitude,
        available_parallelism: std::thread::available_parallelism().ok().map(|n| n.get()),
        variables: [ENV_WORKERS, ENV_SPLIT_PARTS, ENV_ZERO_CHECK, ENV_MAGNITUDE]
            .into_iter()
            .map(|name| (name, std::env::var(name).ok()))
            .collect(),
    };
    super::print_report(&report, json)
}
