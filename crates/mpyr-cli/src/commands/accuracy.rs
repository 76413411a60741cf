//! FastPow accuracy command.

use crate::AccuracyArgs;
use anyhow::{Result, ensure};
use mpyr_gain::Accuracy;
use mpyr_gain::fast_pow::characterize;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct AccuracyReport(Vec<Accuracy>);

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>10} {:>8} {:>12} {:>12} {:>12}",
            "exponent", "samples", "max rel", "mean rel", "worst base"
        )?;
        for a in &self.0 {
            writeln!(
                f,
                "{:>10.4} {:>8} {:>11.3}% {:>11.3}% {:>12.4e}",
                a.exponent,
                a.samples,
                a.max_rel_error * 100.0,
                a.mean_rel_error * 100.0,
                a.worst_base
            )?;
        }
        Ok(())
    }
}

/// Runs the accuracy command.
pub fn run(args: AccuracyArgs, json: bool) -> Result<()> {
    ensure!(args.samples >= 2, "--samples must be at least 2");
    ensure!(
        args.exponent.iter().all(|e| e.is_finite()),
        "exponents must be finite"
    );
    let report = AccuracyReport(
        args.exponent
            .iter()
            .map(|&e| characterize(e, args.samples))
            .collect(),
    );
    super::print_report(&report, json)
}
