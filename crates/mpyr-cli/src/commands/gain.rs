//! Gain transform command.
//!
//! Reads a raw little-endian f32 image, applies the transform, and writes the
//! result with the same stride.

use crate::GainArgs;
use anyhow::{Context, Result, ensure};
use mpyr_gain::{GainConfig, GainSession, apply_gain_transform};
use std::time::Instant;
use tracing::info;

/// Runs the gain command.
pub fn run(args: GainArgs, config: &GainConfig, verbose: bool) -> Result<()> {
    let stride = args.stride.unwrap_or(args.width);
    ensure!(
        stride >= args.width,
        "--stride {stride} is smaller than --width {}",
        args.width
    );

    let mut image = super::read_raw_f32(&args.input, args.width, args.height, stride)?;
    let kernel = config.kernel(args.transform.parameters());
    let start = Instant::now();

    if args.parallel {
        let mut session = GainSession::new(*config);
        let workers = session
            .prepare_pool(config.workers)
            .context("Failed to prepare worker pool")?;
        info!(workers, parts = config.parts, "transforming on prepared pool");
        let result = session.apply_gain_transform_parallel(&mut image, &kernel);
        session.unprepare_pool();
        result?;
    } else {
        apply_gain_transform(&mut image, &kernel)?;
    }

    if verbose {
        println!(
            "Transformed {}x{} in {:.3} ms ({})",
            args.width,
            args.height,
            start.elapsed().as_secs_f64() * 1000.0,
            if args.parallel { "parallel" } else { "sequential" }
        );
    }

    super::write_raw_f32(&args.output, &image)?;
    info!(output = %args.output.display(), "saved");
    Ok(())
}
