//! Transform timing command.
//!
//! Runs the same transform sequentially, on a prepared session pool and on
//! the shared pool, then checks that all three produce identical pixels.

use crate::BenchArgs;
use anyhow::{Result, ensure};
use mpyr_core::{HostImage, ImageAdapter};
use mpyr_gain::{GainConfig, GainKernel, GainSession, apply_gain_transform};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Serialize)]
struct BenchReport {
    width: usize,
    height: usize,
    iterations: usize,
    workers: usize,
    parts: usize,
    sequential_ms: f64,
    prepared_ms: f64,
    shared_ms: f64,
    prepared_speedup: f64,
    shared_speedup: f64,
    identical: bool,
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}x{}, {} iterations, {} workers, {} parts",
            self.width, self.height, self.iterations, self.workers, self.parts
        )?;
        writeln!(f, "  sequential: {:>9.3} ms", self.sequential_ms)?;
        writeln!(
            f,
            "  prepared:   {:>9.3} ms  ({:.2}x)",
            self.prepared_ms, self.prepared_speedup
        )?;
        writeln!(
            f,
            "  shared:     {:>9.3} ms  ({:.2}x)",
            self.shared_ms, self.shared_speedup
        )?;
        if !self.identical {
            writeln!(f, "  WARNING: outputs differ between modes")?;
        }
        Ok(())
    }
}

/// Deterministic input spanning negatives, zero and large magnitudes.
fn synthetic(width: usize, height: usize) -> Result<HostImage> {
    let data = (0..width * height)
        .map(|i| {
            let v = ((i * 7919) % 20001) as f32 - 10000.0;
            v * 0.37
        })
        .collect();
    Ok(HostImage::from_f32(width, height, data)?)
}

/// Mean wall time of `op` over `iterations` runs on a fresh copy of `input`.
/// Returns the time in milliseconds and the output of the last run.
fn time_mode(
    input: &HostImage,
    iterations: usize,
    mut op: impl FnMut(&mut HostImage) -> Result<()>,
) -> Result<(f64, HostImage)> {
    let mut total = Duration::ZERO;
    let mut img = input.clone();
    for _ in 0..iterations {
        img.clone_from(input);
        let start = Instant::now();
        op(&mut img)?;
        total += start.elapsed();
    }
    Ok((total.as_secs_f64() * 1000.0 / iterations as f64, img))
}

fn speedup(base: f64, t: f64) -> f64 {
    if t > 0.0 { base / t } else { 0.0 }
}

fn measure(args: &BenchArgs, config: &GainConfig) -> Result<BenchReport> {
    ensure!(args.iterations > 0, "--iterations must be at least 1");
    ensure!(
        args.width > 0 && args.height > 0,
        "image size must be non-zero"
    );
    let input = synthetic(args.width, args.height)?;
    let kernel: GainKernel = config.kernel(args.transform.parameters());
    debug!(?kernel, "bench kernel");

    let (sequential_ms, reference) = time_mode(&input, args.iterations, |img| {
        Ok(apply_gain_transform(img, &kernel)?)
    })?;

    let mut session = GainSession::new(*config);
    session.prepare_pool(config.workers)?;
    let prepared = time_mode(&input, args.iterations, |img| {
        Ok(session.apply_gain_transform_parallel(img, &kernel)?)
    });
    session.unprepare_pool();
    let (prepared_ms, prepared_out) = prepared?;

    let pool = mpyr_pool::shared(config.workers)?;
    let dispatcher = config.dispatcher();
    let (shared_ms, shared_out) = time_mode(&input, args.iterations, |img| {
        let view = img.resolve_mut()?.into_f32("bench")?;
        Ok(dispatcher.dispatch(pool, view, &kernel)?)
    })?;

    Ok(BenchReport {
        width: args.width,
        height: args.height,
        iterations: args.iterations,
        workers: config.workers,
        parts: dispatcher.parts(),
        sequential_ms,
        prepared_ms,
        shared_ms,
        prepared_speedup: speedup(sequential_ms, prepared_ms),
        shared_speedup: speedup(sequential_ms, shared_ms),
        identical: bit_identical(&reference, &prepared_out) && bit_identical(&reference, &shared_out),
    })
}

fn bit_identical(a: &HostImage, b: &HostImage) -> bool {
    match (a.to_f32_vec(), b.to_f32_vec()) {
        (Some(a), Some(b)) => {
            a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits())
        }
        _ => false,
    }
}

/// Runs the bench command.
pub fn run(args: BenchArgs, config: &GainConfig, json: bool) -> Result<()> {
    let report = measure(&args, config)?;
    super::print_report(&report, json)
}
