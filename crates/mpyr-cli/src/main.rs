//! mpyr - gain transform driver and measurement tool
//!
//! Runs the power-law gain transform on raw float images, measures FastPow
//! accuracy, and times sequential against split-pool execution.

use anyhow::{Result, ensure};
use clap::{Args, Parser, Subcommand};
use mpyr_gain::{GainConfig, MagnitudeMode, ZeroCheckPolicy};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "mpyr")]
#[command(author, version, about = "Power-law gain transform driver")]
#[command(long_about = "
Power-law gain transform driver and measurement tool.

Pool and kernel settings come from MPYR_WORKERS, MPYR_SPLIT_PARTS,
MPYR_ZERO_CHECK and MPYR_MAGNITUDE, overridden by the global flags below.

Examples:
  mpyr info                                  # Resolved configuration
  mpyr accuracy -e 0.4545 -e 2.2             # FastPow error for two exponents
  mpyr bench -W 4096 -H 4096 -n 50 -j 8      # Sequential vs split timing
  mpyr gain in.raw -o out.raw -W 640 -H 480 --divider 4096 --power 0.5
  mpyr --json bench --parts 4                # Machine-readable report
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pool workers (0 = MPYR_WORKERS or 4)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    workers: usize,

    /// Row bands per split dispatch (default MPYR_SPLIT_PARTS or 2)
    #[arg(long, global = true)]
    parts: Option<usize>,

    /// Zero handling: raw or magnitude
    #[arg(long, global = true)]
    zero_check: Option<ZeroCheckPolicy>,

    /// Magnitude of |p|: float or truncate (integer part only)
    #[arg(long, global = true)]
    magnitude: Option<MagnitudeMode>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,
}

impl Cli {
    /// Environment configuration with command-line overrides applied.
    fn config(&self) -> Result<GainConfig> {
        let mut config = GainConfig::from_env();
        if self.workers > 0 {
            config.workers = self.workers;
        }
        if let Some(parts) = self.parts {
            ensure!(parts > 0, "--parts must be at least 1");
            config.parts = parts;
        }
        if let Some(policy) = self.zero_check {
            config.zero_check = policy;
        }
        if let Some(mode) = self.magnitude {
            config.magnitude = mode;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved configuration
    Info,

    /// Measure FastPow relative error over [1e-3, 1e3]
    #[command(visible_alias = "acc")]
    Accuracy(AccuracyArgs),

    /// Time sequential, prepared-pool and shared-pool transforms
    #[command(visible_alias = "b")]
    Bench(BenchArgs),

    /// Apply the gain transform to a raw little-endian f32 image
    #[command(visible_alias = "g")]
    Gain(GainArgs),
}

#[derive(Args)]
struct AccuracyArgs {
    /// Exponents to measure
    #[arg(short, long, default_values_t = [0.5, 1.0 / 2.2, 1.0, 2.0, 2.2, 3.0])]
    exponent: Vec<f64>,

    /// Log-spaced sample points
    #[arg(short, long, default_value = "10001")]
    samples: usize,
}

#[derive(Args, Clone)]
struct TransformArgs {
    /// Divider applied before the power
    #[arg(long, default_value = "1")]
    divider: f64,

    /// Exponent
    #[arg(long, default_value = "1")]
    power: f64,

    /// Multiplier applied after the power
    #[arg(long, default_value = "1")]
    multiplier: f64,
}

#[derive(Args)]
struct BenchArgs {
    /// Image width
    #[arg(short = 'W', long, default_value = "2048")]
    width: usize,

    /// Image height
    #[arg(short = 'H', long, default_value = "2048")]
    height: usize,

    /// Timed iterations per mode
    #[arg(short = 'n', long, default_value = "20")]
    iterations: usize,

    #[command(flatten)]
    transform: TransformArgs,
}

#[derive(Args)]
struct GainArgs {
    /// Input raw file (little-endian f32, row-major)
    input: PathBuf,

    /// Output raw file
    #[arg(short, long)]
    output: PathBuf,

    /// Image width in pixels
    #[arg(short = 'W', long)]
    width: usize,

    /// Image height in rows
    #[arg(short = 'H', long)]
    height: usize,

    /// Samples per stored row (default: width)
    #[arg(long)]
    stride: Option<usize>,

    /// Split across a prepared pool
    #[arg(short, long)]
    parallel: bool,

    #[command(flatten)]
    transform: TransformArgs,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = cli.config()?;

    match cli.command {
        Commands::Info => commands::info::run(&config, cli.json),
        Commands::Accuracy(args) => commands::accuracy::run(args, cli.json),
        Commands::Bench(args) => commands::bench::run(args, &config, cli.json),
        Commands::Gain(args) => commands::gain::run(args, &config, cli.verbose),
    }
}
