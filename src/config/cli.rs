//! CLI argument parsing using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// hrceval - Hit-rate curve error evaluation for sampled storage traces
#[derive(Parser, Debug)]
#[command(name = "hrceval")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Execution mode
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Describe a histogram and optionally export its hit-rate curve
    Curve(CurveArgs),
    /// Compare one sample histogram against its full histogram
    Compare(CompareArgs),
    /// Evaluate every configured sample of every workload
    Batch(BatchArgs),
    /// Merge per-sample summaries into workload-level tables
    Merge(MergeArgs),
}

#[derive(Args, Debug)]
pub struct CurveArgs {
    /// Reuse-distance histogram file
    #[arg(value_name = "HISTOGRAM")]
    pub histogram: PathBuf,

    /// Write the curve as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Full-trace histogram file
    #[arg(long)]
    pub full: PathBuf,

    /// Sample-trace histogram file
    #[arg(long)]
    pub sample: PathBuf,

    /// Sampling rate of the sample (e.g., 0.01, 1/3)
    #[arg(short = 'r', long)]
    pub rate: String,

    /// Normalize read hit rates by read requests only
    #[arg(long)]
    pub read_only: bool,

    /// Percent-error policy where the full hit rate is zero
    #[arg(long, value_enum, default_value = "zero")]
    pub zero_baseline: ZeroBaselineMode,

    /// Write the per-window comparison table as CSV
    #[arg(long)]
    pub windows_csv: Option<PathBuf>,

    /// Write the summary as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,
}

/// Options shared by commands that read a batch configuration
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// TOML batch configuration file
    #[arg(short = 'c', long)]
    pub config: PathBuf,

    /// Override the path root
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Restrict to these workloads (repeatable)
    #[arg(short = 'w', long = "workload")]
    pub workloads: Vec<String>,

    /// Override sampling rates (comma-separated, e.g., 0.001,0.01)
    #[arg(long)]
    pub rates: Option<String>,

    /// Number of worker threads (0 = one per CPU)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Also persist per-window tables
    #[arg(long)]
    pub write_windows: bool,

    /// Merge workload tables after the batch completes
    #[arg(long)]
    pub merge: bool,

    /// Dry run - validate configuration without executing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Zero-baseline percent-error policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ZeroBaselineMode {
    /// Report 0% error where the full hit rate is 0
    Zero,
    /// Leave such windows out of the percent statistics
    Exclude,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
