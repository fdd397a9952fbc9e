//! CLI to Config conversion utilities

use crate::align::RationalRate;
use crate::config::cli;
use crate::stats::{AnalysisOptions, ZeroBaseline};
use anyhow::{Context, Result};

/// Parse a comma-separated rate list (e.g., "0.001,0.01,1/3")
pub fn parse_rate_list(s: &str) -> Result<Vec<RationalRate>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            RationalRate::parse(part).with_context(|| format!("Invalid sampling rate: {}", part))
        })
        .collect()
}

/// Parse a single rate argument
pub fn parse_rate(s: &str) -> Result<RationalRate> {
    RationalRate::parse(s).with_context(|| format!("Invalid sampling rate: {}", s))
}

/// Convert CLI ZeroBaselineMode to stats ZeroBaseline
pub fn convert_zero_baseline(mode: cli::ZeroBaselineMode) -> ZeroBaseline {
    match mode {
        cli::ZeroBaselineMode::Zero => ZeroBaseline::Zero,
        cli::ZeroBaselineMode::Exclude => ZeroBaseline::Exclude,
    }
}

/// Build analysis options from compare arguments
pub fn analysis_options(args: &cli::CompareArgs) -> AnalysisOptions {
    AnalysisOptions {
        read_only: args.read_only,
        zero_baseline: convert_zero_baseline(args.zero_baseline),
    }
}
