//! hrceval CLI entry point

use anyhow::{Context, Result};
use hrceval::batch::{compare_curves, BatchDriver};
use hrceval::config::cli::{BatchArgs, Cli, Command, CompareArgs, CurveArgs, MergeArgs};
use hrceval::config::{cli_convert, toml::load_config};
use hrceval::output::json::SummaryArtifact;
use hrceval::output::{csv, text};
use hrceval::ReuseDistanceHistogram;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber; RUST_LOG takes precedence over --debug
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    match cli.command {
        Command::Curve(args) => run_curve(args),
        Command::Compare(args) => run_compare(args),
        Command::Batch(args) => run_batch(args),
        Command::Merge(args) => run_merge(args),
    }
}

/// Describe one histogram and optionally export its curve
fn run_curve(args: CurveArgs) -> Result<()> {
    let histogram = ReuseDistanceHistogram::load(&args.histogram)
        .with_context(|| format!("Failed to load histogram: {}", args.histogram.display()))?;
    let curve = histogram.hit_rate_curve()?;

    text::print_curve_info(&args.histogram.display().to_string(), &histogram, curve);

    if let Some(ref path) = args.csv {
        csv::write_curve(path, curve)?;
        println!();
        println!("Curve written to {}", path.display());
    }
    Ok(())
}

/// Compare a single sample against its full trace
fn run_compare(args: CompareArgs) -> Result<()> {
    let rate = cli_convert::parse_rate(&args.rate)?;
    let options = cli_convert::analysis_options(&args);

    let full = ReuseDistanceHistogram::load(&args.full)
        .with_context(|| format!("Failed to load full histogram: {}", args.full.display()))?;
    let sample = ReuseDistanceHistogram::load(&args.sample)
        .with_context(|| format!("Failed to load sample histogram: {}", args.sample.display()))?;
    let full_curve = full.hit_rate_curve()?;
    let sample_curve = sample.hit_rate_curve()?;

    let (records, summary) = compare_curves(full_curve, sample_curve, rate, &options)?;

    text::print_summary(&summary, rate, full_curve, sample_curve);

    if let Some(ref path) = args.windows_csv {
        csv::write_window_table(path, &records)?;
        println!("Per-window table written to {}", path.display());
    }

    if let Some(ref path) = args.json {
        let workload = args
            .full
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let artifact = SummaryArtifact {
            workload,
            params: hrceval::batch::SampleParams {
                rate,
                bits: 0,
                seed: 0,
            },
            generated_at: chrono::Utc::now(),
            full_histogram: args.full.clone(),
            sample_histogram: args.sample.clone(),
            options,
            summary,
        };
        artifact.write_to_file(path)?;
        println!("Summary written to {}", path.display());
    }
    Ok(())
}

/// Evaluate every configured sample of every workload
fn run_batch(args: BatchArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;
    if args.write_windows {
        config.output.write_windows = true;
    }

    let units = config.workloads.len() * config.samples.params().len();
    println!(
        "hrceval v{}: {} workloads x {} samples = {} units, {} threads",
        env!("CARGO_PKG_VERSION"),
        config.workloads.len(),
        config.samples.params().len(),
        units,
        config.workers.effective_threads()
    );

    if args.dry_run {
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    let driver = BatchDriver::new(config);
    let report = driver.run();
    println!();
    text::print_batch_report(&report);

    if args.merge {
        let merged = driver.merge()?;
        println!();
        text::print_merge_reports(&merged);
    }

    if report.failed > 0 {
        anyhow::bail!("{} samples failed; see log for details", report.failed);
    }
    Ok(())
}

/// Fold existing summary artifacts into workload tables
fn run_merge(args: MergeArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let driver = BatchDriver::new(config);
    let merged = driver.merge()?;
    text::print_merge_reports(&merged);
    Ok(())
}
