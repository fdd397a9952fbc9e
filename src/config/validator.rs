//! Configuration validation

use super::*;
use anyhow::Result;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_workloads(&config.workloads)?;
    validate_samples(&config.samples)?;
    validate_paths(&config.paths)?;
    validate_workers(&config.workers)?;

    Ok(())
}

/// Validate workload identifiers
///
/// Identifiers become path components and the first column of the workload
/// table, so separators and commas are rejected.
pub fn validate_workloads(workloads: &[String]) -> Result<()> {
    if workloads.is_empty() {
        anyhow::bail!("At least one workload must be specified");
    }

    let mut seen = HashSet::new();
    for (i, name) in workloads.iter().enumerate() {
        if name.trim().is_empty() {
            anyhow::bail!("Workload {}: name cannot be empty", i);
        }
        if name.contains(['/', '\\', ',']) || name == "." || name == ".." {
            anyhow::bail!("Workload {}: invalid name '{}'", i, name);
        }
        if !seen.insert(name.as_str()) {
            anyhow::bail!("Workload '{}' listed more than once", name);
        }
    }

    Ok(())
}

/// Validate sample parameterizations
pub fn validate_samples(samples: &SampleConfig) -> Result<()> {
    if !samples.rates.is_empty() {
        if samples.bits.is_empty() {
            anyhow::bail!("samples.bits cannot be empty when rates are given");
        }
        if samples.seeds.is_empty() {
            anyhow::bail!("samples.seeds cannot be empty when rates are given");
        }
    }

    if samples.params().is_empty() {
        anyhow::bail!("At least one sample rate or explicit sample must be specified");
    }

    Ok(())
}

/// Validate path templates
pub fn validate_paths(paths: &PathConfig) -> Result<()> {
    const SAMPLE_KEYS: [&str; 4] = ["{workload}", "{rate}", "{bits}", "{seed}"];

    require_placeholders("full_histogram", &paths.full_histogram, &["{workload}"])?;
    require_placeholders("workload_table", &paths.workload_table, &["{workload}"])?;
    require_placeholders("sample_histogram", &paths.sample_histogram, &SAMPLE_KEYS)?;
    require_placeholders("summary", &paths.summary, &SAMPLE_KEYS)?;
    require_placeholders("windows", &paths.windows, &SAMPLE_KEYS)?;

    if paths.summary == paths.windows {
        anyhow::bail!("paths.summary and paths.windows must differ");
    }

    Ok(())
}

fn require_placeholders(field: &str, template: &str, keys: &[&str]) -> Result<()> {
    for key in keys {
        if !template.contains(key) {
            anyhow::bail!("paths.{} must contain {} (got '{}')", field, key, template);
        }
    }
    Ok(())
}

/// Validate worker configuration
pub fn validate_workers(workers: &WorkerConfig) -> Result<()> {
    if workers.queue_depth == 0 {
        anyhow::bail!("workers.queue_depth must be at least 1");
    }

    if workers.threads > 1024 {
        anyhow::bail!("workers.threads must be at most 1024, got {}", workers.threads);
    }

    Ok(())
}
