//! TOML configuration file parsing

use super::*;
use crate::config::cli::ConfigArgs;
use crate::config::cli_convert::parse_rate_list;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(args: &ConfigArgs, mut config: Config) -> Result<Config> {
    if let Some(ref root) = args.root {
        config.paths.root = root.clone();
    }

    // Restrict workloads
    if !args.workloads.is_empty() {
        config.workloads = args.workloads.clone();
    }

    // Override rates
    if let Some(ref rates) = args.rates {
        config.samples.rates = parse_rate_list(rates)?;
    }

    if let Some(threads) = args.threads {
        config.workers.threads = threads;
    }

    Ok(config)
}

/// Load a configuration file, apply CLI overrides, and validate the result
pub fn load_config(args: &ConfigArgs) -> Result<Config> {
    let config = parse_toml_file(&args.config)?;
    let config = merge_cli_with_config(args, config)?;
    validator::validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::ZeroBaseline;

    const SAMPLE: &str = r#"
workloads = ["w01", "w02"]

[samples]
rates = ["0.01", 0.1]
bits = [0, 4]

[paths]
root = "/data"

[analysis]
read_only = true
zero_baseline = "exclude"

[output]
write_windows = true

[workers]
threads = 2
"#;

    fn args() -> ConfigArgs {
        ConfigArgs {
            config: PathBuf::from("batch.toml"),
            root: None,
            workloads: vec![],
            rates: None,
            threads: None,
        }
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse_toml_string(SAMPLE).unwrap();
        assert_eq!(config.workloads, vec!["w01", "w02"]);
        assert_eq!(config.samples.rates.len(), 2);
        assert_eq!(config.samples.seeds, vec![0]);
        assert_eq!(config.samples.params().len(), 4);
        assert_eq!(config.paths.root, PathBuf::from("/data"));
        assert_eq!(config.paths.summary, default_summary());
        assert!(config.analysis.read_only);
        assert_eq!(config.analysis.zero_baseline, ZeroBaseline::Exclude);
        assert!(config.output.write_windows);
        assert_eq!(config.workers.threads, 2);
        assert_eq!(config.workers.queue_depth, 64);
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config =
            parse_toml_string("workloads = [\"w\"]\n[samples]\nrates = [\"0.5\"]\n").unwrap();
        assert!(!config.analysis.read_only);
        assert_eq!(config.analysis.zero_baseline, ZeroBaseline::Zero);
        assert!(!config.output.write_windows);
        assert_eq!(config.workers.threads, 0);
    }

    #[test]
    fn test_invalid_rate_fails_parse() {
        let err = parse_toml_string("workloads = [\"w\"]\n[samples]\nrates = [\"1.5\"]\n")
            .unwrap_err();
        assert!(format!("{:#}", err).contains("between 0 and 1"));
    }

    #[test]
    fn test_cli_overrides() {
        let config = parse_toml_string(SAMPLE).unwrap();
        let mut overrides = args();
        overrides.root = Some(PathBuf::from("/other"));
        overrides.workloads = vec!["w02".to_string()];
        overrides.rates = Some("0.25".to_string());
        overrides.threads = Some(8);

        let config = merge_cli_with_config(&overrides, config).unwrap();
        assert_eq!(config.paths.root, PathBuf::from("/other"));
        assert_eq!(config.workloads, vec!["w02"]);
        assert_eq!(config.samples.rates, vec![RationalRate::parse("0.25").unwrap()]);
        assert_eq!(config.workers.threads, 8);
    }
}
