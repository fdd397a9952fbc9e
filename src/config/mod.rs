//! Configuration module
//!
//! Handles CLI argument parsing, TOML batch configuration files, and validation.
//!
//! A batch configuration names the workloads, the sample parameterizations to
//! evaluate for each one, where histograms and artifacts live, and how the
//! comparison is computed:
//!
//! ```toml
//! workloads = ["w01", "w02"]
//!
//! [samples]
//! rates = ["0.001", "0.01", 0.1]
//! bits = [0, 4]
//! seeds = [42]
//!
//! [paths]
//! root = "/data/traces"
//!
//! [analysis]
//! read_only = false
//! zero_baseline = "zero"
//!
//! [output]
//! write_windows = true
//!
//! [workers]
//! threads = 0   # one per CPU
//! ```

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::align::RationalRate;
use crate::batch::SampleParams;
use crate::stats::AnalysisOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Complete batch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Workload identifiers
    pub workloads: Vec<String>,
    #[serde(default)]
    pub samples: SampleConfig,
    #[serde(default)]
    pub paths: PathConfig,
    #[serde(default)]
    pub analysis: AnalysisOptions,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub workers: WorkerConfig,
}

/// Sample parameterizations evaluated for every workload
///
/// The evaluated set is the cartesian product `rates x bits x seeds` followed
/// by any `explicit` entries, with duplicates removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Sampling rates, as decimal strings, numbers, or `"n/d"` fractions
    #[serde(default)]
    pub rates: Vec<RationalRate>,
    /// Low-order address bits ignored by the sampler
    #[serde(default = "default_bits")]
    pub bits: Vec<u32>,
    /// Sampler seeds
    #[serde(default = "default_seeds")]
    pub seeds: Vec<u64>,
    /// Additional individual parameterizations
    #[serde(default)]
    pub explicit: Vec<SampleParams>,
}

fn default_bits() -> Vec<u32> {
    vec![0]
}

fn default_seeds() -> Vec<u64> {
    vec![0]
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            rates: Vec::new(),
            bits: default_bits(),
            seeds: default_seeds(),
            explicit: Vec::new(),
        }
    }
}

impl SampleConfig {
    /// Every parameterization to evaluate, in a stable order
    pub fn params(&self) -> Vec<SampleParams> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        let sweep = self.rates.iter().flat_map(|&rate| {
            self.bits.iter().flat_map(move |&bits| {
                self.seeds
                    .iter()
                    .map(move |&seed| SampleParams { rate, bits, seed })
            })
        });

        for params in sweep.chain(self.explicit.iter().copied()) {
            if seen.insert(params) {
                out.push(params);
            }
        }
        out
    }
}

/// Path templates for inputs and artifacts
///
/// Templates may use `{root}`, `{workload}`, and for per-sample paths
/// `{rate}`, `{bits}`, `{seed}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Base directory substituted for `{root}`
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Full-trace histogram of a workload
    #[serde(default = "default_full_histogram")]
    pub full_histogram: String,
    /// Sample histogram of a workload and parameterization
    #[serde(default = "default_sample_histogram")]
    pub sample_histogram: String,
    /// Per-sample JSON summary artifact
    #[serde(default = "default_summary")]
    pub summary: String,
    /// Per-sample per-window CSV table
    #[serde(default = "default_windows")]
    pub windows: String,
    /// Workload-level merged CSV table
    #[serde(default = "default_workload_table")]
    pub workload_table: String,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_full_histogram() -> String {
    "{root}/rd_hist/{workload}.csv".to_string()
}

fn default_sample_histogram() -> String {
    "{root}/rd_hist/sample/{workload}/rate={rate}_bits={bits}_seed={seed}.csv".to_string()
}

fn default_summary() -> String {
    "{root}/hrc_err/{workload}/rate={rate}_bits={bits}_seed={seed}.json".to_string()
}

fn default_windows() -> String {
    "{root}/hrc_err/{workload}/rate={rate}_bits={bits}_seed={seed}.windows.csv".to_string()
}

fn default_workload_table() -> String {
    "{root}/hrc_err/{workload}.csv".to_string()
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            full_histogram: default_full_histogram(),
            sample_histogram: default_sample_histogram(),
            summary: default_summary(),
            windows: default_windows(),
            workload_table: default_workload_table(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Also persist the per-window comparison table of every sample
    #[serde(default)]
    pub write_windows: bool,
}

/// Worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of worker threads (0 = one per CPU)
    #[serde(default)]
    pub threads: usize,
    /// Capacity of the work queue feeding the workers
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

fn default_queue_depth() -> usize {
    64
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            queue_depth: default_queue_depth(),
        }
    }
}

impl WorkerConfig {
    /// Thread count with `0` resolved to the number of CPUs
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.threads
        }
    }
}
