//! Batch drivers
//!
//! Evaluates every configured sample parameterization of every workload and
//! persists one summary artifact per unit. A unit whose artifact already exists
//! and parses is never recomputed, so an interrupted run is resumed simply by
//! running it again.
//!
//! Data problems never abort a run. A missing, empty or malformed histogram
//! is logged and counted as a skip: of the unit for a sample histogram, of the
//! whole workload for a full histogram. Sampling rates are validated when the
//! configuration is loaded, so alignment cannot fail here.

pub mod merge;
pub mod paths;

use crate::align::{align, RationalRate};
use crate::config::Config;
use crate::error::{EvalError, EvalResult};
use crate::output::csv::write_window_table;
use crate::output::json::SummaryArtifact;
use crate::profile::{HitRateCurve, ReuseDistanceHistogram};
use crate::stats::aggregator::ErrorAggregator;
use crate::stats::{AnalysisOptions, ErrorRecord, ErrorSummary};
use crate::worker::WorkerPool;
use crate::Result;
use chrono::Utc;
use paths::{PathResolver, TemplateResolver};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Parameters of one sampled trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleParams {
    /// Validated on construction; always strictly between 0 and 1
    pub rate: RationalRate,
    /// Low-order address bits ignored by the sampler
    #[serde(default)]
    pub bits: u32,
    #[serde(default)]
    pub seed: u64,
}

impl fmt::Display for SampleParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rate={} bits={} seed={}", self.rate, self.bits, self.seed)
    }
}

/// Outcome counts of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Units evaluated and persisted by this run
    pub computed: usize,
    /// Units whose artifact was already complete
    pub already_present: usize,
    /// Units skipped for missing, empty or malformed sample data
    pub skipped: usize,
    /// Units that hit an I/O or persistence error
    pub failed: usize,
    /// Workloads skipped for a missing, unusable or unreadable full histogram
    pub skipped_workloads: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitOutcome {
    Computed,
    Skipped,
    Failed,
}

/// Work prepared for one workload
struct WorkloadPlan {
    workload: String,
    full_path: PathBuf,
    full: Arc<HitRateCurve>,
    pending: Vec<SampleParams>,
}

enum Preparation {
    /// Full histogram missing, unusable or unreadable
    SkippedWorkload,
    /// `plan` is `None` when every unit is already complete
    Ready {
        present: usize,
        plan: Option<WorkloadPlan>,
    },
}

/// Compare a sample curve against its full curve at every aligned window
pub fn compare_curves(
    full: &HitRateCurve,
    sample: &HitRateCurve,
    rate: RationalRate,
    options: &AnalysisOptions,
) -> EvalResult<(Vec<ErrorRecord>, ErrorSummary)> {
    let alignment = align(rate, sample.max_index(), full.max_index());
    let aggregator = ErrorAggregator::new(*options);
    let records = aggregator.records(full, sample, alignment);
    let summary = aggregator.summarize(&records)?;
    Ok((records, summary))
}

/// Tier-1 driver: one summary artifact per (workload, sample) unit
pub struct BatchDriver {
    config: Config,
    resolver: Box<dyn PathResolver>,
}

impl BatchDriver {
    /// Create a driver resolving paths from the config's templates
    pub fn new(config: Config) -> Self {
        let resolver = Box::new(TemplateResolver::new(config.paths.clone()));
        Self { config, resolver }
    }

    pub fn with_resolver(config: Config, resolver: Box<dyn PathResolver>) -> Self {
        Self { config, resolver }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &dyn PathResolver {
        self.resolver.as_ref()
    }

    /// Evaluate every pending unit
    ///
    /// Failures are counted in the report rather than returned.
    pub fn run(&self) -> BatchReport {
        let params = self.config.samples.params();
        info!(
            workloads = self.config.workloads.len(),
            samples = params.len(),
            "starting batch"
        );

        let mut report = BatchReport::default();

        // Full histograms load in parallel, one per workload
        let prepared: Vec<Preparation> = self
            .config
            .workloads
            .par_iter()
            .map(|workload| self.prepare(workload, &params))
            .collect();

        let mut plans = Vec::new();
        for preparation in prepared {
            match preparation {
                Preparation::SkippedWorkload => report.skipped_workloads += 1,
                Preparation::Ready { present, plan } => {
                    report.already_present += present;
                    plans.extend(plan);
                }
            }
        }

        let units: Vec<(usize, SampleParams)> = plans
            .iter()
            .enumerate()
            .flat_map(|(idx, plan)| plan.pending.iter().map(move |p| (idx, *p)))
            .collect();
        if units.is_empty() {
            info!(already_present = report.already_present, "nothing to compute");
            return report;
        }

        let pool = WorkerPool::from_config(&self.config.workers);
        let outcomes = pool.run(units, |_, (idx, params)| self.process(&plans[idx], params));

        for outcome in outcomes {
            match outcome {
                UnitOutcome::Computed => report.computed += 1,
                UnitOutcome::Skipped => report.skipped += 1,
                UnitOutcome::Failed => report.failed += 1,
            }
        }

        info!(
            computed = report.computed,
            already_present = report.already_present,
            skipped = report.skipped,
            failed = report.failed,
            skipped_workloads = report.skipped_workloads,
            "batch complete"
        );
        report
    }

    /// Find a workload's pending units and load its full curve if any remain
    fn prepare(&self, workload: &str, params: &[SampleParams]) -> Preparation {
        let full_path = self.resolver.full_histogram(workload);
        if !full_path.is_file() {
            warn!(
                workload,
                path = %full_path.display(),
                "full histogram missing, skipping workload"
            );
            return Preparation::SkippedWorkload;
        }

        let pending: Vec<SampleParams> = params
            .iter()
            .copied()
            .filter(|p| {
                let artifact = self.resolver.summary_artifact(workload, p);
                SummaryArtifact::read_if_complete(&artifact).is_none()
            })
            .collect();
        let present = params.len() - pending.len();
        debug!(workload, pending = pending.len(), present, "planned workload");

        if pending.is_empty() {
            return Preparation::Ready {
                present,
                plan: None,
            };
        }

        let full = match load_curve(&full_path) {
            Ok(curve) => curve,
            Err(e) if e.is_recoverable() => {
                warn!(workload, error = %e, "unusable full histogram, skipping workload");
                return Preparation::SkippedWorkload;
            }
            Err(e) => {
                error!(workload, error = %e, "cannot read full histogram, skipping workload");
                return Preparation::SkippedWorkload;
            }
        };

        Preparation::Ready {
            present,
            plan: Some(WorkloadPlan {
                workload: workload.to_string(),
                full_path,
                full: Arc::new(full),
                pending,
            }),
        }
    }

    /// Evaluate one unit; recoverable failures are skips, the rest are failures
    fn process(&self, plan: &WorkloadPlan, params: SampleParams) -> UnitOutcome {
        match self.evaluate(plan, params) {
            Ok(()) => UnitOutcome::Computed,
            Err(e) => match EvalError::classify(&e) {
                Some(core) if core.is_recoverable() => {
                    warn!(
                        workload = %plan.workload,
                        %params,
                        error = %core,
                        "skipping sample"
                    );
                    UnitOutcome::Skipped
                }
                _ => {
                    let detail = format!("{:#}", e);
                    error!(
                        workload = %plan.workload,
                        %params,
                        error = %detail,
                        "sample failed"
                    );
                    UnitOutcome::Failed
                }
            },
        }
    }

    fn evaluate(&self, plan: &WorkloadPlan, params: SampleParams) -> Result<()> {
        let sample_path = self.resolver.sample_histogram(&plan.workload, &params);
        let sample = load_curve(&sample_path)?;
        let (records, summary) =
            compare_curves(&plan.full, &sample, params.rate, &self.config.analysis)?;

        // The summary marks the unit complete, so it is written last
        if self.config.output.write_windows {
            let windows = self.resolver.window_table(&plan.workload, &params);
            write_window_table(&windows, &records)?;
        }

        let artifact = SummaryArtifact {
            workload: plan.workload.clone(),
            params,
            generated_at: Utc::now(),
            full_histogram: plan.full_path.clone(),
            sample_histogram: sample_path,
            options: self.config.analysis,
            summary,
        };
        let path = self.resolver.summary_artifact(&plan.workload, &params);
        artifact.write_to_file(&path)?;

        debug!(
            workload = %plan.workload,
            %params,
            windows = records.len(),
            mean = summary.overall.mean,
            "sample evaluated"
        );
        Ok(())
    }

    /// Merge every workload's artifacts into its workload table
    pub fn merge(&self) -> Result<Vec<merge::MergeReport>> {
        merge::merge_all(&self.config, self.resolver())
    }
}

fn load_curve(path: &std::path::Path) -> EvalResult<HitRateCurve> {
    let histogram = ReuseDistanceHistogram::load(path)?;
    HitRateCurve::from_histogram(&histogram)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{OutputConfig, PathConfig, SampleConfig, WorkerConfig};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    pub(crate) const FULL: &str = "0,0\n50,0\n30,0\n10,0\n5,0\n5,0\n";
    pub(crate) const SAMPLE: &str = "22,0\n40,0\n38,0\n";

    pub(crate) fn rate(text: &str) -> RationalRate {
        RationalRate::parse(text).unwrap()
    }

    pub(crate) fn test_config(root: &Path, workloads: &[&str], rates: &[&str]) -> Config {
        Config {
            workloads: workloads.iter().map(|w| w.to_string()).collect(),
            samples: SampleConfig {
                rates: rates.iter().map(|r| rate(r)).collect(),
                ..Default::default()
            },
            paths: PathConfig {
                root: root.to_path_buf(),
                ..Default::default()
            },
            analysis: AnalysisOptions::default(),
            output: OutputConfig::default(),
            workers: WorkerConfig {
                threads: 2,
                queue_depth: 2,
            },
        }
    }

    pub(crate) fn params(r: &str) -> SampleParams {
        SampleParams {
            rate: rate(r),
            bits: 0,
            seed: 0,
        }
    }

    pub(crate) fn write_file(path: &Path, content: impl AsRef<[u8]>) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub(crate) fn seed_workload(config: &Config, workload: &str, samples: &[(&str, &str)]) {
        let resolver = TemplateResolver::new(config.paths.clone());
        write_file(&resolver.full_histogram(workload), FULL);
        for (r, content) in samples {
            write_file(&resolver.sample_histogram(workload, &params(r)), content);
        }
    }

    fn summary_path(config: &Config, workload: &str, r: &str) -> PathBuf {
        TemplateResolver::new(config.paths.clone()).summary_artifact(workload, &params(r))
    }

    #[test]
    fn test_compare_curves_half_rate() {
        let full_hist = ReuseDistanceHistogram::parse(FULL).unwrap();
        let sample_hist = ReuseDistanceHistogram::parse(SAMPLE).unwrap();
        let full = HitRateCurve::from_histogram(&full_hist).unwrap();
        let sample = HitRateCurve::from_histogram(&sample_hist).unwrap();
        let (records, summary) =
            compare_curves(&full, &sample, rate("0.5"), &AnalysisOptions::default()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!((records[0].sample_size, records[0].full_size), (1, 2));
        assert_eq!((records[1].sample_size, records[1].full_size), (2, 4));
        assert!((summary.overall.mean - 33.947368421).abs() < 1e-6);
    }

    #[test]
    fn test_run_computes_then_resumes() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), &["w01"], &["0.5"]);
        seed_workload(&config, "w01", &[("0.5", SAMPLE)]);

        let driver = BatchDriver::new(config.clone());
        let first = driver.run();
        assert_eq!(first.computed, 1);
        assert_eq!(first.already_present, 0);

        let artifact =
            SummaryArtifact::read_from_file(&summary_path(&config, "w01", "0.5")).unwrap();
        assert_eq!(artifact.workload, "w01");
        assert_eq!(artifact.params.rate, rate("1/2"));
        assert_eq!(artifact.summary.overall.windows, 2);

        let second = driver.run();
        assert_eq!(second.computed, 0);
        assert_eq!(second.already_present, 1);
    }

    #[test]
    fn test_missing_full_histogram_skips_workload() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), &["w01", "ghost"], &["0.5"]);
        seed_workload(&config, "w01", &[("0.5", SAMPLE)]);

        let report = BatchDriver::new(config).run();
        assert_eq!(report.computed, 1);
        assert_eq!(report.skipped_workloads, 1);
    }

    #[test]
    fn test_malformed_full_histogram_skips_workload() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), &["bad", "empty", "zeros", "w01"], &["0.5"]);
        let resolver = TemplateResolver::new(config.paths.clone());
        for workload in ["bad", "empty", "zeros", "w01"] {
            seed_workload(&config, workload, &[("0.5", SAMPLE)]);
        }
        write_file(&resolver.full_histogram("bad"), "0,0\n50,x\n");
        write_file(&resolver.full_histogram("empty"), "");
        write_file(&resolver.full_histogram("zeros"), "0,0\n0,0\n");

        let report = BatchDriver::new(config.clone()).run();
        assert_eq!(report.skipped_workloads, 3);
        assert_eq!(report.computed, 1);
        assert_eq!(report.failed, 0);
        assert!(summary_path(&config, "w01", "0.5").exists());
        assert!(!summary_path(&config, "bad", "0.5").exists());
    }

    #[test]
    fn test_non_utf8_histograms_are_skipped() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), &["bad", "w01"], &["0.5", "0.25"]);
        let resolver = TemplateResolver::new(config.paths.clone());
        seed_workload(&config, "bad", &[("0.5", SAMPLE)]);
        seed_workload(&config, "w01", &[("0.5", SAMPLE)]);
        write_file(&resolver.full_histogram("bad"), b"1,2\n\xff\xfe,3\n");
        write_file(
            &resolver.sample_histogram("w01", &params("0.25")),
            b"22,0\n\xc3\x28,0\n",
        );

        let report = BatchDriver::new(config.clone()).run();
        assert_eq!(report.skipped_workloads, 1);
        assert_eq!(report.computed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
        assert!(!summary_path(&config, "w01", "0.25").exists());
    }

    #[test]
    fn test_bad_samples_are_skipped() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), &["w01"], &["0.5", "0.25", "0.125", "0.1"]);
        // 0.25 is zero bytes, 0.125 is malformed, 0.1 is missing
        seed_workload(
            &config,
            "w01",
            &[("0.5", SAMPLE), ("0.25", ""), ("0.125", "1,2\nthree,4\n")],
        );

        let report = BatchDriver::new(config.clone()).run();
        assert_eq!(report.computed, 1);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.failed, 0);
        assert!(!summary_path(&config, "w01", "0.25").exists());
        assert!(!summary_path(&config, "w01", "0.125").exists());
    }

    #[test]
    fn test_cold_only_sample_is_skipped() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), &["w01"], &["0.5"]);
        seed_workload(&config, "w01", &[("0.5", "10,5\n")]);

        let report = BatchDriver::new(config).run();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.computed, 0);
    }

    #[test]
    fn test_truncated_artifact_is_recomputed() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), &["w01"], &["0.5"]);
        seed_workload(&config, "w01", &[("0.5", SAMPLE)]);
        write_file(&summary_path(&config, "w01", "0.5"), "{\"workload\": \"w0");

        let report = BatchDriver::new(config.clone()).run();
        assert_eq!(report.computed, 1);
        assert!(SummaryArtifact::read_from_file(&summary_path(&config, "w01", "0.5")).is_ok());
    }

    #[test]
    fn test_window_tables_written_when_enabled() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(dir.path(), &["w01"], &["0.5"]);
        config.output.write_windows = true;
        seed_workload(&config, "w01", &[("0.5", SAMPLE)]);

        BatchDriver::new(config.clone()).run();

        let windows =
            TemplateResolver::new(config.paths.clone()).window_table("w01", &params("0.5"));
        let content = fs::read_to_string(windows).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_many_units_across_workloads() {
        let dir = TempDir::new().unwrap();
        let workloads = ["a", "b", "c"];
        let mut config = test_config(dir.path(), &workloads, &["0.5"]);
        config.samples.seeds = (0..5).collect();
        let resolver = TemplateResolver::new(config.paths.clone());
        for w in workloads {
            write_file(&resolver.full_histogram(w), FULL);
            for params in config.samples.params() {
                write_file(&resolver.sample_histogram(w, &params), SAMPLE);
            }
        }

        let report = BatchDriver::new(config).run();
        assert_eq!(report.computed, 15);
        assert_eq!(report.skipped, 0);
    }
}
