//! Workload-level merge of per-sample summary artifacts

use crate::batch::paths::PathResolver;
use crate::batch::SampleParams;
use crate::config::Config;
use crate::output::csv::{WorkloadRow, WorkloadTable};
use crate::output::json::SummaryArtifact;
use crate::Result;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// Outcome of merging one workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub workload: String,
    pub table: PathBuf,
    /// Rows present before the merge
    pub existing: usize,
    /// Rows appended by this merge
    pub added: usize,
    /// Configured samples with no complete artifact yet
    pub missing: usize,
    /// Whether the table file was (re)written
    pub written: bool,
}

/// Fold one workload's summary artifacts into its workload table
///
/// Rows already in the table are kept as they are and never re-read from
/// their artifacts. When no new row is found the table file is not touched.
pub fn merge_workload(
    config: &Config,
    resolver: &dyn PathResolver,
    workload: &str,
) -> Result<MergeReport> {
    let table_path = resolver.workload_table(workload);
    let mut table = WorkloadTable::read_from_file(&table_path)?.unwrap_or_default();
    let existing = table.len();

    let candidates: Vec<SampleParams> = config
        .samples
        .params()
        .into_iter()
        .filter(|p| !table.contains(&(workload.to_string(), p.rate, p.bits, p.seed)))
        .collect();

    let artifacts: Vec<Option<SummaryArtifact>> = candidates
        .par_iter()
        .map(|p| SummaryArtifact::read_if_complete(&resolver.summary_artifact(workload, p)))
        .collect();

    let mut added = 0;
    let mut missing = 0;
    for (params, artifact) in candidates.into_iter().zip(artifacts) {
        match artifact {
            Some(artifact) => {
                let row = WorkloadRow {
                    workload: workload.to_string(),
                    params,
                    summary: artifact.summary,
                };
                if table.insert(row) {
                    added += 1;
                }
            }
            None => missing += 1,
        }
    }

    let written = added > 0;
    if written {
        table.write_to_file(&table_path)?;
        info!(
            workload,
            added,
            rows = table.len(),
            path = %table_path.display(),
            "workload table updated"
        );
    } else {
        debug!(workload, rows = table.len(), "workload table up to date");
    }

    Ok(MergeReport {
        workload: workload.to_string(),
        table: table_path,
        existing,
        added,
        missing,
        written,
    })
}

/// Merge every configured workload
pub fn merge_all(config: &Config, resolver: &dyn PathResolver) -> Result<Vec<MergeReport>> {
    config
        .workloads
        .iter()
        .map(|workload| merge_workload(config, resolver, workload))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::paths::TemplateResolver;
    use crate::batch::tests::{rate, seed_workload, test_config, SAMPLE};
    use crate::batch::BatchDriver;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_merge_then_remerge_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), &["w01"], &["0.5", "0.25"]);
        seed_workload(&config, "w01", &[("0.5", SAMPLE), ("0.25", SAMPLE)]);
        let driver = BatchDriver::new(config.clone());
        assert_eq!(driver.run().computed, 2);

        let first = driver.merge().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].added, 2);
        assert!(first[0].written);

        let table = &first[0].table;
        let modified = fs::metadata(table).unwrap().modified().unwrap();
        let content = fs::read_to_string(table).unwrap();

        let second = driver.merge().unwrap();
        assert_eq!(second[0].existing, 2);
        assert_eq!(second[0].added, 0);
        assert!(!second[0].written);
        assert_eq!(fs::metadata(table).unwrap().modified().unwrap(), modified);
        assert_eq!(fs::read_to_string(table).unwrap(), content);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_merge_adds_only_new_rows() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(dir.path(), &["w01"], &["0.5"]);
        seed_workload(&config, "w01", &[("0.5", SAMPLE), ("0.25", SAMPLE)]);
        BatchDriver::new(config.clone()).run();
        let resolver = TemplateResolver::new(config.paths.clone());
        merge_workload(&config, &resolver, "w01").unwrap();

        config.samples.rates.push(rate("0.25"));
        config.samples.rates.push(rate("0.125"));
        BatchDriver::new(config.clone()).run();

        let report = merge_workload(&config, &resolver, "w01").unwrap();
        assert_eq!(report.existing, 1);
        assert_eq!(report.added, 1);
        assert_eq!(report.missing, 1);

        let table = WorkloadTable::read_from_file(&report.table).unwrap().unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_merge_without_artifacts_creates_no_table() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), &["w01"], &["0.5"]);
        let resolver = TemplateResolver::new(config.paths.clone());

        let report = merge_workload(&config, &resolver, "w01").unwrap();
        assert_eq!(report.missing, 1);
        assert!(!report.written);
        assert!(!report.table.exists());
    }
}
