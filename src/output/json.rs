//! JSON summary artifacts
//!
//! One artifact per `(workload, rate, bits, seed)` unit:
//!
//! ```json
//! {
//!   "workload": "w82",
//!   "rate": "0.01",
//!   "bits": 4,
//!   "seed": 42,
//!   "generated_at": "2026-10-19T08:00:00Z",
//!   "full_histogram": "/data/rd/w82.csv",
//!   "sample_histogram": "/data/rd/sample/w82/rate=0.01_bits=4_seed=42.csv",
//!   "options": { "read_only": false, "zero_baseline": "zero" },
//!   "summary": { "read": { ... }, "write": { ... }, "overall": { ... } }
//! }
//! ```

use crate::batch::SampleParams;
use crate::output::write_atomic;
use crate::stats::{AnalysisOptions, ErrorSummary};
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted result of one sample comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryArtifact {
    pub workload: String,
    #[serde(flatten)]
    pub params: SampleParams,
    pub generated_at: DateTime<Utc>,
    pub full_histogram: PathBuf,
    pub sample_histogram: PathBuf,
    #[serde(default)]
    pub options: AnalysisOptions,
    pub summary: ErrorSummary,
}

impl SummaryArtifact {
    /// Write the artifact atomically as pretty-printed JSON
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        write_atomic(path, |w| {
            serde_json::to_writer_pretty(&mut *w, self)
                .context("Failed to serialize summary artifact")?;
            writeln!(w)?;
            Ok(())
        })
    }

    /// Read an artifact
    pub fn read_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read summary artifact: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse summary artifact: {}", path.display()))
    }

    /// Read an artifact if a complete one exists at `path`
    ///
    /// A file that does not parse (for example one left behind by an older,
    /// non-atomic writer) is reported as absent so the unit is recomputed.
    pub fn read_if_complete(path: &Path) -> Option<Self> {
        if !path.is_file() {
            return None;
        }
        match Self::read_from_file(path) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable artifact");
                None
            }
        }
    }
}
