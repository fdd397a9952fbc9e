//! CSV output formatting
//!
//! This module provides the CSV tables hrceval produces. CSV is the format the
//! plotting and reporting layer reads (pandas, R, spreadsheets).
//!
//! Tables:
//! - Per-window comparison table for one sample (`write_window_table`)
//! - Hit-rate curve export for one histogram (`write_curve`)
//! - Workload-level summary table, one row per sample (`WorkloadTable`)

use crate::align::RationalRate;
use crate::batch::SampleParams;
use crate::output::write_atomic;
use crate::profile::{CurveVariant, HitRateCurve};
use crate::stats::{ErrorRecord, ErrorSummary, OpErrorSummary, OpType};
use crate::Result;
use anyhow::Context;
use std::collections::HashSet;
use std::path::Path;

/// Header of the per-window comparison table
pub const WINDOW_HEADER: &str = "sample_size,full_size,\
sample_read_hr,sample_write_hr,sample_overall_hr,\
full_read_hr,full_write_hr,full_overall_hr,\
delta_read_hr,delta_write_hr,delta_overall_hr,\
percent_read_hr,percent_write_hr,percent_overall_hr";

/// Write the per-window comparison table
pub fn write_window_table(path: &Path, records: &[ErrorRecord]) -> Result<()> {
    write_atomic(path, |w| {
        writeln!(w, "{}", WINDOW_HEADER)?;
        for r in records {
            writeln!(
                w,
                "{},{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.4},{:.4},{:.4}",
                r.sample_size,
                r.full_size,
                r.sample_hr.read,
                r.sample_hr.write,
                r.sample_hr.overall,
                r.full_hr.read,
                r.full_hr.write,
                r.full_hr.overall,
                r.abs_err.read,
                r.abs_err.write,
                r.abs_err.overall,
                r.percent_err.read,
                r.percent_err.write,
                r.percent_err.overall,
            )?;
        }
        Ok(())
    })
}

/// Export every variant of a hit-rate curve
pub fn write_curve(path: &Path, curve: &HitRateCurve) -> Result<()> {
    write_atomic(path, |w| {
        writeln!(w, "cache_size,read_hr,write_hr,overall_hr,read_only_hr")?;
        for size in 0..curve.len() {
            writeln!(
                w,
                "{},{:.6},{:.6},{:.6},{:.6}",
                size,
                curve.at(CurveVariant::Read, size),
                curve.at(CurveVariant::Write, size),
                curve.at(CurveVariant::Overall, size),
                curve.at(CurveVariant::ReadOnly, size),
            )?;
        }
        Ok(())
    })
}

/// Unique key of a workload-table row
pub type RowKey = (String, RationalRate, u32, u64);

/// One sample's summary in a workload table
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadRow {
    pub workload: String,
    pub params: SampleParams,
    pub summary: ErrorSummary,
}

impl WorkloadRow {
    pub fn key(&self) -> RowKey {
        (
            self.workload.clone(),
            self.params.rate,
            self.params.bits,
            self.params.seed,
        )
    }

    fn to_line(&self) -> String {
        let mut fields = vec![
            self.workload.clone(),
            self.params.rate.to_string(),
            self.params.bits.to_string(),
            self.params.seed.to_string(),
        ];
        for op in OpType::ALL {
            let stats = self.summary.get(op);
            fields.push(stats.windows.to_string());
            // Shortest round-trip form so a reloaded table is bit-identical
            fields.extend(stats.values().iter().map(|v| v.to_string()));
        }
        fields.join(",")
    }

    fn parse_line(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let expected = 4 + OpType::ALL.len() * (1 + OpErrorSummary::STAT_NAMES.len());
        if fields.len() != expected {
            anyhow::bail!("expected {} fields, found {}", expected, fields.len());
        }

        let params = SampleParams {
            rate: RationalRate::parse(fields[1])?,
            bits: fields[2].parse().context("Invalid bits")?,
            seed: fields[3].parse().context("Invalid seed")?,
        };

        let mut ops = Vec::with_capacity(OpType::ALL.len());
        let mut cursor = 4;
        for _ in OpType::ALL {
            let windows: usize = fields[cursor].parse().context("Invalid window count")?;
            let mut values = [0.0f64; 9];
            for (i, value) in values.iter_mut().enumerate() {
                *value = fields[cursor + 1 + i]
                    .parse()
                    .with_context(|| format!("Invalid value: {}", fields[cursor + 1 + i]))?;
            }
            ops.push(OpErrorSummary::from_values(windows, values));
            cursor += 1 + values.len();
        }

        Ok(Self {
            workload: fields[0].to_string(),
            params,
            summary: ErrorSummary {
                read: ops[0],
                write: ops[1],
                overall: ops[2],
            },
        })
    }
}

/// Workload-level table of per-sample summaries, unique by [`RowKey`]
#[derive(Debug, Clone, Default)]
pub struct WorkloadTable {
    rows: Vec<WorkloadRow>,
    keys: HashSet<RowKey>,
}

impl WorkloadTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column header line
    pub fn header() -> String {
        let mut columns = vec![
            "workload".to_string(),
            "rate".to_string(),
            "bits".to_string(),
            "seed".to_string(),
        ];
        for op in OpType::ALL {
            columns.push(format!("{}_windows", op));
            columns.extend(
                OpErrorSummary::STAT_NAMES
                    .iter()
                    .map(|stat| format!("{}_{}", op, stat)),
            );
        }
        columns.join(",")
    }

    /// Add a row unless its key is already present; returns whether it was added
    pub fn insert(&mut self, row: WorkloadRow) -> bool {
        if !self.keys.insert(row.key()) {
            return false;
        }
        self.rows.push(row);
        true
    }

    pub fn contains(&self, key: &RowKey) -> bool {
        self.keys.contains(key)
    }

    pub fn rows(&self) -> &[WorkloadRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Load a table, or `None` if there is no file at `path`
    ///
    /// Duplicate keys in the file are collapsed to their first occurrence.
    pub fn read_from_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read workload table: {}", path.display()))?;

        let mut table = Self::new();
        for (idx, line) in content.lines().enumerate().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            let row = WorkloadRow::parse_line(line).with_context(|| {
                format!("Invalid row at {}:{}", path.display(), idx + 1)
            })?;
            table.insert(row);
        }
        Ok(Some(table))
    }

    /// Write the table atomically, rows sorted by key
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let mut rows: Vec<&WorkloadRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| a.key().cmp(&b.key()));

        write_atomic(path, |w| {
            writeln!(w, "{}", Self::header())?;
            for row in rows {
                writeln!(w, "{}", row.to_line())?;
            }
            Ok(())
        })
    }
}
