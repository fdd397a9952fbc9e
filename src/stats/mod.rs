//! Hit-rate error statistics
//!
//! Named record types for per-window comparisons and their summaries. Every
//! metric is a struct field rather than a map entry, so a renamed or missing
//! metric is a compile error instead of a failed lookup.
//!
//! # Example
//!
//! ```
//! use hrceval::align::{align, RationalRate};
//! use hrceval::profile::ReuseDistanceHistogram;
//! use hrceval::stats::{aggregator::ErrorAggregator, AnalysisOptions};
//!
//! let full = ReuseDistanceHistogram::from_pairs(&[(4, 0), (2, 0), (1, 0), (1, 0), (1, 0)]);
//! let sample = ReuseDistanceHistogram::from_pairs(&[(2, 0), (1, 0), (1, 0)]);
//! let full_curve = full.hit_rate_curve().unwrap();
//! let sample_curve = sample.hit_rate_curve().unwrap();
//!
//! let rate = RationalRate::parse("0.5").unwrap();
//! let windows = align(rate, sample_curve.max_index(), full_curve.max_index());
//!
//! let aggregator = ErrorAggregator::new(AnalysisOptions::default());
//! let summary = aggregator.compute(full_curve, sample_curve, windows).unwrap();
//! assert_eq!(summary.overall.windows, 2);
//! ```

pub mod aggregator;
pub mod percentile;

use crate::profile::CurveVariant;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation class a hit rate or error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpType {
    Read,
    Write,
    Overall,
}

impl OpType {
    pub const ALL: [OpType; 3] = [OpType::Read, OpType::Write, OpType::Overall];

    pub fn as_str(&self) -> &'static str {
        match self {
            OpType::Read => "read",
            OpType::Write => "write",
            OpType::Overall => "overall",
        }
    }

    /// Curve variant used for this op type under `options`
    pub fn curve_variant(&self, options: &AnalysisOptions) -> CurveVariant {
        match self {
            OpType::Read if options.read_only => CurveVariant::ReadOnly,
            OpType::Read => CurveVariant::Read,
            OpType::Write => CurveVariant::Write,
            OpType::Overall => CurveVariant::Overall,
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How percent error is treated where the full-trace hit rate is 0
///
/// Relative error against a zero baseline is undefined. `Zero` reports such
/// windows as 0% error; `Exclude` leaves them out of the percent statistics
/// (their absolute error is still counted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroBaseline {
    #[default]
    Zero,
    Exclude,
}

/// Options for one comparison, constructed per call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Normalize read hit rates by read requests instead of all requests
    #[serde(default)]
    pub read_only: bool,
    /// Percent-error policy for zero full-trace hit rates
    #[serde(default)]
    pub zero_baseline: ZeroBaseline,
}

/// One value per op type
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OpRates {
    pub read: f64,
    pub write: f64,
    pub overall: f64,
}

impl OpRates {
    pub fn get(&self, op: OpType) -> f64 {
        match op {
            OpType::Read => self.read,
            OpType::Write => self.write,
            OpType::Overall => self.overall,
        }
    }

    /// Build from a per-op function
    pub fn from_fn(mut f: impl FnMut(OpType) -> f64) -> Self {
        Self {
            read: f(OpType::Read),
            write: f(OpType::Write),
            overall: f(OpType::Overall),
        }
    }
}

/// Percent error of `sample` against baseline `full`
///
/// Returns exactly 0.0 when `full` is not positive; the result is never NaN
/// or infinite for hit rates in `[0, 1]`.
#[inline]
pub fn percent_error(full: f64, sample: f64) -> f64 {
    if full > 0.0 {
        100.0 * (full - sample).abs() / full
    } else {
        0.0
    }
}

/// Comparison of the two curves at one aligned window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorRecord {
    pub sample_size: usize,
    pub full_size: usize,
    pub sample_hr: OpRates,
    pub full_hr: OpRates,
    pub abs_err: OpRates,
    pub percent_err: OpRates,
}

/// Summary of the percent error for one op type
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OpErrorSummary {
    /// Windows contributing to the percent statistics
    pub windows: usize,
    pub mean: f64,
    /// Mean absolute hit-rate error over all windows
    pub mean_abs: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub p999: f64,
    pub p9999: f64,
}

impl OpErrorSummary {
    /// Names of the floating-point statistics, in [`Self::values`] order
    pub const STAT_NAMES: [&'static str; 9] = [
        "mean", "mean_abs", "p50", "p75", "p90", "p95", "p99", "p999", "p9999",
    ];

    pub fn values(&self) -> [f64; 9] {
        [
            self.mean,
            self.mean_abs,
            self.p50,
            self.p75,
            self.p90,
            self.p95,
            self.p99,
            self.p999,
            self.p9999,
        ]
    }

    pub fn from_values(windows: usize, v: [f64; 9]) -> Self {
        Self {
            windows,
            mean: v[0],
            mean_abs: v[1],
            p50: v[2],
            p75: v[3],
            p90: v[4],
            p95: v[5],
            p99: v[6],
            p999: v[7],
            p9999: v[8],
        }
    }
}

/// Percent-error summary of a sample against its full trace
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub read: OpErrorSummary,
    pub write: OpErrorSummary,
    pub overall: OpErrorSummary,
}

impl ErrorSummary {
    pub fn get(&self, op: OpType) -> &OpErrorSummary {
        match op {
            OpType::Read => &self.read,
            OpType::Write => &self.write,
            OpType::Overall => &self.overall,
        }
    }
}
