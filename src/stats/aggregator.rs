//! Error aggregation between aligned hit-rate curves
//!
//! The aggregator walks an [`Alignment`], compares the full and sample curves
//! at each window, and reduces the per-window percent errors to a mean plus the
//! [`SUMMARY_QUANTILES`] percentiles for each op type.
//!
//! # Usage
//!
//! 1. Create an aggregator with `ErrorAggregator::new(options)`
//! 2. Produce the per-window table with `records()` (optional)
//! 3. Reduce it with `summarize()`, or do both at once with `compute()`
//!
//! All three are pure: identical inputs give bit-identical output.

use crate::align::Alignment;
use crate::error::{EvalError, EvalResult};
use crate::profile::HitRateCurve;
use crate::stats::percentile::{self, SUMMARY_QUANTILES};
use crate::stats::{
    percent_error, AnalysisOptions, ErrorRecord, ErrorSummary, OpErrorSummary, OpRates, OpType,
    ZeroBaseline,
};

/// Compares a sample curve against its full curve
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorAggregator {
    options: AnalysisOptions,
}

impl ErrorAggregator {
    pub fn new(options: AnalysisOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Per-window comparison records, in window order
    pub fn records(
        &self,
        full: &HitRateCurve,
        sample: &HitRateCurve,
        alignment: Alignment,
    ) -> Vec<ErrorRecord> {
        alignment
            .map(|window| {
                let full_hr = OpRates::from_fn(|op| {
                    full.at(op.curve_variant(&self.options), window.full_size)
                });
                let sample_hr = OpRates::from_fn(|op| {
                    sample.at(op.curve_variant(&self.options), window.sample_size)
                });

                ErrorRecord {
                    sample_size: window.sample_size,
                    full_size: window.full_size,
                    sample_hr,
                    full_hr,
                    abs_err: OpRates::from_fn(|op| (full_hr.get(op) - sample_hr.get(op)).abs()),
                    percent_err: OpRates::from_fn(|op| {
                        percent_error(full_hr.get(op), sample_hr.get(op))
                    }),
                }
            })
            .collect()
    }

    /// Reduce per-window records to a summary
    ///
    /// # Errors
    ///
    /// [`EvalError::EmptyInput`] if there are no records, i.e. the sample curve
    /// has no non-zero cache size to compare.
    pub fn summarize(&self, records: &[ErrorRecord]) -> EvalResult<ErrorSummary> {
        if records.is_empty() {
            return Err(EvalError::EmptyInput(
                "no comparable cache sizes between sample and full curves".to_string(),
            ));
        }

        Ok(ErrorSummary {
            read: self.summarize_op(records, OpType::Read),
            write: self.summarize_op(records, OpType::Write),
            overall: self.summarize_op(records, OpType::Overall),
        })
    }

    /// Build records for `alignment` and summarize them
    pub fn compute(
        &self,
        full: &HitRateCurve,
        sample: &HitRateCurve,
        alignment: Alignment,
    ) -> EvalResult<ErrorSummary> {
        let records = self.records(full, sample, alignment);
        self.summarize(&records)
    }

    fn summarize_op(&self, records: &[ErrorRecord], op: OpType) -> OpErrorSummary {
        let percents: Vec<f64> = records
            .iter()
            .filter(|r| match self.options.zero_baseline {
                ZeroBaseline::Zero => true,
                ZeroBaseline::Exclude => r.full_hr.get(op) > 0.0,
            })
            .map(|r| r.percent_err.get(op))
            .collect();
        let abs: Vec<f64> = records.iter().map(|r| r.abs_err.get(op)).collect();

        if percents.is_empty() {
            return OpErrorSummary {
                mean_abs: percentile::mean(&abs),
                ..Default::default()
            };
        }

        let sorted = percentile::sorted(&percents);
        let q: Vec<f64> = SUMMARY_QUANTILES
            .iter()
            .map(|&quantile| percentile::percentile(&sorted, quantile))
            .collect();

        OpErrorSummary {
            windows: percents.len(),
            mean: percentile::mean(&percents),
            mean_abs: percentile::mean(&abs),
            p50: q[0],
            p75: q[1],
            p90: q[2],
            p95: q[3],
            p99: q[4],
            p999: q[5],
            p9999: q[6],
        }
    }
}
