//! Hit-rate curve derivation
//!
//! An access with reuse distance `d` hits in any LRU cache holding more than `d`
//! blocks, so the hit ratio of a cache of `s` blocks is the prefix sum of buckets
//! `1..=s` divided by the request total. Index 0 (an empty cache) is always 0.

use crate::error::{EvalError, EvalResult};
use crate::profile::histogram::{overflow_line, ReuseDistanceHistogram};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which hit-rate array to derive from a histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveVariant {
    /// Read and write hits over all requests
    Overall,
    /// Read hits over all requests
    Read,
    /// Write hits over all requests
    Write,
    /// Read hits over read requests only
    ReadOnly,
}

impl fmt::Display for CurveVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CurveVariant::Overall => "overall",
            CurveVariant::Read => "read",
            CurveVariant::Write => "write",
            CurveVariant::ReadOnly => "read_only",
        };
        f.write_str(name)
    }
}

/// Build a single hit-rate array for `variant`
///
/// # Errors
///
/// [`EvalError::EmptyInput`] if the histogram holds zero requests.
pub fn build(histogram: &ReuseDistanceHistogram, variant: CurveVariant) -> EvalResult<Vec<f64>> {
    let curve = histogram.hit_rate_curve()?;
    Ok(curve.series(variant).to_vec())
}

/// Hit ratio as a function of cache size, for every variant
///
/// Every array has length `max_rd + 2`: index 0 plus one entry per reuse
/// distance bucket. All arrays are non-decreasing and bounded in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRateCurve {
    read: Vec<f64>,
    write: Vec<f64>,
    overall: Vec<f64>,
    read_only: Vec<f64>,
    total_requests: u64,
    total_reads: u64,
    cold_misses: u64,
}

impl HitRateCurve {
    /// Derive all hit-rate arrays from a histogram
    ///
    /// Prefer [`ReuseDistanceHistogram::hit_rate_curve`], which caches the result.
    ///
    /// # Errors
    ///
    /// - [`EvalError::Format`] if the request total does not fit in a `u64`
    /// - [`EvalError::EmptyInput`] if the histogram holds zero requests
    pub fn from_histogram(histogram: &ReuseDistanceHistogram) -> EvalResult<Self> {
        let buckets = histogram.buckets();
        let cold = buckets[0];

        // Every partial sum below is bounded by the request total
        if let Some(line) = overflow_line(buckets) {
            return Err(EvalError::Format {
                path: PathBuf::from("<memory>"),
                line,
                message: "request counts overflow a 64-bit total".to_string(),
            });
        }

        // Cumulative hits; index s covers reuse distances 0..s
        let mut read_cum = Vec::with_capacity(buckets.len());
        let mut write_cum = Vec::with_capacity(buckets.len());
        read_cum.push(0u64);
        write_cum.push(0u64);
        for bucket in &buckets[1..] {
            let (r, w) = (read_cum[read_cum.len() - 1], write_cum[write_cum.len() - 1]);
            read_cum.push(r + bucket.reads);
            write_cum.push(w + bucket.writes);
        }

        let hit_reads = read_cum[read_cum.len() - 1];
        let hit_writes = write_cum[write_cum.len() - 1];
        let total_requests = cold.total() + hit_reads + hit_writes;
        if total_requests == 0 {
            return Err(EvalError::EmptyInput(
                "histogram holds zero requests; hit rate is undefined".to_string(),
            ));
        }
        let total_reads = cold.reads + hit_reads;

        let total = total_requests as f64;
        let read = read_cum.iter().map(|&r| r as f64 / total).collect();
        let write = write_cum.iter().map(|&w| w as f64 / total).collect();
        let overall = read_cum
            .iter()
            .zip(&write_cum)
            .map(|(&r, &w)| (r + w) as f64 / total)
            .collect();
        // A write-only trace has no read hits at any size
        let read_only = if total_reads == 0 {
            vec![0.0; read_cum.len()]
        } else {
            read_cum
                .iter()
                .map(|&r| r as f64 / total_reads as f64)
                .collect()
        };

        Ok(Self {
            read,
            write,
            overall,
            read_only,
            total_requests,
            total_reads,
            cold_misses: cold.total(),
        })
    }

    /// Hit-rate array for `variant`
    pub fn series(&self, variant: CurveVariant) -> &[f64] {
        match variant {
            CurveVariant::Overall => &self.overall,
            CurveVariant::Read => &self.read,
            CurveVariant::Write => &self.write,
            CurveVariant::ReadOnly => &self.read_only,
        }
    }

    /// Hit rate of `variant` at cache size `size`, clamped to the largest size
    pub fn at(&self, variant: CurveVariant, size: usize) -> f64 {
        let series = self.series(variant);
        series[size.min(series.len() - 1)]
    }

    /// Number of cache sizes covered, including size 0
    pub fn len(&self) -> usize {
        self.overall.len()
    }

    /// Always false; a curve holds at least the size-0 entry
    pub fn is_empty(&self) -> bool {
        self.overall.is_empty()
    }

    /// Largest cache size with a defined hit rate
    pub fn max_index(&self) -> usize {
        self.overall.len() - 1
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    /// Denominator of the read-only variant
    pub fn total_reads(&self) -> u64 {
        self.total_reads
    }

    pub fn cold_misses(&self) -> u64 {
        self.cold_misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn curve(pairs: &[(u64, u64)]) -> HitRateCurve {
        HitRateCurve::from_histogram(&ReuseDistanceHistogram::from_pairs(pairs)).unwrap()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn test_cold_only_histogram() {
        let c = curve(&[(10, 5)]);
        assert_eq!(c.total_requests(), 15);
        assert_eq!(c.series(CurveVariant::Overall), &[0.0]);
        assert_eq!(c.max_index(), 0);
    }

    #[test]
    fn test_overflowing_counts_rejected() {
        let hist = ReuseDistanceHistogram::from_pairs(&[(1, 0), (u64::MAX, 0), (1, 0)]);
        assert!(matches!(
            HitRateCurve::from_histogram(&hist),
            Err(EvalError::Format { line: 2, .. })
        ));

        let c = curve(&[(0, 1), (u64::MAX - 1, 0)]);
        assert_eq!(c.total_requests(), u64::MAX);
        assert_close(c.series(CurveVariant::Overall)[1], 1.0);
    }

    #[test]
    fn test_small_histogram() {
        let c = curve(&[(2, 1), (3, 0), (0, 4)]);
        assert_eq!(c.total_requests(), 10);
        let overall = c.series(CurveVariant::Overall);
        assert_eq!(overall.len(), 3);
        assert_close(overall[0], 0.0);
        assert_close(overall[1], 0.3);
        assert_close(overall[2], 0.7);

        let read = c.series(CurveVariant::Read);
        assert_close(read[1], 0.3);
        assert_close(read[2], 0.3);

        let write = c.series(CurveVariant::Write);
        assert_close(write[1], 0.0);
        assert_close(write[2], 0.4);
    }

    #[test]
    fn test_read_only_uses_read_denominator() {
        let c = curve(&[(2, 1), (3, 0), (0, 4)]);
        assert_eq!(c.total_reads(), 5);
        let read_only = c.series(CurveVariant::ReadOnly);
        assert_close(read_only[1], 0.6);
        assert_close(read_only[2], 0.6);
        // Not the same semantic as the shared-denominator read curve
        assert!(read_only[1] > c.series(CurveVariant::Read)[1]);
    }

    #[test]
    fn test_write_only_trace_read_only_is_zero() {
        let c = curve(&[(0, 2), (0, 3)]);
        assert_eq!(c.series(CurveVariant::ReadOnly), &[0.0, 0.0]);
    }

    #[test]
    fn test_zero_requests_rejected() {
        let hist = ReuseDistanceHistogram::from_pairs(&[(0, 0), (0, 0)]);
        assert!(matches!(
            HitRateCurve::from_histogram(&hist),
            Err(EvalError::EmptyInput(_))
        ));
        assert!(matches!(
            build(&hist, CurveVariant::Overall),
            Err(EvalError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_final_overall_conservation() {
        let c = curve(&[(7, 3), (4, 1), (0, 0), (2, 2), (1, 0)]);
        let total = c.total_requests() as f64;
        let expected = (total - c.cold_misses() as f64) / total;
        assert_close(c.series(CurveVariant::Overall)[c.max_index()], expected);
    }

    #[test]
    fn test_at_clamps() {
        let c = curve(&[(2, 1), (3, 0), (0, 4)]);
        assert_close(c.at(CurveVariant::Overall, 99), 0.7);
    }

    #[test]
    fn test_build_single_variant() {
        let hist = ReuseDistanceHistogram::from_pairs(&[(2, 1), (3, 0), (0, 4)]);
        let overall = build(&hist, CurveVariant::Overall).unwrap();
        assert_eq!(overall.len(), 3);
        assert_close(overall[2], 0.7);
    }

    proptest! {
        #[test]
        fn prop_curves_monotone_and_bounded(
            pairs in prop::collection::vec((0u64..10_000, 0u64..10_000), 1..200)
        ) {
            let hist = ReuseDistanceHistogram::from_pairs(&pairs);
            prop_assume!(hist.total_requests() > 0);
            let c = hist.hit_rate_curve().unwrap();
            for variant in [
                CurveVariant::Overall,
                CurveVariant::Read,
                CurveVariant::Write,
                CurveVariant::ReadOnly,
            ] {
                let series = c.series(variant);
                prop_assert_eq!(series[0], 0.0);
                for pair in series.windows(2) {
                    prop_assert!(pair[0] <= pair[1]);
                }
                for &hr in series {
                    prop_assert!((0.0..=1.0).contains(&hr));
                }
            }
        }

        #[test]
        fn prop_read_only_denominator_is_read_column(
            pairs in prop::collection::vec((0u64..1_000, 0u64..1_000), 1..50)
        ) {
            let hist = ReuseDistanceHistogram::from_pairs(&pairs);
            prop_assume!(hist.total_requests() > 0);
            let c = hist.hit_rate_curve().unwrap();
            let column: u64 = pairs.iter().map(|&(r, _)| r).sum();
            prop_assert_eq!(c.total_reads(), column);
        }
    }
}
