//! Order statistics over error sequences
//!
//! Percentiles use linear interpolation between the two nearest order
//! statistics (`rank = q * (n - 1)`), the conventional method, so results are
//! reproducible across tools that use the same definition.

/// Quantiles reported in every error summary
pub const SUMMARY_QUANTILES: [f64; 7] = [0.5, 0.75, 0.9, 0.95, 0.99, 0.999, 0.9999];

/// Linear-interpolation percentile of an ascending slice
///
/// `quantile` is clamped to `[0, 1]`. Returns 0.0 for an empty slice.
pub fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = quantile.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = rank - lower as f64;
        sorted[lower] + (sorted[upper] - sorted[lower]) * weight
    }
}

/// Arithmetic mean, summed in input order; 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sorted copy of `values` using IEEE total order
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}
