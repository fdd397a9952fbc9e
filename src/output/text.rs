//! Human-readable text output

use crate::align::RationalRate;
use crate::batch::merge::MergeReport;
use crate::batch::BatchReport;
use crate::profile::{CurveVariant, HitRateCurve, ReuseDistanceHistogram};
use crate::stats::{ErrorSummary, OpType};

/// Print the result of one sample comparison
///
/// Displays:
/// - Rate as an exact fraction
/// - Windows compared per op type
/// - Mean and percentile percent error
/// - Mean absolute hit-rate error
pub fn print_summary(
    summary: &ErrorSummary,
    rate: RationalRate,
    full: &HitRateCurve,
    sample: &HitRateCurve,
) {
    println!("═══════════════════════════════════════════════════════════");
    println!("                HIT-RATE ERROR SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!(
        "Sampling rate: {} ({}/{})",
        rate,
        rate.numerator(),
        rate.denominator()
    );
    println!(
        "Full curve:    {} sizes, {} requests",
        format_number(full.len() as u64),
        format_number(full.total_requests())
    );
    println!(
        "Sample curve:  {} sizes, {} requests",
        format_number(sample.len() as u64),
        format_number(sample.total_requests())
    );
    println!();

    println!(
        "  {:<8} {:>8} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
        "op", "windows", "mean%", "p50", "p75", "p90", "p95", "p99", "p99.9", "p99.99", "mean_abs"
    );
    for op in OpType::ALL {
        let s = summary.get(op);
        println!(
            "  {:<8} {:>8} {:>9.3} {:>9.3} {:>9.3} {:>9.3} {:>9.3} {:>9.3} {:>9.3} {:>9.3} {:>9.5}",
            op.as_str(),
            s.windows,
            s.mean,
            s.p50,
            s.p75,
            s.p90,
            s.p95,
            s.p99,
            s.p999,
            s.p9999,
            s.mean_abs
        );
    }
    println!();
}

/// Print a short description of one histogram and its curve
pub fn print_curve_info(name: &str, hist: &ReuseDistanceHistogram, curve: &HitRateCurve) {
    println!("{}:", name);
    println!(
        "  Requests:    {} ({} reads, {} writes)",
        format_number(hist.total_requests()),
        format_number(hist.total_reads()),
        format_number(hist.total_writes())
    );
    println!("  Cold misses: {}", format_number(curve.cold_misses()));
    match hist.max_rd() {
        Some(max_rd) => println!("  Max RD:      {}", format_number(max_rd as u64)),
        None => println!("  Max RD:      none (cold misses only)"),
    }
    println!(
        "  Max hit rate: overall {:.4}, read {:.4}, write {:.4}, read-only {:.4}",
        curve.at(CurveVariant::Overall, curve.max_index()),
        curve.at(CurveVariant::Read, curve.max_index()),
        curve.at(CurveVariant::Write, curve.max_index()),
        curve.at(CurveVariant::ReadOnly, curve.max_index()),
    );
}

/// Print the outcome counts of a batch run
pub fn print_batch_report(report: &BatchReport) {
    println!("Batch complete:");
    println!("  Computed:         {}", report.computed);
    println!("  Already present:  {}", report.already_present);
    println!("  Skipped:          {}", report.skipped);
    println!("  Skipped workloads: {}", report.skipped_workloads);
    if report.failed > 0 {
        println!("  Failed:           {}", report.failed);
    }
}

/// Print one line per merged workload table
pub fn print_merge_reports(reports: &[MergeReport]) {
    println!("Merge complete:");
    for r in reports {
        let status = if r.written { "updated" } else { "unchanged" };
        println!(
            "  {:<20} {:>9}  rows {:>5} (+{}), missing {}  {}",
            r.workload,
            status,
            r.existing + r.added,
            r.added,
            r.missing,
            r.table.display()
        );
    }
}

/// Format number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
