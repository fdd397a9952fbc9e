//! Reuse-distance histogram loading
//!
//! A histogram file is produced by an external profiler. It is line-oriented
//! text with one `read_count,write_count` record per line and no header:
//!
//! ```text
//! 120,31      <- bucket 0: cold misses (infinite reuse distance)
//! 40,2        <- bucket 1: reuse distance 0
//! 17,9        <- bucket 2: reuse distance 1
//! ```
//!
//! # Example
//!
//! ```
//! use hrceval::profile::ReuseDistanceHistogram;
//!
//! let hist = ReuseDistanceHistogram::parse("2,1\n3,0\n0,4\n").unwrap();
//! assert_eq!(hist.total_requests(), 10);
//! assert_eq!(hist.max_rd(), Some(1));
//! ```

use crate::error::{EvalError, EvalResult};
use crate::profile::hrc::HitRateCurve;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Read and write access counts for one reuse distance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bucket {
    pub reads: u64,
    pub writes: u64,
}

impl Bucket {
    pub fn new(reads: u64, writes: u64) -> Self {
        Self { reads, writes }
    }

    /// Reads plus writes, saturating at `u64::MAX`
    #[inline]
    pub fn total(&self) -> u64 {
        self.reads.saturating_add(self.writes)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.reads == 0 && self.writes == 0
    }
}

/// Reuse-distance histogram of a block trace
///
/// Bucket 0 holds cold-miss counts; bucket `n >= 1` holds counts for reuse
/// distance `n - 1`. Trailing empty buckets are dropped on construction, so the
/// last bucket is always the highest reuse distance seen (or bucket 0 when the
/// trace has no reuse at all).
///
/// The histogram is immutable once built. Its hit-rate curve is derived on
/// first request and cached for the lifetime of the instance.
#[derive(Debug)]
pub struct ReuseDistanceHistogram {
    buckets: Vec<Bucket>,
    curve: OnceLock<HitRateCurve>,
}

impl ReuseDistanceHistogram {
    /// Build a histogram from buckets, bucket 0 first
    ///
    /// An empty bucket list becomes a single empty cold-miss bucket.
    pub fn from_buckets(mut buckets: Vec<Bucket>) -> Self {
        if buckets.is_empty() {
            buckets.push(Bucket::default());
        }
        while buckets.len() > 1 && buckets.last().map_or(false, Bucket::is_empty) {
            buckets.pop();
        }

        Self {
            buckets,
            curve: OnceLock::new(),
        }
    }

    /// Build a histogram from `(read_count, write_count)` pairs
    pub fn from_pairs(pairs: &[(u64, u64)]) -> Self {
        Self::from_buckets(pairs.iter().map(|&(r, w)| Bucket::new(r, w)).collect())
    }

    /// Load a histogram file
    ///
    /// # Errors
    ///
    /// - [`EvalError::MissingFile`] if `path` does not exist
    /// - [`EvalError::EmptyInput`] if the file is zero bytes or holds no records
    /// - [`EvalError::Format`] if a line is not valid UTF-8, is not two
    ///   non-negative integers, or pushes the request total past `u64::MAX`
    pub fn load(path: &Path) -> EvalResult<Self> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EvalError::MissingFile(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        if metadata.len() == 0 {
            return Err(EvalError::EmptyInput(format!(
                "histogram file {} is zero bytes",
                path.display()
            )));
        }

        let bytes = fs::read(path)?;
        let content = String::from_utf8(bytes).map_err(|e| {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            EvalError::Format {
                path: path.to_path_buf(),
                line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
                message: "invalid UTF-8".to_string(),
            }
        })?;
        let hist = Self::parse_from(&content, path)?;

        debug!(
            path = %path.display(),
            buckets = hist.buckets.len(),
            reads = hist.total_reads(),
            writes = hist.total_writes(),
            "loaded reuse-distance histogram"
        );

        Ok(hist)
    }

    /// Parse histogram text that did not come from a file
    pub fn parse(content: &str) -> EvalResult<Self> {
        Self::parse_from(content, Path::new("<memory>"))
    }

    fn parse_from(content: &str, origin: &Path) -> EvalResult<Self> {
        let body = content.trim_end();
        if body.is_empty() {
            return Err(EvalError::EmptyInput(format!(
                "histogram {} has no records",
                origin.display()
            )));
        }

        let mut buckets = Vec::new();
        for (idx, line) in body.lines().enumerate() {
            let bucket = parse_record(line).map_err(|message| EvalError::Format {
                path: PathBuf::from(origin),
                line: idx + 1,
                message,
            })?;
            buckets.push(bucket);
        }

        if let Some(line) = overflow_line(&buckets) {
            return Err(EvalError::Format {
                path: PathBuf::from(origin),
                line,
                message: "request counts overflow a 64-bit total".to_string(),
            });
        }

        Ok(Self::from_buckets(buckets))
    }

    /// All buckets, cold-miss bucket first
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Number of buckets (always at least 1)
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// True when no access of any kind was recorded
    pub fn is_empty(&self) -> bool {
        self.total_requests() == 0
    }

    /// Cold-miss bucket
    pub fn cold_misses(&self) -> Bucket {
        self.buckets[0]
    }

    /// Highest reuse distance with data, or `None` if every access was a cold miss
    pub fn max_rd(&self) -> Option<usize> {
        self.buckets.len().checked_sub(2)
    }

    // Totals saturate; only histograms built with `from_buckets` can reach the cap
    pub fn total_reads(&self) -> u64 {
        self.buckets.iter().fold(0, |acc, b| acc.saturating_add(b.reads))
    }

    pub fn total_writes(&self) -> u64 {
        self.buckets.iter().fold(0, |acc, b| acc.saturating_add(b.writes))
    }

    pub fn total_requests(&self) -> u64 {
        self.total_reads().saturating_add(self.total_writes())
    }

    /// Hit-rate curve of this histogram, computed once and cached
    ///
    /// # Errors
    ///
    /// [`EvalError::EmptyInput`] if the histogram holds zero requests.
    pub fn hit_rate_curve(&self) -> EvalResult<&HitRateCurve> {
        if let Some(curve) = self.curve.get() {
            return Ok(curve);
        }
        let curve = HitRateCurve::from_histogram(self)?;
        Ok(self.curve.get_or_init(|| curve))
    }
}

/// 1-based line of the first bucket that pushes the request total past `u64::MAX`
pub(crate) fn overflow_line(buckets: &[Bucket]) -> Option<usize> {
    let mut total = 0u64;
    for (idx, bucket) in buckets.iter().enumerate() {
        match total
            .checked_add(bucket.reads)
            .and_then(|t| t.checked_add(bucket.writes))
        {
            Some(t) => total = t,
            None => return Some(idx + 1),
        }
    }
    None
}

/// Parse one `read,write` record
fn parse_record(line: &str) -> Result<Bucket, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 2 {
        return Err(format!(
            "expected 2 comma-separated fields, found {} in {:?}",
            fields.len(),
            line
        ));
    }

    let parse_count = |field: &str| -> Result<u64, String> {
        field
            .parse::<u64>()
            .map_err(|_| format!("not a non-negative integer: {:?}", field))
    };

    Ok(Bucket::new(parse_count(fields[0])?, parse_count(fields[1])?))
}
