//! hrceval - Hit-rate curve error evaluation for sampled storage traces
//!
//! hrceval measures how faithfully a sub-sampled block trace preserves the cache
//! behavior of its full source trace. Both traces are summarized by reuse-distance
//! histograms produced by an external profiler; hrceval turns each histogram into a
//! hit-rate curve and compares the curves at exactly aligned cache sizes.
//!
//! # Architecture
//!
//! - **Profile**: reuse-distance histogram loading and hit-rate curve derivation
//! - **Align**: exact rational mapping between sample and full cache-size axes
//! - **Stats**: per-window error records and percentile summaries
//! - **Batch**: idempotent per-workload drivers over many sample parameterizations
//! - **Worker**: bounded-queue worker pool used by the batch drivers
//! - **Output**: JSON summary artifacts, CSV tables, text reports

pub mod align;
pub mod batch;
pub mod config;
pub mod error;
pub mod output;
pub mod profile;
pub mod stats;
pub mod worker;

// Re-export commonly used types
pub use align::{Alignment, AlignmentWindow, RationalRate};
pub use config::Config;
pub use error::EvalError;
pub use profile::{HitRateCurve, ReuseDistanceHistogram};
pub use stats::{ErrorRecord, ErrorSummary};

/// Result type used throughout hrceval
pub type Result<T> = anyhow::Result<T>;
