//! Reuse-distance profiles
//!
//! Histogram ingestion and hit-rate curve derivation.

pub mod histogram;
pub mod hrc;

pub use histogram::{Bucket, ReuseDistanceHistogram};
pub use hrc::{CurveVariant, HitRateCurve};
