//! Exact alignment of sample and full cache-size axes
//!
//! A sample drawn at rate `p` shrinks the working set by `p`, so a sample cache
//! of `s` blocks models a full-trace cache of `s / p` blocks. Computing
//! `round(s / p)` per point in floating point drifts and can repeat or reorder
//! indices over hundreds of thousands of sizes. Instead the rate is held as an
//! exact fraction `n/d` and window `i` pairs sample size `i * n` with full size
//! `i * d`, using integer arithmetic only.
//!
//! # Example
//!
//! ```
//! use hrceval::align::{align, RationalRate};
//!
//! let rate = RationalRate::parse("0.8").unwrap();
//! assert_eq!((rate.numerator(), rate.denominator()), (4, 5));
//!
//! let windows: Vec<_> = align(rate, 8, 100).collect();
//! assert_eq!(windows.len(), 2);
//! assert_eq!((windows[1].sample_size, windows[1].full_size), (8, 10));
//! ```

use crate::error::{EvalError, EvalResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Sampling rate as an exact fraction in lowest terms, strictly within (0, 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RationalRate {
    numerator: u64,
    denominator: u64,
}

impl RationalRate {
    /// Create a rate from a fraction, reducing it to lowest terms
    ///
    /// # Errors
    ///
    /// [`EvalError::Alignment`] unless `0 < numerator / denominator < 1`.
    pub fn new(numerator: u64, denominator: u64) -> EvalResult<Self> {
        if denominator == 0 {
            return Err(EvalError::Alignment(format!(
                "{}/{} has a zero denominator",
                numerator, denominator
            )));
        }
        if numerator == 0 || numerator >= denominator {
            return Err(EvalError::Alignment(format!(
                "{}/{} is not strictly between 0 and 1",
                numerator, denominator
            )));
        }

        let g = gcd(numerator, denominator);
        Ok(Self {
            numerator: numerator / g,
            denominator: denominator / g,
        })
    }

    /// Parse a rate from its decimal text (`"0.8"`, `".05"`, `"5e-3"`) or as a
    /// fraction (`"1/3"`)
    ///
    /// The value is taken from the digits as written, so `"0.8"` becomes exactly
    /// 4/5 rather than the nearest binary double.
    pub fn parse(text: &str) -> EvalResult<Self> {
        let text = text.trim();
        let invalid = || EvalError::Alignment(format!("{:?} is not a decimal or fraction", text));

        if let Some((num, den)) = text.split_once('/') {
            let num = num.trim().parse::<u64>().map_err(|_| invalid())?;
            let den = den.trim().parse::<u64>().map_err(|_| invalid())?;
            return Self::new(num, den);
        }

        let text_unsigned = text.strip_prefix('+').unwrap_or(text);
        if text_unsigned.starts_with('-') {
            return Err(EvalError::Alignment(format!(
                "{} is not strictly between 0 and 1",
                text
            )));
        }

        let (mantissa, exponent) = match text_unsigned.find(|c: char| c == 'e' || c == 'E') {
            Some(pos) => {
                let exp = text_unsigned[pos + 1..]
                    .parse::<i32>()
                    .map_err(|_| invalid())?;
                (&text_unsigned[..pos], exp)
            }
            None => (text_unsigned, 0),
        };

        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let frac_part = frac_part.trim_end_matches('0');
        let digits = format!("{}{}", int_part, frac_part);
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Self::new(0, 1);
        }

        let degenerate =
            || EvalError::Alignment(format!("{} does not fit an exact 64-bit fraction", text));
        let value = digits.parse::<u64>().map_err(|_| degenerate())?;
        let scale = frac_part.len() as i64 - exponent as i64;

        if scale <= 0 {
            // Integer-valued: 0 was handled above, so this is >= 1
            return Err(EvalError::Alignment(format!(
                "{} is not strictly between 0 and 1",
                text
            )));
        }
        let denominator = u32::try_from(scale)
            .ok()
            .and_then(|s| 10u64.checked_pow(s))
            .ok_or_else(degenerate)?;

        Self::new(value, denominator)
    }

    /// Convert a float through its shortest round-trip decimal text
    pub fn from_f64(value: f64) -> EvalResult<Self> {
        if !value.is_finite() {
            return Err(EvalError::Alignment(format!("{} is not finite", value)));
        }
        Self::parse(&value.to_string())
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// Approximate value, for display and logging only
    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Exact decimal digits, when the denominator divides a power of ten
    fn exact_decimal(&self) -> Option<String> {
        let mut pow = 1u128;
        for places in 0..=19usize {
            if pow % self.denominator as u128 == 0 {
                let scaled = self.numerator as u128 * (pow / self.denominator as u128);
                return Some(format!("0.{:0>width$}", scaled, width = places));
            }
            pow *= 10;
        }
        None
    }
}

impl fmt::Display for RationalRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exact_decimal() {
            Some(decimal) => f.write_str(&decimal),
            None => write!(f, "{}/{}", self.numerator, self.denominator),
        }
    }
}

impl Ord for RationalRate {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.numerator as u128 * other.denominator as u128;
        let rhs = other.numerator as u128 * self.denominator as u128;
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for RationalRate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for RationalRate {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RationalRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RationalRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RateRepr {
            Text(String),
            Number(f64),
        }

        let rate = match RateRepr::deserialize(deserializer)? {
            RateRepr::Text(text) => RationalRate::parse(&text),
            RateRepr::Number(value) => RationalRate::from_f64(value),
        };
        rate.map_err(serde::de::Error::custom)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// One comparison point between a sample curve and a full curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentWindow {
    /// 1-based window number
    pub index: u64,
    /// Cache size on the sample curve
    pub sample_size: usize,
    /// Logically equivalent cache size on the full curve
    pub full_size: usize,
}

/// Iterator over the aligned windows of a sample/full curve pair
///
/// Created by [`align`]. Windows cover sample sizes `numerator, 2*numerator, ...`
/// up to the sample curve's largest size; a window running past either curve's
/// largest size is clamped to it rather than dropped.
#[derive(Debug, Clone)]
pub struct Alignment {
    rate: RationalRate,
    sample_max_index: usize,
    full_max_index: usize,
    next: u64,
    count: u64,
}

/// Pair sample cache sizes with full cache sizes for `rate`
pub fn align(rate: RationalRate, sample_max_index: usize, full_max_index: usize) -> Alignment {
    let sample_max = sample_max_index as u64;
    let count = sample_max / rate.numerator + u64::from(sample_max % rate.numerator != 0);

    Alignment {
        rate,
        sample_max_index,
        full_max_index,
        next: 1,
        count,
    }
}

impl Alignment {
    /// Total number of windows, including those already yielded
    pub fn window_count(&self) -> u64 {
        self.count
    }

    pub fn rate(&self) -> RationalRate {
        self.rate
    }

    /// Window `index` (1-based), regardless of iteration state
    pub fn window(&self, index: u64) -> AlignmentWindow {
        let clamp = |size: u64, max: usize| -> usize {
            if size > max as u64 {
                max
            } else {
                size as usize
            }
        };

        AlignmentWindow {
            index,
            sample_size: clamp(
                index.saturating_mul(self.rate.numerator),
                self.sample_max_index,
            ),
            full_size: clamp(
                index.saturating_mul(self.rate.denominator),
                self.full_max_index,
            ),
        }
    }
}

impl Iterator for Alignment {
    type Item = AlignmentWindow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.count {
            return None;
        }
        let window = self.window(self.next);
        self.next += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count + 1 - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Alignment {}
