//! Error taxonomy for the evaluation core
//!
//! The core (loading, curve building, alignment, aggregation) returns
//! [`EvalError`] so callers can tell data-quality problems, which are skipped by
//! the batch drivers, apart from misconfiguration, which is always fatal.
//! Application plumbing above the core uses `anyhow` and can recover the typed
//! error with [`EvalError::classify`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the evaluation core
#[derive(Debug, Error)]
pub enum EvalError {
    /// A histogram record did not hold exactly two non-negative integers
    #[error("malformed histogram record in {path} at line {line}: {message}")]
    Format {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Zero-byte input, zero lines, zero total requests, or nothing to compare
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Sampling rate outside (0, 1) or not representable as an exact fraction
    #[error("invalid sampling rate: {0}")]
    Alignment(String),

    /// Referenced histogram file does not exist
    #[error("histogram not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EvalError {
    /// Whether a batch driver may log this error and skip the affected unit
    ///
    /// Alignment errors indicate an invalid configured rate and stop the
    /// command when the rate is parsed. Other I/O errors count as unit failures.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EvalError::Format { .. } | EvalError::EmptyInput(_) | EvalError::MissingFile(_)
        )
    }

    /// Find the core error inside an `anyhow` chain, if there is one
    pub fn classify(err: &anyhow::Error) -> Option<&EvalError> {
        err.chain().find_map(|cause| cause.downcast_ref::<EvalError>())
    }
}

/// Result type for the evaluation core
pub type EvalResult<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_recoverable_classes() {
        assert!(EvalError::EmptyInput("x".into()).is_recoverable());
        assert!(EvalError::MissingFile(PathBuf::from("/nope")).is_recoverable());
        assert!(EvalError::Format {
            path: PathBuf::from("h.csv"),
            line: 3,
            message: "bad".into(),
        }
        .is_recoverable());
        assert!(!EvalError::Alignment("1.5".into()).is_recoverable());
    }

    #[test]
    fn test_classify_through_context() {
        let result: anyhow::Result<()> = Err(EvalError::Alignment("0".into()))
            .context("loading batch configuration");
        let err = result.unwrap_err();
        let core = EvalError::classify(&err).expect("core error in chain");
        assert!(matches!(core, EvalError::Alignment(_)));
    }

    #[test]
    fn test_format_message_names_line() {
        let err = EvalError::Format {
            path: PathBuf::from("w1.csv"),
            line: 7,
            message: "expected two fields".into(),
        };
        let text = err.to_string();
        assert!(text.contains("w1.csv"));
        assert!(text.contains("line 7"));
    }
}
