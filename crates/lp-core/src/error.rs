//! Error types for the streaming indicator pipeline.
//!
//! Per §7 of the specification, only *structural* problems are errors.
//! Numerical under-fill (not enough bars yet for a valid output) is never
//! an error — it is the value `f64::NAN`. This module therefore has no
//! "insufficient data" variant at all; see [`crate::indicator`] for how
//! warm-up is represented.

use thiserror::Error;

/// Error type for all fallible pipeline operations.
///
/// All three variants are raised at construction time (or, for
/// [`PipelineError::AccessOutOfRange`], at the first out-of-contract call)
/// and never mid-stream once a node has been accepted into a [`crate::Pipeline`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Invalid parameters, a missing required input line, or a dependency
    /// index that does not (yet) exist in the pipeline arena.
    #[error("construction error: {0}")]
    Construction(String),

    /// A caller tried to `set` a line at a strictly positive `ago`, which
    /// would mean writing to a bar that has not happened yet.
    #[error("access out of range: ago={ago} must be <= 0")]
    AccessOutOfRange {
        /// The offending offset.
        ago: i64,
    },

    /// An OHLC-consuming indicator was given a feed or collection that does
    /// not carry the lines it needs.
    #[error("input shape mismatch: {0}")]
    InputShapeMismatch(String),
}

impl PipelineError {
    /// Builds a [`PipelineError::Construction`] from any displayable message.
    pub fn construction<S: Into<String>>(message: S) -> Self {
        PipelineError::Construction(message.into())
    }

    /// Builds a [`PipelineError::InputShapeMismatch`] from any displayable message.
    pub fn input_shape_mismatch<S: Into<String>>(message: S) -> Self {
        PipelineError::InputShapeMismatch(message.into())
    }

    /// Validates that `period` is a positive window size, returning a
    /// [`PipelineError::Construction`] otherwise. Shared by every windowed
    /// indicator constructor so the rejection message stays consistent.
    pub fn require_positive_period(period: usize, who: &str) -> Result<()> {
        if period == 0 {
            Err(PipelineError::construction(format!(
                "{who}: period must be >= 1, got 0"
            )))
        } else {
            Ok(())
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_error_message() {
        let err = PipelineError::construction("period must be positive");
        assert_eq!(
            err.to_string(),
            "construction error: period must be positive"
        );
    }

    #[test]
    fn access_out_of_range_message() {
        let err = PipelineError::AccessOutOfRange { ago: 3 };
        assert_eq!(err.to_string(), "access out of range: ago=3 must be <= 0");
    }

    #[test]
    fn require_positive_period_rejects_zero() {
        assert!(PipelineError::require_positive_period(0, "sma").is_err());
        assert!(PipelineError::require_positive_period(1, "sma").is_ok());
    }
}
