//! Error types for scene reasoning operations.
//!
//! Errors fall in two groups. Data and state errors mean a sample record
//! is malformed and are never retried. Parse and shape errors come from
//! decoding model-generated text; callers record the sample as invalid
//! and keep going.

use thiserror::Error;

/// Main error type for scene reasoning operations.
#[derive(Error, Debug)]
pub enum ReasoningError {
    /// A sample record violates a shape or content invariant.
    #[error("Data invariant violated: {0}")]
    DataInvariant(String),

    /// The classifier reached a state it cannot resolve.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A supervision target was requested for a record without ground truth.
    #[error("Missing ground truth: record has no `{field}`")]
    MissingGroundTruth { field: &'static str },

    /// Model output is not a literal sequence of numeric tuples.
    #[error("Parse error at byte {offset}: {message}")]
    Parse { message: String, offset: usize },

    /// Decoded trajectory does not have the expected shape.
    #[error(
        "Shape mismatch: expected {expected_rows}x{expected_cols}, got {actual_rows}x{actual_cols}"
    )]
    ShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization of an external contract failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for scene reasoning operations.
pub type Result<T> = std::result::Result<T, ReasoningError>;

impl ReasoningError {
    /// Create a data invariant error.
    #[must_use]
    pub fn data_invariant(msg: impl Into<String>) -> Self {
        Self::DataInvariant(msg.into())
    }

    /// Create an invalid state error.
    #[must_use]
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create a missing ground truth error.
    #[must_use]
    pub const fn missing_ground_truth(field: &'static str) -> Self {
        Self::MissingGroundTruth { field }
    }

    /// Create a parse error at the given byte offset.
    #[must_use]
    pub fn parse(msg: impl Into<String>, offset: usize) -> Self {
        Self::Parse {
            message: msg.into(),
            offset,
        }
    }

    /// Create a shape mismatch error.
    #[must_use]
    pub const fn shape_mismatch(expected: (usize, usize), actual: (usize, usize)) -> Self {
        Self::ShapeMismatch {
            expected_rows: expected.0,
            expected_cols: expected.1,
            actual_rows: actual.0,
            actual_cols: actual.1,
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether the error comes from decoding external text.
    ///
    /// Recoverable errors mark a single sample invalid; everything else
    /// should stop the batch.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::ShapeMismatch { .. })
    }
}
