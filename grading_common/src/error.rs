//! Typed failures for the grading core.

use thiserror::Error;

/// Errors reported before any pixel work begins. Everything past input and
/// threshold validation is a pure computation and cannot fail.
#[derive(Debug, Error)]
pub enum GradeError {
    /// The input image was missing or could not be decoded.
    #[error("image not found or the path is incorrect: {0}")]
    ImageNotFound(String),
    /// Band thresholds were out of range or not strictly increasing.
    #[error("invalid thresholds: {0}")]
    InvalidThreshold(String),
}
