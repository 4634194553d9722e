//! Error types for grid construction.

use thiserror::Error;

use crate::AxisKind;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised when a grid or axis violates its invariants.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("invalid {axis} axis: {reason}")]
    InvalidAxis { axis: AxisKind, reason: String },

    #[error("expected {expected:?} axis, got {actual:?}")]
    WrongAxisKind { expected: AxisKind, actual: AxisKind },

    #[error("data length {actual} does not match grid shape ({rows} x {cols})")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        actual: usize,
    },

    #[error("invalid CRS: {0}")]
    InvalidCrs(String),
}

impl GridError {
    /// Create an InvalidAxis error.
    pub fn invalid_axis(axis: AxisKind, reason: impl Into<String>) -> Self {
        Self::InvalidAxis {
            axis,
            reason: reason.into(),
        }
    }
}
