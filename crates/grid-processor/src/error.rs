//! Error types for grid processing.

use raster_common::{AxisKind, GridError};
use thiserror::Error;

/// Errors that can occur during grid processing.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// Grid and mask (or two steps of one day) are not on the same axes.
    #[error("{axis} axis mismatch: {detail}")]
    AxisMismatch { axis: AxisKind, detail: String },

    /// A day produced no usable step.
    #[error("daily group has no usable steps ({steps} pushed)")]
    EmptyDailyGroup { steps: usize },

    /// Upsampling factor of zero.
    #[error("invalid upsampling factor: {0}")]
    InvalidFactor(String),

    /// Resulting grid violates grid invariants.
    #[error(transparent)]
    Grid(#[from] GridError),
}

impl GridProcessorError {
    /// Create an AxisMismatch error.
    pub fn axis_mismatch(axis: AxisKind, detail: impl Into<String>) -> Self {
        Self::AxisMismatch {
            axis,
            detail: detail.into(),
        }
    }

    /// Create an InvalidFactor error.
    pub fn invalid_factor(msg: impl Into<String>) -> Self {
        Self::InvalidFactor(msg.into())
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
