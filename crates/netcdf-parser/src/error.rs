//! Error types for archive reading.

use std::path::PathBuf;
use thiserror::Error;

use raster_common::GridError;

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Error types for reading gridded archives.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file could not be opened or parsed as an archive
    #[error("unsupported archive format {}: {reason}", path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    /// Missing required dimension, coordinate or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// The requested variable is not stored in this archive
    #[error("variable '{variable}' not present in {}", path.display())]
    VariableAbsent { path: PathBuf, variable: String },

    /// Variable has a layout other than (time, step, latitude, longitude)
    #[error("variable '{variable}' has unexpected dimensions {dims:?}")]
    UnexpectedLayout { variable: String, dims: Vec<String> },

    /// Time or step axis could not be decoded
    #[error("Invalid time axis: {0}")]
    InvalidTime(String),

    /// Coordinates violate grid invariants
    #[error("Invalid grid: {0}")]
    Grid(#[from] GridError),
}

impl ArchiveError {
    pub(crate) fn unsupported(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::UnsupportedFormat {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
