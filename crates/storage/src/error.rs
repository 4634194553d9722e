//! Error types for raster storage.

use std::path::PathBuf;
use thiserror::Error;

use raster_common::GridError;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// File is a TIFF but not a usable single-band geo-referenced raster.
    #[error("invalid raster {}: {reason}", path.display())]
    InvalidRaster { path: PathBuf, reason: String },

    #[error("invalid grid: {0}")]
    Grid(#[from] GridError),
}

impl StorageError {
    pub(crate) fn invalid_raster(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidRaster {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<tempfile::PersistError> for StorageError {
    fn from(err: tempfile::PersistError) -> Self {
        Self::Io(err.error)
    }
}
