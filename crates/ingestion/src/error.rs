//! Error types for the ingestion crate.

use thiserror::Error;

use grid_processor::GridProcessorError;
use netcdf_parser::ArchiveError;
use storage::StorageError;

/// Errors that can occur during a pipeline run.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to scan source directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read archive: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Grid processing failed: {0}")]
    Processing(#[from] GridProcessorError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("Failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

impl IngestionError {
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;
