//! Daily summary pipeline for hourly reanalysis archives.
//!
//! Turns a directory of NetCDF archives into per-day GeoTIFF statistics
//! clipped to a region of interest.
//!
//! # Architecture
//!
//! This crate is driven by the `ingester` service. For each archive it:
//!
//! - Loads every tracked variable (`netcdf-parser`)
//! - Upsamples each hourly grid and clips it to the region mask (`grid-processor`)
//! - Aggregates the day into min/max, plus sum for accumulating variables
//! - Writes one GeoTIFF per statistic under the output layout (`storage`)
//! - Records skips and failures in a [`RunReport`]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;

// Re-exports
pub use config::PipelineConfig;
pub use error::{IngestionError, Result};
pub use pipeline::Pipeline;
pub use report::{DayOutcome, Issue, IssueKind, RunReport};
