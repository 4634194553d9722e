//! Reader for hourly reanalysis archives stored as NetCDF.
//!
//! An archive holds several variables over `(time, step, latitude, longitude)`.
//! [`SourceArchive`] decodes the axes once; [`SourceArchive::load_variable`]
//! pulls one variable into an owned [`VariableSeries`], which is then split
//! into per-day [`DailyGroup`]s without touching the file again.
//!
//! # System requirements
//!
//! Linking needs `libnetcdf` and `libhdf5` (`libhdf5-dev libnetcdf-dev`).

pub mod archive;
pub mod cf_time;
pub mod error;
pub mod native;
pub mod series;

pub use archive::SourceArchive;
pub use cf_time::{CfTimeUnits, TimeUnit};
pub use error::{ArchiveError, ArchiveResult};
pub use native::silence_hdf5_errors;
pub use series::{DailyGroup, VariableSeries};
