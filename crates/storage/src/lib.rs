//! Raster storage for the daily reanalysis pipeline.
//!
//! Provides:
//! - Single-band GeoTIFF encoding/decoding ([`geotiff`])
//! - The `<variable>_<statistic>/<year>/<month>/` output layout ([`layout`])
//! - Atomic, resumable output writes ([`writer`])
//! - Region mask loading from a classification raster ([`mask`])

pub mod error;
pub mod geotiff;
pub mod layout;
pub mod mask;
pub mod writer;

pub use error::{StorageError, StorageResult};
pub use geotiff::{read_single_band, write_classification_raster, GeoTransform, SingleBand};
pub use layout::{OutputKey, OutputLayout};
pub use mask::load_region_mask;
pub use writer::{RasterWriter, WriteOutcome};
