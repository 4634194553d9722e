//! Grid processing for the daily reanalysis pipeline.
//!
//! Each day of a variable flows through three stages:
//!
//! ```text
//! native step grids
//!      │
//!      ▼
//! upsample(grid, lat_factor, lon_factor)   coordinate-linear refinement
//!      │
//!      ▼
//! clip(grid, &mask)                        cells outside the region -> NaN
//!      │
//!      ▼
//! DailyAggregator::push / finish           min, max (and sum) per day
//! ```

pub mod aggregate;
pub mod clip;
pub mod error;
pub mod upsample;

// Re-export commonly used types at crate root
pub use aggregate::{aggregate, AggregationOptions, DailyAggregator, DailySummary};
pub use clip::{align_mask, clip, clip_in_place, ensure_same_axis};
pub use error::{GridProcessorError, Result};
pub use upsample::{upsample, upsample_axis, UpsampleFactors};
