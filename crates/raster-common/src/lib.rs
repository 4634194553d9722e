//! Common types shared across the reanalysis pipeline crates.
//!
//! The central type is [`Grid`]: a row-major 2-D field of `f32` samples
//! labelled by an explicit latitude [`Axis`] (rows) and longitude [`Axis`]
//! (columns). Missing cells carry [`MISSING`] (NaN).

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod mask;
pub mod variable;

pub use bbox::BoundingBox;
pub use crs::Crs;
pub use error::{GridError, GridResult};
pub use grid::{Axis, AxisKind, Grid, MISSING};
pub use mask::{RegionMask, AXIS_REL_TOL};
pub use variable::{Statistic, VariableKind};
