//! Coordinate-labelled 2-D grids.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{BoundingBox, Crs, GridError, GridResult};

/// Missing-value sentinel for grid samples.
pub const MISSING: f32 = f32::NAN;

/// Which spatial dimension an axis labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    Latitude,
    Longitude,
}

impl AxisKind {
    pub fn name(&self) -> &'static str {
        match self {
            AxisKind::Latitude => "latitude",
            AxisKind::Longitude => "longitude",
        }
    }
}

impl fmt::Display for AxisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An ordered coordinate axis.
///
/// Invariants: at least two values, all finite, strictly monotonic
/// (ascending or descending).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    kind: AxisKind,
    values: Vec<f64>,
}

impl Axis {
    /// Create an axis, validating its invariants.
    pub fn new(kind: AxisKind, values: Vec<f64>) -> GridResult<Self> {
        if values.len() < 2 {
            return Err(GridError::invalid_axis(
                kind,
                format!("needs at least 2 coordinates, got {}", values.len()),
            ));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(GridError::invalid_axis(
                kind,
                format!("non-finite coordinate {}", bad),
            ));
        }

        let ascending = values[1] > values[0];
        let monotonic = values.windows(2).all(|w| {
            if ascending {
                w[1] > w[0]
            } else {
                w[1] < w[0]
            }
        });
        if !monotonic {
            return Err(GridError::invalid_axis(kind, "not strictly monotonic"));
        }

        Ok(Self { kind, values })
    }

    pub fn latitude(values: Vec<f64>) -> GridResult<Self> {
        Self::new(AxisKind::Latitude, values)
    }

    pub fn longitude(values: Vec<f64>) -> GridResult<Self> {
        Self::new(AxisKind::Longitude, values)
    }

    /// Evenly spaced axis from `first` to `last` inclusive.
    ///
    /// The endpoints are stored exactly as given.
    pub fn linspace(kind: AxisKind, first: f64, last: f64, len: usize) -> GridResult<Self> {
        if len < 2 {
            return Err(GridError::invalid_axis(
                kind,
                format!("needs at least 2 coordinates, got {}", len),
            ));
        }
        let span = last - first;
        let denom = (len - 1) as f64;
        let mut values: Vec<f64> = (0..len).map(|k| first + span * (k as f64 / denom)).collect();
        values[len - 1] = last;
        Self::new(kind, values)
    }

    pub fn kind(&self) -> AxisKind {
        self.kind
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; an axis holds at least two coordinates.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> f64 {
        self.values[0]
    }

    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    pub fn is_ascending(&self) -> bool {
        self.values[1] > self.values[0]
    }

    pub fn min(&self) -> f64 {
        self.first().min(self.last())
    }

    pub fn max(&self) -> f64 {
        self.first().max(self.last())
    }

    /// Mean absolute spacing between neighbouring coordinates.
    pub fn spacing(&self) -> f64 {
        (self.last() - self.first()).abs() / (self.len() - 1) as f64
    }

    /// Compare two axes coordinate by coordinate.
    ///
    /// `rel_tol` is relative to this axis' spacing.
    pub fn approx_eq(&self, other: &Axis, rel_tol: f64) -> bool {
        if self.kind != other.kind || self.len() != other.len() {
            return false;
        }
        let tol = self.spacing() * rel_tol;
        self.values
            .iter()
            .zip(&other.values)
            .all(|(a, b)| (a - b).abs() <= tol)
    }

    /// Locate `x` within the axis.
    ///
    /// Returns `(i, frac)` such that `x = c[i] + frac * (c[i + 1] - c[i])`
    /// with `0 <= frac < 1`, or `(n - 1, 0.0)` for the last coordinate.
    /// Returns `None` when `x` is outside the axis range.
    pub fn locate(&self, x: f64) -> Option<(usize, f64)> {
        let n = self.len();
        if x < self.min() || x > self.max() {
            return None;
        }

        // Index of the first coordinate that lies strictly past x.
        let past = if self.is_ascending() {
            self.values.partition_point(|&c| c <= x)
        } else {
            self.values.partition_point(|&c| c >= x)
        };

        if past >= n {
            return Some((n - 1, 0.0));
        }
        let i = past.saturating_sub(1);
        let lo = self.values[i];
        let hi = self.values[i + 1];
        Some((i, (x - lo) / (hi - lo)))
    }

    /// Index of the coordinate nearest to `x`, with its absolute distance.
    pub fn nearest(&self, x: f64) -> (usize, f64) {
        let n = self.len();
        let clamped = x.clamp(self.min(), self.max());
        let (i, frac) = self.locate(clamped).unwrap_or((n - 1, 0.0));
        let idx = if frac > 0.5 && i + 1 < n { i + 1 } else { i };
        (idx, (self.values[idx] - x).abs())
    }
}

/// A 2-D field of samples over latitude rows and longitude columns.
///
/// Data is stored row-major: `data[row * lon.len() + col]`.
#[derive(Debug, Clone)]
pub struct Grid {
    lat: Axis,
    lon: Axis,
    data: Vec<f32>,
    crs: Crs,
}

impl Grid {
    /// Create a grid, checking axis kinds and data length.
    pub fn new(lat: Axis, lon: Axis, data: Vec<f32>, crs: Crs) -> GridResult<Self> {
        if lat.kind() != AxisKind::Latitude {
            return Err(GridError::WrongAxisKind {
                expected: AxisKind::Latitude,
                actual: lat.kind(),
            });
        }
        if lon.kind() != AxisKind::Longitude {
            return Err(GridError::WrongAxisKind {
                expected: AxisKind::Longitude,
                actual: lon.kind(),
            });
        }
        if data.len() != lat.len() * lon.len() {
            return Err(GridError::ShapeMismatch {
                rows: lat.len(),
                cols: lon.len(),
                actual: data.len(),
            });
        }
        Ok(Self {
            lat,
            lon,
            data,
            crs,
        })
    }

    /// Grid with every cell set to `value`.
    pub fn filled(lat: Axis, lon: Axis, value: f32, crs: Crs) -> GridResult<Self> {
        let len = lat.len() * lon.len();
        Self::new(lat, lon, vec![value; len], crs)
    }

    /// New grid on the same axes and CRS carrying different samples.
    pub fn with_data(&self, data: Vec<f32>) -> GridResult<Self> {
        Self::new(self.lat.clone(), self.lon.clone(), data, self.crs)
    }

    pub fn lat(&self) -> &Axis {
        &self.lat
    }

    pub fn lon(&self) -> &Axis {
        &self.lon
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.lat.len() || col >= self.lon.len() {
            return None;
        }
        Some(self.data[row * self.lon.len() + col])
    }

    /// Number of non-missing cells.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    /// True when both grids have identical axes.
    pub fn same_axes(&self, other: &Grid) -> bool {
        self.lat == other.lat && self.lon == other.lon
    }

    /// Sample-for-sample equality that treats two missing cells as equal.
    pub fn identical(&self, other: &Grid) -> bool {
        self.same_axes(other)
            && self.crs == other.crs
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()))
    }

    /// Extent of the cell centres.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.lon.min(), self.lat.min(), self.lon.max(), self.lat.max())
    }
}
