//! Boolean region masks over a grid.

use crate::{Axis, AxisKind, BoundingBox, Crs, GridError, GridResult};

/// Relative tolerance used when deciding two axes are the same.
pub const AXIS_REL_TOL: f64 = 1e-6;

/// Cells inside/outside a region, on explicit coordinate axes.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMask {
    lat: Axis,
    lon: Axis,
    inside: Vec<bool>,
    crs: Crs,
}

impl RegionMask {
    pub fn new(lat: Axis, lon: Axis, inside: Vec<bool>, crs: Crs) -> GridResult<Self> {
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
        if inside.len() != lat.len() * lon.len() {
            return Err(GridError::ShapeMismatch {
                rows: lat.len(),
                cols: lon.len(),
                actual: inside.len(),
            });
        }
        Ok(Self {
            lat,
            lon,
            inside,
            crs,
        })
    }

    /// Build a mask from classification samples.
    ///
    /// A cell is inside when its value is non-zero, not NaN and not the
    /// raster's nodata value.
    pub fn from_classification(
        lat: Axis,
        lon: Axis,
        values: &[f64],
        nodata: Option<f64>,
        crs: Crs,
    ) -> GridResult<Self> {
        let inside = values
            .iter()
            .map(|&v| v != 0.0 && !v.is_nan() && nodata.map_or(true, |nd| v != nd))
            .collect();
        Self::new(lat, lon, inside, crs)
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

    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    pub fn cells(&self) -> &[bool] {
        &self.inside
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.lat.len() && col < self.lon.len() && self.inside[row * self.lon.len() + col]
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.lon.min(), self.lat.min(), self.lon.max(), self.lat.max())
    }

    pub fn inside_count(&self) -> usize {
        self.inside.iter().filter(|&&b| b).count()
    }

    /// True when this mask is defined on (approximately) the given axes.
    pub fn matches_axes(&self, lat: &Axis, lon: &Axis) -> bool {
        self.lat.approx_eq(lat, AXIS_REL_TOL) && self.lon.approx_eq(lon, AXIS_REL_TOL)
    }

    /// Resample the mask onto other axes by nearest coordinate.
    ///
    /// A target coordinate more than half a mask cell away from every mask
    /// coordinate falls outside. Returns a clone when the axes already match.
    pub fn align_to(&self, lat: &Axis, lon: &Axis) -> GridResult<Self> {
        if self.matches_axes(lat, lon) {
            return Ok(self.clone());
        }

        let rows = nearest_indices(&self.lat, lat);
        let cols = nearest_indices(&self.lon, lon);

        let mut inside = Vec::with_capacity(rows.len() * cols.len());
        for row in &rows {
            for col in &cols {
                let hit = match (row, col) {
                    (Some(r), Some(c)) => self.inside[r * self.lon.len() + c],
                    _ => false,
                };
                inside.push(hit);
            }
        }

        Self::new(lat.clone(), lon.clone(), inside, self.crs)
    }
}

fn nearest_indices(source: &Axis, target: &Axis) -> Vec<Option<usize>> {
    let half = source.spacing() * (0.5 + AXIS_REL_TOL);
    target
        .values()
        .iter()
        .map(|&x| {
            let (idx, dist) = source.nearest(x);
            (dist <= half).then_some(idx)
        })
        .collect()
}
