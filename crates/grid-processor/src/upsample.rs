//! Coordinate-linear upsampling of regular grids.
//!
//! The output axes keep the input endpoints and insert `factor - 1` evenly
//! spaced coordinates between every pair of neighbours, so an axis of `n`
//! points becomes `factor * (n - 1) + 1` points. Values are interpolated
//! separably: first along longitude for every input row, then along latitude.
//! Original sample locations pass through unchanged.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use raster_common::{Axis, Grid};

use crate::error::{GridProcessorError, Result};

/// Fractions this close to a node snap onto it.
const SNAP_EPS: f64 = 1e-9;

/// Integer refinement factors per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsampleFactors {
    pub lat: usize,
    pub lon: usize,
}

impl UpsampleFactors {
    pub fn uniform(factor: usize) -> Self {
        Self {
            lat: factor,
            lon: factor,
        }
    }

    /// `round(native / desired)` on both axes; ratios at or below one give
    /// the identity.
    pub fn from_resolutions(native: f64, desired: f64) -> Self {
        let ratio = (native / desired).round();
        if !ratio.is_finite() || ratio <= 1.0 {
            return Self::uniform(1);
        }
        Self::uniform(ratio as usize)
    }

    pub fn is_identity(&self) -> bool {
        self.lat <= 1 && self.lon <= 1
    }
}

/// Linear weight from source index `i0` (weight `1 - w`) and `i1` (weight `w`).
#[derive(Debug, Clone, Copy, PartialEq)]
struct Tap {
    i0: usize,
    i1: usize,
    w: f64,
}

impl Tap {
    #[inline]
    fn apply(&self, a: f32, b: f32) -> f32 {
        if self.w == 0.0 {
            a
        } else {
            ((1.0 - self.w) * a as f64 + self.w * b as f64) as f32
        }
    }
}

/// Refine one axis by `factor`.
pub fn upsample_axis(axis: &Axis, factor: usize) -> Result<Axis> {
    if factor == 0 {
        return Err(GridProcessorError::invalid_factor("factor must be at least 1"));
    }
    if factor == 1 {
        return Ok(axis.clone());
    }
    let len = factor * (axis.len() - 1) + 1;
    Ok(Axis::linspace(axis.kind(), axis.first(), axis.last(), len)?)
}

fn taps(source: &Axis, target: &Axis) -> Vec<Tap> {
    let last = source.len() - 1;
    target
        .values()
        .iter()
        .map(|&x| {
            let (i, frac) = source.locate(x).unwrap_or((last, 0.0));
            if frac < SNAP_EPS || i == last {
                Tap { i0: i, i1: i, w: 0.0 }
            } else if frac > 1.0 - SNAP_EPS {
                Tap {
                    i0: i + 1,
                    i1: i + 1,
                    w: 0.0,
                }
            } else {
                Tap {
                    i0: i,
                    i1: i + 1,
                    w: frac,
                }
            }
        })
        .collect()
}

/// Upsample a grid by integer factors along latitude and longitude.
///
/// Factors of one on both axes return an identical copy. A missing input
/// sample only affects output cells that give it non-zero weight.
pub fn upsample(grid: &Grid, lat_factor: usize, lon_factor: usize) -> Result<Grid> {
    if lat_factor == 0 || lon_factor == 0 {
        return Err(GridProcessorError::invalid_factor(format!(
            "{}x{}",
            lat_factor, lon_factor
        )));
    }
    if lat_factor == 1 && lon_factor == 1 {
        return Ok(grid.clone());
    }

    let lat = upsample_axis(grid.lat(), lat_factor)?;
    let lon = upsample_axis(grid.lon(), lon_factor)?;
    let (rows, cols) = grid.shape();
    let out_rows = lat.len();
    let out_cols = lon.len();

    let col_taps = taps(grid.lon(), &lon);
    let row_taps = taps(grid.lat(), &lat);
    let src = grid.data();

    // Longitude pass: rows x out_cols.
    let mut wide = vec![0.0f32; rows * out_cols];
    wide.par_chunks_mut(out_cols)
        .enumerate()
        .for_each(|(r, out)| {
            let row = &src[r * cols..(r + 1) * cols];
            for (o, tap) in out.iter_mut().zip(&col_taps) {
                *o = tap.apply(row[tap.i0], row[tap.i1]);
            }
        });

    // Latitude pass: out_rows x out_cols.
    let mut data = vec![0.0f32; out_rows * out_cols];
    data.par_chunks_mut(out_cols)
        .zip(row_taps.par_iter())
        .for_each(|(out, tap)| {
            let a = &wide[tap.i0 * out_cols..(tap.i0 + 1) * out_cols];
            let b = &wide[tap.i1 * out_cols..(tap.i1 + 1) * out_cols];
            for ((o, &va), &vb) in out.iter_mut().zip(a).zip(b) {
                *o = tap.apply(va, vb);
            }
        });

    debug!(
        from = ?(rows, cols),
        to = ?(out_rows, out_cols),
        "Upsampled grid"
    );

    Ok(Grid::new(lat, lon, data, grid.crs())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::{AxisKind, Crs, MISSING};
    use test_utils::{assert_approx_eq, create_test_grid, regular_axis};

    fn grid_3x3() -> Grid {
        let lat = Axis::latitude(vec![30.2, 30.1, 30.0]).unwrap();
        let lon = Axis::longitude(vec![78.0, 78.1, 78.2]).unwrap();
        Grid::new(lat, lon, (0..9).map(|v| v as f32).collect(), Crs::WGS84).unwrap()
    }

    #[test]
    fn test_factors_from_resolutions() {
        assert_eq!(UpsampleFactors::from_resolutions(9000.0, 500.0), UpsampleFactors::uniform(18));
        assert!(UpsampleFactors::from_resolutions(9000.0, 9000.0).is_identity());
        assert!(UpsampleFactors::from_resolutions(500.0, 9000.0).is_identity());
        assert_eq!(UpsampleFactors::from_resolutions(9000.0, 4000.0).lat, 2);
    }

    #[test]
    fn test_factor_one_is_identity() {
        let grid = grid_3x3();
        let out = upsample(&grid, 1, 1).unwrap();
        assert!(out.identical(&grid));
    }

    #[test]
    fn test_zero_factor_rejected() {
        assert!(upsample(&grid_3x3(), 0, 2).is_err());
    }

    #[test]
    fn test_endpoints_and_shape() {
        let grid = grid_3x3();
        for factor in [2, 3, 18] {
            let out = upsample(&grid, factor, factor).unwrap();
            assert_eq!(out.shape(), (2 * factor + 1, 2 * factor + 1));
            assert_eq!(out.lat().first(), grid.lat().first());
            assert_eq!(out.lat().last(), grid.lat().last());
            assert_eq!(out.lon().first(), grid.lon().first());
            assert_eq!(out.lon().last(), grid.lon().last());
        }
    }

    #[test]
    fn test_original_samples_pass_through() {
        let grid = grid_3x3();
        let f = 4;
        let out = upsample(&grid, f, f).unwrap();
        for r in 0..3 {
            for c in 0..3 {
                assert_eq!(out.get(r * f, c * f), grid.get(r, c));
            }
        }
    }

    #[test]
    fn test_rows_and_columns_interpolate_independently() {
        let lat = regular_axis(AxisKind::Latitude, 30.0, -0.5, 3);
        let lon = regular_axis(AxisKind::Longitude, 78.0, 0.5, 2);
        // cell = col * 1000 + row
        let grid = create_test_grid(&lat, &lon);
        let out = upsample(&grid, 4, 2).unwrap();
        assert_eq!(out.shape(), (9, 3));
        assert_approx_eq!(out.get(2, 0).unwrap(), 0.5, 1e-4);
        assert_approx_eq!(out.get(0, 1).unwrap(), 500.0, 1e-3);
        assert_approx_eq!(out.get(6, 2).unwrap(), 1001.5, 1e-3);
    }

    #[test]
    fn test_bilinear_midpoint() {
        let grid = grid_3x3();
        let out = upsample(&grid, 2, 2).unwrap();
        // centre of cells (0,0),(0,1),(1,0),(1,1) = mean(0,1,3,4)
        assert_approx_eq!(out.get(1, 1).unwrap(), 2.0, 1e-5);
        // halfway along the first row
        assert_approx_eq!(out.get(0, 3).unwrap(), 1.5, 1e-5);
    }

    #[test]
    fn test_missing_spreads_only_to_neighbours() {
        let mut grid = grid_3x3();
        grid.data_mut()[0] = MISSING;
        let out = upsample(&grid, 2, 2).unwrap();
        assert!(out.get(0, 0).unwrap().is_nan());
        assert!(out.get(0, 1).unwrap().is_nan());
        assert!(out.get(1, 1).unwrap().is_nan());
        assert_eq!(out.get(0, 2), Some(1.0));
        assert_eq!(out.get(2, 2), Some(4.0));
        assert!(!out.get(4, 4).unwrap().is_nan());
    }

    #[test]
    fn test_ascending_latitude() {
        let lat = Axis::latitude(vec![10.0, 11.0]).unwrap();
        let lon = Axis::longitude(vec![0.0, 1.0]).unwrap();
        let grid = Grid::new(lat, lon, vec![0.0, 0.0, 10.0, 10.0], Crs::WGS84).unwrap();
        let out = upsample(&grid, 10, 1).unwrap();
        assert_approx_eq!(out.get(3, 0).unwrap(), 3.0, 1e-4);
        assert_eq!(out.lat().values()[10], 11.0);
    }
}
