//! Synthetic grids and series with predictable values.

use raster_common::{Axis, AxisKind, Crs, Grid};

/// Regular axis of `len` coordinates starting at `first`, `step` apart.
///
/// # Example
///
/// ```
/// use raster_common::AxisKind;
/// use test_utils::regular_axis;
///
/// let lat = regular_axis(AxisKind::Latitude, 31.0, -0.5, 3);
/// assert_eq!(lat.values(), &[31.0, 30.5, 30.0]);
/// ```
pub fn regular_axis(kind: AxisKind, first: f64, step: f64, len: usize) -> Axis {
    let last = first + step * (len - 1) as f64;
    Axis::linspace(kind, first, last, len).expect("regular axis")
}

/// WGS84 grid whose cell `(row, col)` holds `f(row, col)`.
pub fn grid_from_fn(lat: &Axis, lon: &Axis, f: impl Fn(usize, usize) -> f32) -> Grid {
    let mut data = Vec::with_capacity(lat.len() * lon.len());
    for row in 0..lat.len() {
        for col in 0..lon.len() {
            data.push(f(row, col));
        }
    }
    Grid::new(lat.clone(), lon.clone(), data, Crs::WGS84).expect("grid shape")
}

/// Creates a test grid where each cell is `col * 1000 + row`.
///
/// This makes it easy to verify that data is being read/written correctly.
pub fn create_test_grid(lat: &Axis, lon: &Axis) -> Grid {
    grid_from_fn(lat, lon, |row, col| (col * 1000 + row) as f32)
}

/// Temperature-like values in Kelvin, warmer towards the south-east.
pub fn create_temperature_grid(lat: &Axis, lon: &Axis, hour: usize) -> Grid {
    let rows = lat.len().max(1) as f32;
    let cols = lon.len().max(1) as f32;
    let diurnal = ((hour as f32 - 14.0) / 24.0 * std::f32::consts::TAU).cos() * 5.0;
    grid_from_fn(lat, lon, |row, col| {
        250.0 + (col as f32 / cols) * 30.0 + (row as f32 / rows) * 30.0 + diurnal
    })
}

/// Grid of `value` with NaN at the given `(row, col)` positions.
pub fn create_grid_with_nans(
    lat: &Axis,
    lon: &Axis,
    value: f32,
    nan_positions: &[(usize, usize)],
) -> Grid {
    grid_from_fn(lat, lon, |row, col| {
        if nan_positions.contains(&(row, col)) {
            f32::NAN
        } else {
            value
        }
    })
}

/// Running totals of `increments`, as an accumulating variable stores them.
///
/// ```
/// use test_utils::cumulative;
///
/// assert_eq!(cumulative(&[2.0, 3.0, 4.0, 0.0]), vec![2.0, 5.0, 9.0, 9.0]);
/// ```
pub fn cumulative(increments: &[f32]) -> Vec<f32> {
    increments
        .iter()
        .scan(0.0f32, |total, &inc| {
            *total += inc;
            Some(*total)
        })
        .collect()
}
