//! Region mask rasters for tests.

use std::path::Path;

use raster_common::{Axis, Crs};

/// Write a classification GeoTIFF on the given cell-centre axes, marking
/// `(row, col)` as inside when `inside` returns true.
pub fn write_mask_geotiff(
    path: impl AsRef<Path>,
    lat: &Axis,
    lon: &Axis,
    inside: impl Fn(usize, usize) -> bool,
) -> storage::StorageResult<()> {
    let mut values = Vec::with_capacity(lat.len() * lon.len());
    for row in 0..lat.len() {
        for col in 0..lon.len() {
            values.push(u8::from(inside(row, col)));
        }
    }
    storage::write_classification_raster(path, lat, lon, &values, Crs::WGS84)
}
