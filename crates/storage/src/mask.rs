//! Region mask loading.

use std::path::Path;

use tracing::info;

use raster_common::RegionMask;

use crate::error::StorageResult;
use crate::geotiff::read_single_band;

/// Load a classification GeoTIFF as a region mask on its own cell centres.
pub fn load_region_mask(path: impl AsRef<Path>) -> StorageResult<RegionMask> {
    let path = path.as_ref();
    let band = read_single_band(path)?;
    let (lat, lon) = band.axes()?;
    let mask = RegionMask::from_classification(
        lat,
        lon,
        &band.values,
        band.nodata,
        band.transform.crs,
    )?;

    info!(
        path = %path.display(),
        rows = band.height,
        cols = band.width,
        inside = mask.inside_count(),
        crs = %mask.crs(),
        "Loaded region mask"
    );
    Ok(mask)
}
