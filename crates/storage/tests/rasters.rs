//! GeoTIFF files written by the pipeline read back with the same placement.

use chrono::NaiveDate;
use raster_common::{Axis, AxisKind, Crs, Grid, Statistic};
use storage::{
    load_region_mask, read_single_band, write_classification_raster, OutputKey, OutputLayout,
    RasterWriter,
};

#[test]
fn summary_raster_is_north_up_with_nan_nodata() {
    let dir = tempfile::tempdir().unwrap();
    let lat = Axis::latitude(vec![29.0, 29.5, 30.0]).unwrap();
    let lon = Axis::longitude(vec![78.0, 78.5]).unwrap();
    let grid = Grid::new(
        lat,
        lon,
        vec![1.0, 2.0, 3.0, f32::NAN, 5.0, 6.0],
        Crs::WGS84,
    )
    .unwrap();

    let writer = RasterWriter::new(OutputLayout::new(dir.path(), "tif"), true);
    let key = OutputKey::new("t2m", Statistic::Max, NaiveDate::from_ymd_opt(2021, 3, 5).unwrap());
    let outcome = writer.write(&key, &grid).unwrap();

    let band = read_single_band(outcome.path()).unwrap();
    assert_eq!((band.width, band.height), (2, 3));
    assert!(band.nodata.unwrap().is_nan());
    assert_eq!(band.transform.crs, Crs::WGS84);

    let (lat, lon) = band.axes().unwrap();
    assert!(!lat.is_ascending());
    assert!((lat.first() - 30.0).abs() < 1e-9);
    assert!((lat.last() - 29.0).abs() < 1e-9);
    assert!((lon.first() - 78.0).abs() < 1e-9);

    // Northernmost row first.
    assert_eq!(band.values[0], 5.0);
    assert_eq!(band.values[1], 6.0);
    assert!(band.values[3].is_nan());
    assert_eq!(band.values[4], 1.0);
}

#[test]
fn classification_raster_loads_as_mask() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("region.tif");
    let lat = Axis::linspace(AxisKind::Latitude, 31.0, 30.0, 3).unwrap();
    let lon = Axis::linspace(AxisKind::Longitude, 78.0, 79.5, 4).unwrap();
    let values = [0, 1, 1, 0, 1, 1, 1, 1, 0, 0, 1, 0];
    write_classification_raster(&path, &lat, &lon, &values, Crs::WGS84).unwrap();

    let mask = load_region_mask(&path).unwrap();
    assert_eq!(mask.shape(), (3, 4));
    assert_eq!(mask.inside_count(), 7);
    assert!(mask.contains(0, 1));
    assert!(!mask.contains(2, 3));
    assert!(mask.matches_axes(&lat, &lon));
}

#[test]
fn missing_mask_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_region_mask(dir.path().join("nope.tif")).is_err());
}

#[test]
fn plain_tiff_without_georeferencing_is_rejected() {
    use tiff::encoder::{colortype, TiffEncoder};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.tif");
    let mut file = std::fs::File::create(&path).unwrap();
    TiffEncoder::new(&mut file)
        .unwrap()
        .write_image::<colortype::Gray8>(2, 2, &[0, 1, 1, 0])
        .unwrap();

    match read_single_band(&path) {
        Err(storage::StorageError::InvalidRaster { .. }) => {}
        other => panic!("expected InvalidRaster, got {:?}", other.map(|b| b.width)),
    }
}
