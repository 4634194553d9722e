//! Single-band GeoTIFF encoding and decoding.
//!
//! Only the small subset of GeoTIFF needed for regular latitude/longitude
//! rasters is handled: `ModelPixelScale` + `ModelTiepoint` for the affine
//! transform, the EPSG code from the `GeoKeyDirectory`, and the GDAL nodata
//! tag.

use std::fs::File;
use std::io::{BufReader, Seek, Write};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tiff::ColorType;

use raster_common::{Axis, AxisKind, Crs, Grid};

use crate::error::{StorageError, StorageResult};

const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const RASTER_PIXEL_IS_POINT: u16 = 2;

/// Affine placement of a north-up raster.
///
/// `origin_x`/`origin_y` are the outer corner of the upper-left pixel;
/// pixel sizes are positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub crs: Crs,
}

impl GeoTransform {
    /// Transform whose pixel centres sit on the grid's coordinates.
    pub fn for_grid(grid: &Grid) -> Self {
        let dx = grid.lon().spacing();
        let dy = grid.lat().spacing();
        Self {
            origin_x: grid.lon().min() - dx / 2.0,
            origin_y: grid.lat().max() + dy / 2.0,
            pixel_width: dx,
            pixel_height: dy,
            crs: grid.crs(),
        }
    }

    /// Longitude (or x) of each column centre, west to east.
    pub fn column_centres(&self, width: usize) -> Vec<f64> {
        (0..width)
            .map(|c| self.origin_x + (c as f64 + 0.5) * self.pixel_width)
            .collect()
    }

    /// Latitude (or y) of each row centre, north to south.
    pub fn row_centres(&self, height: usize) -> Vec<f64> {
        (0..height)
            .map(|r| self.origin_y - (r as f64 + 0.5) * self.pixel_height)
            .collect()
    }

    fn geo_keys(&self) -> Vec<u16> {
        let (model, crs_key) = if self.crs.is_geographic() {
            (MODEL_TYPE_GEOGRAPHIC, GEOGRAPHIC_TYPE)
        } else {
            (MODEL_TYPE_PROJECTED, PROJECTED_CS_TYPE)
        };
        vec![
            1, 1, 0, 3, // version 1.1.0, three keys
            GT_MODEL_TYPE, 0, 1, model,
            GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA,
            crs_key, 0, 1, self.crs.epsg(),
        ]
    }
}

/// Samples of a grid in north-up, west-to-east order.
pub fn north_up_samples(grid: &Grid) -> Vec<f32> {
    let (rows, cols) = grid.shape();
    let flip_rows = grid.lat().is_ascending();
    let flip_cols = !grid.lon().is_ascending();
    let data = grid.data();

    let mut out = Vec::with_capacity(data.len());
    for r in 0..rows {
        let src_r = if flip_rows { rows - 1 - r } else { r };
        let row = &data[src_r * cols..(src_r + 1) * cols];
        if flip_cols {
            out.extend(row.iter().rev());
        } else {
            out.extend_from_slice(row);
        }
    }
    out
}

/// Encode one band with geo-referencing tags.
pub fn encode_band<C, W>(
    writer: &mut W,
    transform: &GeoTransform,
    width: usize,
    height: usize,
    data: &[C::Inner],
    nodata: Option<&str>,
) -> StorageResult<()>
where
    C: colortype::ColorType,
    [C::Inner]: TiffValue,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer)?;
    let mut image = encoder.new_image::<C>(width as u32, height as u32)?;

    image.encoder().write_tag(
        Tag::ModelPixelScaleTag,
        &[transform.pixel_width, transform.pixel_height, 0.0][..],
    )?;
    image.encoder().write_tag(
        Tag::ModelTiepointTag,
        &[0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0][..],
    )?;
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, &transform.geo_keys()[..])?;
    if let Some(nodata) = nodata {
        image.encoder().write_tag(Tag::GdalNodata, nodata)?;
    }

    image.write_data(data)?;
    Ok(())
}

/// Write a grid as a 32-bit float GeoTIFF with NaN nodata.
pub fn write_grid<W: Write + Seek>(writer: &mut W, grid: &Grid) -> StorageResult<()> {
    let (rows, cols) = grid.shape();
    let samples = north_up_samples(grid);
    encode_band::<colortype::Gray32Float, _>(
        writer,
        &GeoTransform::for_grid(grid),
        cols,
        rows,
        &samples,
        Some("nan"),
    )
}

/// Write an 8-bit classification raster (1 = inside, 0 = outside).
///
/// `values` are row-major on the given axes; they are reordered north-up.
pub fn write_classification_raster(
    path: impl AsRef<Path>,
    lat: &Axis,
    lon: &Axis,
    values: &[u8],
    crs: Crs,
) -> StorageResult<()> {
    let as_float: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    let grid = Grid::new(lat.clone(), lon.clone(), as_float, crs)?;
    let samples: Vec<u8> = north_up_samples(&grid).into_iter().map(|v| v as u8).collect();

    let mut file = File::create(path.as_ref())?;
    encode_band::<colortype::Gray8, _>(
        &mut file,
        &GeoTransform::for_grid(&grid),
        lon.len(),
        lat.len(),
        &samples,
        None,
    )?;
    file.flush()?;
    Ok(())
}

/// A decoded single-band raster.
#[derive(Debug, Clone)]
pub struct SingleBand {
    pub width: usize,
    pub height: usize,
    /// Row-major, north-up.
    pub values: Vec<f64>,
    pub transform: GeoTransform,
    pub nodata: Option<f64>,
}

impl SingleBand {
    /// Cell-centre axes (latitude descending, longitude ascending).
    pub fn axes(&self) -> StorageResult<(Axis, Axis)> {
        let lat = Axis::new(AxisKind::Latitude, self.transform.row_centres(self.height))?;
        let lon = Axis::new(AxisKind::Longitude, self.transform.column_centres(self.width))?;
        Ok((lat, lon))
    }

    /// Decode into a float grid; nodata samples become NaN.
    pub fn to_grid(&self) -> StorageResult<Grid> {
        let (lat, lon) = self.axes()?;
        let data = self
            .values
            .iter()
            .map(|&v| match self.nodata {
                Some(nd) if v == nd => f32::NAN,
                _ => v as f32,
            })
            .collect();
        Ok(Grid::new(lat, lon, data, self.transform.crs)?)
    }
}

/// Read a single-band GeoTIFF of any integer or float sample type.
pub fn read_single_band(path: impl AsRef<Path>) -> StorageResult<SingleBand> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());

    match decoder.colortype()? {
        ColorType::Gray(_) => {}
        other => {
            return Err(StorageError::invalid_raster(
                path,
                format!("expected a single band, found {:?}", other),
            ))
        }
    }

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);

    let scale = decoder
        .find_tag(Tag::ModelPixelScaleTag)?
        .map(|v| v.into_f64_vec())
        .transpose()?
        .ok_or_else(|| StorageError::invalid_raster(path, "missing ModelPixelScale tag"))?;
    let tiepoint = decoder
        .find_tag(Tag::ModelTiepointTag)?
        .map(|v| v.into_f64_vec())
        .transpose()?
        .ok_or_else(|| StorageError::invalid_raster(path, "missing ModelTiepoint tag"))?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(StorageError::invalid_raster(path, "malformed geo-referencing tags"));
    }
    if tiepoint.len() > 6 {
        return Err(StorageError::invalid_raster(path, "multiple tiepoints are not supported"));
    }

    let keys = decoder
        .find_tag_unsigned_vec::<u16>(Tag::GeoKeyDirectoryTag)?
        .unwrap_or_default();
    let raster_type = geo_key(&keys, GT_RASTER_TYPE).unwrap_or(RASTER_PIXEL_IS_AREA);
    let epsg = geo_key(&keys, GEOGRAPHIC_TYPE)
        .or_else(|| geo_key(&keys, PROJECTED_CS_TYPE))
        .unwrap_or(Crs::WGS84.epsg());

    let (sx, sy) = (scale[0], scale[1].abs());
    let mut transform = GeoTransform {
        origin_x: tiepoint[3] - tiepoint[0] * sx,
        origin_y: tiepoint[4] + tiepoint[1] * sy,
        pixel_width: sx,
        pixel_height: sy,
        crs: Crs::from_epsg(epsg),
    };
    if raster_type == RASTER_PIXEL_IS_POINT {
        transform.origin_x -= sx / 2.0;
        transform.origin_y += sy / 2.0;
    }

    let nodata = match decoder.find_tag(Tag::GdalNodata)? {
        Some(v) => v
            .into_string()
            .ok()
            .and_then(|s| s.trim_matches(|c: char| c == '\0' || c.is_whitespace()).parse().ok()),
        None => None,
    };

    let values: Vec<f64> = match decoder.read_image()? {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
    };
    if values.len() != width * height {
        return Err(StorageError::invalid_raster(
            path,
            format!("expected {} samples, decoded {}", width * height, values.len()),
        ));
    }

    Ok(SingleBand {
        width,
        height,
        values,
        transform,
        nodata,
    })
}

/// Value of a short GeoKey stored inline in the directory.
fn geo_key(directory: &[u16], key: u16) -> Option<u16> {
    directory
        .get(4..)?
        .chunks_exact(4)
        .find(|entry| entry[0] == key && entry[1] == 0)
        .map(|entry| entry[3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ascending_grid() -> Grid {
        let lat = Axis::latitude(vec![10.0, 11.0]).unwrap();
        let lon = Axis::longitude(vec![0.0, 1.0, 2.0]).unwrap();
        Grid::new(lat, lon, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], Crs::WGS84).unwrap()
    }

    #[test]
    fn test_north_up_flips_ascending_latitude() {
        assert_eq!(
            north_up_samples(&ascending_grid()),
            vec![4.0, 5.0, 6.0, 1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn test_transform_edges() {
        let t = GeoTransform::for_grid(&ascending_grid());
        assert_eq!(t.origin_x, -0.5);
        assert_eq!(t.origin_y, 11.5);
        assert_eq!(t.column_centres(3), vec![0.0, 1.0, 2.0]);
        assert_eq!(t.row_centres(2), vec![11.0, 10.0]);
    }

    #[test]
    fn test_geo_keys_geographic() {
        let t = GeoTransform::for_grid(&ascending_grid());
        let keys = t.geo_keys();
        assert_eq!(geo_key(&keys, GT_MODEL_TYPE), Some(MODEL_TYPE_GEOGRAPHIC));
        assert_eq!(geo_key(&keys, GEOGRAPHIC_TYPE), Some(4326));
        assert_eq!(geo_key(&keys, PROJECTED_CS_TYPE), None);
    }

    #[test]
    fn test_encode_writes_tiff_header() {
        let mut buf = Cursor::new(Vec::new());
        write_grid(&mut buf, &ascending_grid()).unwrap();
        let bytes = buf.into_inner();
        assert!(bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*"));
    }
}
