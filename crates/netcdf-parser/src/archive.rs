//! Hourly reanalysis archives stored as NetCDF.
//!
//! Every tracked variable is laid out as `(time, step, latitude, longitude)`:
//! one `time` entry per forecast reference day and one `step` per hourly
//! offset from it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument};

use raster_common::{Axis, BoundingBox, Crs};

use crate::cf_time::{CfTimeUnits, TimeUnit};
use crate::error::{ArchiveError, ArchiveResult};
use crate::native::{get_string_attr, read_f32, read_f64, silence_hdf5_errors, Packing};
use crate::series::VariableSeries;

const TIME_DIM: &str = "time";
const STEP_DIM: &str = "step";
const LAT_NAMES: [&str; 2] = ["latitude", "lat"];
const LON_NAMES: [&str; 2] = ["longitude", "lon"];

/// An open source archive with its decoded coordinate axes.
pub struct SourceArchive {
    path: PathBuf,
    file: netcdf::File,
    times: Vec<DateTime<Utc>>,
    steps: Vec<Duration>,
    lat_name: &'static str,
    lon_name: &'static str,
    lat: Axis,
    lon: Axis,
}

impl std::fmt::Debug for SourceArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceArchive")
            .field("path", &self.path)
            .field("times", &self.times.len())
            .field("steps", &self.steps.len())
            .field("shape", &(self.lat.len(), self.lon.len()))
            .finish()
    }
}

impl SourceArchive {
    /// Open an archive and decode its time, step and spatial axes.
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> ArchiveResult<Self> {
        let path = path.as_ref().to_path_buf();
        silence_hdf5_errors();

        let file = netcdf::open(&path).map_err(|e| ArchiveError::unsupported(&path, e))?;

        let times = read_times(&file, &path)?;
        let steps = read_steps(&file, &path)?;

        let (lat_name, lat_values) = read_coordinate(&file, &path, &LAT_NAMES)?;
        let (lon_name, lon_values) = read_coordinate(&file, &path, &LON_NAMES)?;
        let lat = Axis::latitude(lat_values)?;
        let lon = Axis::longitude(lon_values)?;

        debug!(
            times = times.len(),
            steps = steps.len(),
            rows = lat.len(),
            cols = lon.len(),
            "Opened archive"
        );

        Ok(Self {
            path,
            file,
            times,
            steps,
            lat_name,
            lon_name,
            lat,
            lon,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn steps(&self) -> &[Duration] {
        &self.steps
    }

    pub fn lat(&self) -> &Axis {
        &self.lat
    }

    pub fn lon(&self) -> &Axis {
        &self.lon
    }

    /// Reanalysis archives are on a regular latitude/longitude grid.
    pub fn crs(&self) -> Crs {
        Crs::WGS84
    }

    /// Extent of the cell centres.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.lon.min(), self.lat.min(), self.lon.max(), self.lat.max())
    }

    /// Names of all variables, coordinates included.
    pub fn variable_names(&self) -> Vec<String> {
        self.file.variables().map(|v| v.name()).collect()
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.file.variable(name).is_some()
    }

    /// Read a whole variable into memory, decoding packing and fill values.
    ///
    /// Fails with [`ArchiveError::VariableAbsent`] when the archive does not
    /// carry `name`.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub fn load_variable(&self, name: &str) -> ArchiveResult<VariableSeries> {
        let var = self
            .file
            .variable(name)
            .ok_or_else(|| ArchiveError::VariableAbsent {
                path: self.path.clone(),
                variable: name.to_string(),
            })?;

        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let expected = [TIME_DIM, STEP_DIM, self.lat_name, self.lon_name];
        if dims.len() != expected.len() || dims.iter().zip(expected).any(|(d, e)| d != e) {
            return Err(ArchiveError::UnexpectedLayout {
                variable: name.to_string(),
                dims,
            });
        }

        let mut values = read_f32(&var)
            .map_err(|e| ArchiveError::unsupported(&self.path, format!("reading {}: {}", name, e)))?;
        Packing::from_variable(&var).unpack(&mut values);

        debug!(variable = name, cells = values.len(), "Loaded variable");

        Ok(VariableSeries::new(
            name,
            self.times.clone(),
            self.steps.clone(),
            self.lat.clone(),
            self.lon.clone(),
            self.crs(),
            values,
        )?)
    }
}

fn read_times(file: &netcdf::File, path: &Path) -> ArchiveResult<Vec<DateTime<Utc>>> {
    let var = file
        .variable(TIME_DIM)
        .ok_or_else(|| ArchiveError::MissingData(format!("{} variable in {}", TIME_DIM, path.display())))?;
    let units = get_string_attr(&var, "units")
        .ok_or_else(|| ArchiveError::MissingData("time units attribute".to_string()))?;
    let units = CfTimeUnits::parse(&units)?;

    let raw = read_f64(&var)
        .map_err(|e| ArchiveError::unsupported(path, format!("reading time: {}", e)))?;
    raw.into_iter().map(|v| units.decode(v)).collect()
}

/// Step offsets; a missing coordinate variable means hourly steps 1..=n.
fn read_steps(file: &netcdf::File, path: &Path) -> ArchiveResult<Vec<Duration>> {
    let len = file
        .dimension(STEP_DIM)
        .ok_or_else(|| ArchiveError::MissingData(format!("{} dimension in {}", STEP_DIM, path.display())))?
        .len();

    let Some(var) = file.variable(STEP_DIM) else {
        return Ok((1..=len as i64).map(Duration::hours).collect());
    };

    let unit = match get_string_attr(&var, "units") {
        Some(u) => TimeUnit::parse(&u)?,
        None => TimeUnit::Hours,
    };
    let raw = read_f64(&var)
        .map_err(|e| ArchiveError::unsupported(path, format!("reading step: {}", e)))?;
    raw.into_iter().map(|v| unit.to_duration(v)).collect()
}

fn read_coordinate(
    file: &netcdf::File,
    path: &Path,
    names: &[&'static str],
) -> ArchiveResult<(&'static str, Vec<f64>)> {
    for &name in names {
        if let Some(var) = file.variable(name) {
            let values = read_f64(&var)
                .map_err(|e| ArchiveError::unsupported(path, format!("reading {}: {}", name, e)))?;
            return Ok((name, values));
        }
    }
    Err(ArchiveError::MissingData(format!(
        "coordinate {} in {}",
        names.join("/"),
        path.display()
    )))
}
