//! Synthetic reanalysis archives.
//!
//! Writes NetCDF files with the `(time, step, latitude, longitude)` layout
//! read by `netcdf-parser`.
//!
//! # Example
//!
//! ```ignore
//! use test_utils::ArchiveBuilder;
//!
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("era5.nc");
//! ArchiveBuilder::new(vec![30.2, 30.1, 30.0], vec![78.0, 78.1, 78.2])
//!     .daily_times(chrono::NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(), 3)
//!     .hourly_steps(24)
//!     .variable_fn("t2m", |t, s, r, c| 280.0 + s as f32)
//!     .write(&path)?;
//! ```

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

/// CF epoch used for the `time` axis, as in ERA5 GRIB conversions.
pub const ERA5_TIME_UNITS: &str = "hours since 1900-01-01 00:00:00.0";

#[derive(Debug, Clone)]
enum Storage {
    Float,
    /// Stored as i16 with `scale_factor`, `add_offset` and `_FillValue`.
    Packed { scale: f64, offset: f64, fill: i16 },
}

#[derive(Debug, Clone)]
struct VariableSpec {
    name: String,
    values: Vec<f32>,
    storage: Storage,
}

/// Builder for a synthetic archive file.
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    lat: Vec<f64>,
    lon: Vec<f64>,
    lat_name: &'static str,
    lon_name: &'static str,
    time_units: String,
    times: Vec<f64>,
    step_units: Option<String>,
    steps: Vec<f64>,
    variables: Vec<VariableSpec>,
}

impl ArchiveBuilder {
    pub fn new(lat: Vec<f64>, lon: Vec<f64>) -> Self {
        Self {
            lat,
            lon,
            lat_name: "latitude",
            lon_name: "longitude",
            time_units: ERA5_TIME_UNITS.to_string(),
            times: Vec::new(),
            step_units: Some("hours".to_string()),
            steps: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// Use `lat`/`lon` as coordinate names.
    pub fn short_coordinate_names(mut self) -> Self {
        self.lat_name = "lat";
        self.lon_name = "lon";
        self
    }

    /// One reference time per day at 00:00 UTC, starting at `start`.
    pub fn daily_times(mut self, start: NaiveDate, days: usize) -> Self {
        let epoch = NaiveDate::from_ymd_opt(1900, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("epoch");
        let first: NaiveDateTime = start.and_hms_opt(0, 0, 0).expect("midnight");
        let first_hours = (first - epoch).num_hours() as f64;
        self.time_units = ERA5_TIME_UNITS.to_string();
        self.times = (0..days).map(|d| first_hours + 24.0 * d as f64).collect();
        self
    }

    /// Raw time values with explicit CF units.
    pub fn times(mut self, units: &str, values: Vec<f64>) -> Self {
        self.time_units = units.to_string();
        self.times = values;
        self
    }

    /// Steps `1..=n` in hours.
    pub fn hourly_steps(mut self, n: usize) -> Self {
        self.steps = (1..=n).map(|h| h as f64).collect();
        self.step_units = Some("hours".to_string());
        self
    }

    /// Raw step values; `None` leaves the `units` attribute off.
    pub fn steps(mut self, units: Option<&str>, values: Vec<f64>) -> Self {
        self.step_units = units.map(str::to_string);
        self.steps = values;
        self
    }

    fn shape(&self) -> [usize; 4] {
        [self.times.len(), self.steps.len(), self.lat.len(), self.lon.len()]
    }

    /// Add a float variable from flat `(time, step, lat, lon)` values.
    pub fn variable(mut self, name: &str, values: Vec<f32>) -> Self {
        self.variables.push(VariableSpec {
            name: name.to_string(),
            values,
            storage: Storage::Float,
        });
        self
    }

    /// Add a float variable where `f(time, step, row, col)` gives each sample.
    pub fn variable_fn(self, name: &str, f: impl Fn(usize, usize, usize, usize) -> f32) -> Self {
        let [nt, ns, nr, nc] = self.shape();
        let mut values = Vec::with_capacity(nt * ns * nr * nc);
        for t in 0..nt {
            for s in 0..ns {
                for r in 0..nr {
                    for c in 0..nc {
                        values.push(f(t, s, r, c));
                    }
                }
            }
        }
        self.variable(name, values)
    }

    /// Add a variable packed into i16; NaN samples are stored as `fill`.
    pub fn packed_variable(
        mut self,
        name: &str,
        values: Vec<f32>,
        scale: f64,
        offset: f64,
        fill: i16,
    ) -> Self {
        self.variables.push(VariableSpec {
            name: name.to_string(),
            values,
            storage: Storage::Packed {
                scale,
                offset,
                fill,
            },
        });
        self
    }

    /// Write the archive to `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), netcdf::Error> {
        let [nt, ns, nr, nc] = self.shape();
        let mut file = netcdf::create(path.as_ref())?;

        file.add_dimension("time", nt)?;
        file.add_dimension("step", ns)?;
        file.add_dimension(self.lat_name, nr)?;
        file.add_dimension(self.lon_name, nc)?;

        let mut time = file.add_variable::<f64>("time", &["time"])?;
        time.put_attribute("units", self.time_units.as_str())?;
        time.put_values(&self.times, ..)?;

        let mut step = file.add_variable::<f64>("step", &["step"])?;
        if let Some(units) = &self.step_units {
            step.put_attribute("units", units.as_str())?;
        }
        step.put_values(&self.steps, ..)?;

        let mut lat = file.add_variable::<f64>(self.lat_name, &[self.lat_name])?;
        lat.put_attribute("units", "degrees_north")?;
        lat.put_values(&self.lat, ..)?;

        let mut lon = file.add_variable::<f64>(self.lon_name, &[self.lon_name])?;
        lon.put_attribute("units", "degrees_east")?;
        lon.put_values(&self.lon, ..)?;

        let dims = ["time", "step", self.lat_name, self.lon_name];
        for spec in &self.variables {
            match spec.storage {
                Storage::Float => {
                    let mut var = file.add_variable::<f32>(&spec.name, &dims)?;
                    var.put_values(&spec.values, ..)?;
                }
                Storage::Packed {
                    scale,
                    offset,
                    fill,
                } => {
                    let packed: Vec<i16> = spec
                        .values
                        .iter()
                        .map(|&v| {
                            if v.is_nan() {
                                fill
                            } else {
                                ((v as f64 - offset) / scale).round() as i16
                            }
                        })
                        .collect();
                    let mut var = file.add_variable::<i16>(&spec.name, &dims)?;
                    var.set_fill_value(fill)?;
                    var.put_attribute("scale_factor", scale)?;
                    var.put_attribute("add_offset", offset)?;
                    var.put_values(&packed, ..)?;
                }
            }
        }

        Ok(())
    }
}
