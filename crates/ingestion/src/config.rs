//! Pipeline configuration.
//!
//! Defines where archives, the region mask and outputs live, which variables
//! are tracked and how each is aggregated.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use grid_processor::{AggregationOptions, UpsampleFactors};
use raster_common::VariableKind;

use crate::error::{IngestionError, Result};

/// Everything a pipeline run needs. Passed explicitly to
/// [`Pipeline::new`](crate::Pipeline::new).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory scanned for archives.
    pub source_dir: PathBuf,
    #[serde(default = "default_archive_extension")]
    pub archive_extension: String,
    /// Classification GeoTIFF defining the region.
    pub region_mask: PathBuf,
    pub output_root: PathBuf,
    #[serde(default = "default_variables")]
    pub variables: Vec<String>,
    /// Variables stored as running totals since midnight.
    #[serde(default = "default_accumulating")]
    pub accumulating: Vec<String>,
    /// Accumulating variables whose non-positive increments become zero.
    #[serde(default = "default_clamp_negative")]
    pub clamp_negative: Vec<String>,
    #[serde(default = "default_native_resolution")]
    pub native_resolution_m: f64,
    #[serde(default = "default_desired_resolution")]
    pub desired_resolution_m: f64,
    #[serde(default = "default_output_extension")]
    pub output_extension: String,
    /// Replace existing outputs; when false, existing files are skipped.
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
    /// Worker threads; defaults to the number of CPUs.
    #[serde(default)]
    pub workers: Option<usize>,
}

fn default_archive_extension() -> String {
    "nc".to_string()
}

fn default_variables() -> Vec<String> {
    ["t2m", "u10", "v10", "tp"].iter().map(|s| s.to_string()).collect()
}

fn default_accumulating() -> Vec<String> {
    vec!["tp".to_string()]
}

fn default_clamp_negative() -> Vec<String> {
    vec!["tp".to_string()]
}

fn default_native_resolution() -> f64 {
    9000.0
}

fn default_desired_resolution() -> f64 {
    500.0
}

fn default_output_extension() -> String {
    "tif".to_string()
}

fn default_overwrite() -> bool {
    true
}

impl PipelineConfig {
    /// Configuration with default variables and resolutions.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        region_mask: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            archive_extension: default_archive_extension(),
            region_mask: region_mask.into(),
            output_root: output_root.into(),
            variables: default_variables(),
            accumulating: default_accumulating(),
            clamp_negative: default_clamp_negative(),
            native_resolution_m: default_native_resolution(),
            desired_resolution_m: default_desired_resolution(),
            output_extension: default_output_extension(),
            overwrite: default_overwrite(),
            workers: None,
        }
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("native_resolution_m", self.native_resolution_m),
            ("desired_resolution_m", self.desired_resolution_m),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(IngestionError::invalid_config(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if self.variables.is_empty() {
            return Err(IngestionError::invalid_config("no variables configured"));
        }

        let tracked: HashSet<&str> = self.variables.iter().map(String::as_str).collect();
        if tracked.len() != self.variables.len() {
            return Err(IngestionError::invalid_config("duplicate variable names"));
        }
        if let Some(v) = self.accumulating.iter().find(|v| !tracked.contains(v.as_str())) {
            return Err(IngestionError::invalid_config(format!(
                "accumulating variable '{}' is not tracked",
                v
            )));
        }
        if let Some(v) = self
            .clamp_negative
            .iter()
            .find(|v| !self.accumulating.contains(v))
        {
            return Err(IngestionError::invalid_config(format!(
                "clamp_negative variable '{}' is not accumulating",
                v
            )));
        }

        if self.workers == Some(0) {
            return Err(IngestionError::invalid_config("workers must be at least 1"));
        }
        if self.output_extension.trim_start_matches('.').is_empty() {
            return Err(IngestionError::invalid_config("output_extension is empty"));
        }
        Ok(())
    }

    pub fn variable_kind(&self, name: &str) -> VariableKind {
        if self.accumulating.iter().any(|v| v == name) {
            VariableKind::Accumulating
        } else {
            VariableKind::Instantaneous
        }
    }

    pub fn aggregation_options(&self, name: &str) -> AggregationOptions {
        match self.variable_kind(name) {
            VariableKind::Accumulating => {
                AggregationOptions::accumulating(self.clamp_negative.iter().any(|v| v == name))
            }
            VariableKind::Instantaneous => AggregationOptions::instantaneous(),
        }
    }

    pub fn upsample_factors(&self) -> UpsampleFactors {
        UpsampleFactors::from_resolutions(self.native_resolution_m, self.desired_resolution_m)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PipelineConfig {
        PipelineConfig::new("/data/era5", "/data/region.tif", "/data/out")
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = config();
        config.validate().unwrap();
        assert_eq!(config.upsample_factors(), UpsampleFactors::uniform(18));
        assert_eq!(config.variable_kind("tp"), VariableKind::Accumulating);
        assert_eq!(config.variable_kind("t2m"), VariableKind::Instantaneous);
        assert!(config.aggregation_options("tp").clamp_negative);
        assert!(!config.aggregation_options("u10").clamp_negative);
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let yaml = "source_dir: /a\nregion_mask: /b.tif\noutput_root: /c\n";
        let parsed: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed, PipelineConfig::new("/a", "/b.tif", "/c"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let yaml = "source_dir: /a\nregion_mask: /b.tif\noutput_root: /c\nresolution: 3\n";
        assert!(serde_yaml::from_str::<PipelineConfig>(yaml).is_err());
    }

    #[test]
    fn test_validation_failures() {
        let mut c = config();
        c.desired_resolution_m = 0.0;
        assert!(c.validate().is_err());

        let mut c = config();
        c.variables.clear();
        assert!(c.validate().is_err());

        let mut c = config();
        c.accumulating.push("ssrd".to_string());
        assert!(c.validate().is_err());

        let mut c = config();
        c.clamp_negative.push("t2m".to_string());
        assert!(c.validate().is_err());

        let mut c = config();
        c.workers = Some(0);
        assert!(c.validate().is_err());

        let mut c = config();
        c.variables.push("t2m".to_string());
        assert!(c.validate().is_err());
    }
}
