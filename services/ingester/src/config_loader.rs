//! Configuration loader for the ingester
//!
//! Reads a YAML file of the form:
//!
//! ```yaml
//! pipeline:
//!   source_dir: ${ERA5_DIR}
//!   region_mask: ~/masks/uttarakhand.tif
//!   output_root: ${OUTPUT_ROOT:-/data/daily}
//!   variables: [t2m, u10, v10, tp]
//! logging:
//!   level: info
//!   format: json
//! report: /data/daily/report.json
//! ```
//!
//! Supports environment variable substitution using ${VAR} and
//! ${VAR:-default} syntax, and `~` in paths.

use anyhow::{Context, Result};
use ingestion::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngesterConfig {
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Where to write the JSON run report.
    #[serde(default)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Load and parse the ingester config with environment variable substitution
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<IngesterConfig> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;

    let expanded = expand_env_vars(&content)?;

    let mut config: IngesterConfig = serde_yaml::from_str(&expanded)
        .with_context(|| format!("Failed to parse config from {:?}", path.as_ref()))?;

    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Expand `~` in every configured path.
pub fn expand_paths(config: &mut IngesterConfig) {
    let pipeline = &mut config.pipeline;
    for path in [
        &mut pipeline.source_dir,
        &mut pipeline.region_mask,
        &mut pipeline.output_root,
    ] {
        *path = expand_tilde(path);
    }
    if let Some(report) = config.report.as_mut() {
        *report = expand_tilde(report);
    }
}

pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}

/// Expand ${VAR} and ${VAR:-default} in raw file content
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            let value = resolve_var_expr(&var_expr)?;
            result.push_str(&value);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim())
            .with_context(|| format!("Environment variable {} not set", expr))
    }
}

pub fn validate_log_level(level: &str) -> Result<()> {
    anyhow::ensure!(
        VALID_LEVELS.contains(&level),
        "Invalid log level: {}. Must be one of: {:?}",
        level,
        VALID_LEVELS
    );
    Ok(())
}

fn validate_config(config: &IngesterConfig) -> Result<()> {
    validate_log_level(&config.logging.level)?;
    config
        .pipeline
        .validate()
        .context("Invalid pipeline configuration")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("INGESTER_TEST_VAR", "test_value");
        let result = expand_env_vars("prefix_${INGESTER_TEST_VAR}_suffix").unwrap();
        assert_eq!(result, "prefix_test_value_suffix");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("INGESTER_NONEXISTENT_VAR");
        let result = expand_env_vars("value_${INGESTER_NONEXISTENT_VAR:-default}_end").unwrap();
        assert_eq!(result, "value_default_end");
    }

    #[test]
    fn test_expand_env_vars_missing_required() {
        std::env::remove_var("INGESTER_REQUIRED_VAR");
        assert!(expand_env_vars("${INGESTER_REQUIRED_VAR}").is_err());
        assert!(expand_env_vars("${UNCLOSED").is_err());
    }

    #[test]
    fn test_resolve_var_expr_override_default() {
        std::env::set_var("INGESTER_SET_VAR", "custom");
        let result = resolve_var_expr("INGESTER_SET_VAR:-default").unwrap();
        assert_eq!(result, "custom");
    }

    #[test]
    fn test_load_config() {
        std::env::set_var("INGESTER_TEST_SOURCE", "/data/era5");
        let file = write_config(
            "pipeline:\n  source_dir: ${INGESTER_TEST_SOURCE}\n  region_mask: ~/region.tif\n  output_root: ${INGESTER_TEST_OUT:-/data/out}\n  variables: [t2m, tp]\nlogging:\n  level: debug\n  format: pretty\n",
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.pipeline.source_dir, PathBuf::from("/data/era5"));
        assert_eq!(config.pipeline.output_root, PathBuf::from("/data/out"));
        assert!(!config.pipeline.region_mask.starts_with("~"));
        assert_eq!(config.pipeline.variables, vec!["t2m", "tp"]);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.report.is_none());
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let file = write_config(
            "pipeline:\n  source_dir: /a\n  region_mask: /b.tif\n  output_root: /c\nlogging:\n  level: loud\n  format: json\n",
        );
        assert!(load_config(file.path()).is_err());

        let file = write_config(
            "pipeline:\n  source_dir: /a\n  region_mask: /b.tif\n  output_root: /c\n  desired_resolution_m: -1\n",
        );
        assert!(load_config(file.path()).is_err());
    }
}
