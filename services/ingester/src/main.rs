//! Daily reanalysis summary ingester.
//!
//! Scans a directory of hourly ERA5-Land style NetCDF archives and writes
//! per-day min/max/sum GeoTIFFs clipped to a region mask.

mod config_loader;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use config_loader::{load_config, validate_log_level, IngesterConfig, LogFormat, LoggingConfig};
use ingestion::{Pipeline, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "ingester")]
#[command(about = "Daily min/max/sum GeoTIFFs from hourly reanalysis archives")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "INGESTER_CONFIG")]
    config: Option<PathBuf>,

    /// Directory containing the archives
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Classification GeoTIFF defining the region
    #[arg(long)]
    region_mask: Option<PathBuf>,

    /// Root directory for daily outputs
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Worker threads (default: number of CPUs)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Keep existing outputs instead of overwriting them
    #[arg(long)]
    no_overwrite: bool,

    /// Write the JSON run report here
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "INGESTER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    init_tracing(&config.logging);
    info!(
        source_dir = %config.pipeline.source_dir.display(),
        region_mask = %config.pipeline.region_mask.display(),
        output_root = %config.pipeline.output_root.display(),
        variables = ?config.pipeline.variables,
        "Starting daily summary ingester"
    );

    let pipeline = Pipeline::new(config.pipeline).context("Failed to initialise pipeline")?;
    let report = pipeline.run()?;

    if let Some(path) = &config.report {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write run report to {:?}", path))?;
        info!(path = %path.display(), "Run report written");
    }

    if report.has_failures() {
        error!(
            issues = report.issues.len(),
            "Run finished with failures; see the report for details"
        );
        std::process::exit(1);
    }

    Ok(())
}

/// Merge the config file (if any) with command-line overrides.
fn resolve_config(args: &Args) -> Result<IngesterConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let (Some(source), Some(mask), Some(output)) =
                (&args.source_dir, &args.region_mask, &args.output_root)
            else {
                anyhow::bail!(
                    "Either --config or all of --source-dir, --region-mask and --output-root are required"
                );
            };
            IngesterConfig {
                pipeline: PipelineConfig::new(source, mask, output),
                logging: LoggingConfig::default(),
                report: None,
            }
        }
    };

    let pipeline = &mut config.pipeline;
    if let Some(dir) = &args.source_dir {
        pipeline.source_dir = dir.clone();
    }
    if let Some(mask) = &args.region_mask {
        pipeline.region_mask = mask.clone();
    }
    if let Some(root) = &args.output_root {
        pipeline.output_root = root.clone();
    }
    if args.workers.is_some() {
        pipeline.workers = args.workers;
    }
    if args.no_overwrite {
        pipeline.overwrite = false;
    }
    if args.report.is_some() {
        config.report = args.report.clone();
    }
    if let Some(level) = &args.log_level {
        validate_log_level(level)?;
        config.logging.level = level.clone();
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }

    config_loader::expand_paths(&mut config);
    config.pipeline.validate()?;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Json => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .json()
            .init(),
        LogFormat::Pretty => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true)
            .init(),
    }
}
