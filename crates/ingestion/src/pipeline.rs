//! Archive → variable → day orchestration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use grid_processor::{
    align_mask, clip_in_place, upsample, upsample_axis, AggregationOptions, DailyAggregator,
    DailySummary, GridProcessorError, UpsampleFactors,
};
use netcdf_parser::{ArchiveError, DailyGroup, SourceArchive, VariableSeries};
use raster_common::RegionMask;
use storage::{load_region_mask, OutputKey, OutputLayout, RasterWriter, WriteOutcome};

use crate::config::PipelineConfig;
use crate::error::{IngestionError, Result};
use crate::report::{DayOutcome, Issue, IssueKind, RunReport};

/// The daily summary pipeline.
///
/// Archives and variables are processed one after another; the days of a
/// variable run in parallel on a dedicated rayon pool.
pub struct Pipeline {
    config: PipelineConfig,
    mask: Arc<RegionMask>,
    factors: UpsampleFactors,
    writer: RasterWriter,
    pool: rayon::ThreadPool,
}

impl Pipeline {
    /// Validate the configuration and load the region mask.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let mask = load_region_mask(&config.region_mask)?;
        Self::with_mask(config, mask)
    }

    /// Build a pipeline around an already loaded mask.
    pub fn with_mask(config: PipelineConfig, mask: RegionMask) -> Result<Self> {
        config.validate()?;

        let factors = config.upsample_factors();
        if factors.is_identity() {
            info!(
                native_m = config.native_resolution_m,
                desired_m = config.desired_resolution_m,
                "Upsampling factor <= 1, grids are used at native resolution"
            );
        } else {
            info!(lat = factors.lat, lon = factors.lon, "Upsampling factors");
        }

        let workers = config.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("daily-worker-{}", i))
            .build()
            .map_err(|e| IngestionError::ThreadPool(e.to_string()))?;

        let writer = RasterWriter::new(
            OutputLayout::new(&config.output_root, config.output_extension.as_str()),
            config.overwrite,
        );

        info!(
            workers,
            overwrite = config.overwrite,
            output_root = %config.output_root.display(),
            "Pipeline ready"
        );

        Ok(Self {
            config,
            mask: Arc::new(mask),
            factors,
            writer,
            pool,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn factors(&self) -> UpsampleFactors {
        self.factors
    }

    /// Archive files in the source directory, sorted by name.
    pub fn discover_archives(&self) -> Result<Vec<PathBuf>> {
        let wanted = self.config.archive_extension.trim_start_matches('.');
        let mut archives = Vec::new();

        for entry in WalkDir::new(&self.config.source_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map_or(false, |e| e.eq_ignore_ascii_case(wanted));
            if matches {
                archives.push(entry.into_path());
            }
        }
        Ok(archives)
    }

    /// Process every archive in the source directory.
    pub fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::new();
        let archives = self.discover_archives()?;
        report.archives_found = archives.len();
        info!(
            count = archives.len(),
            source_dir = %self.config.source_dir.display(),
            "Found archives"
        );

        for path in &archives {
            self.process_archive(path, &mut report);
        }

        report.finish();
        report.log_summary();
        Ok(report)
    }

    /// Process all tracked variables of one archive. Failures are recorded
    /// in `report`; they never abort the run.
    #[instrument(skip(self, report), fields(archive = %path.display()))]
    pub fn process_archive(&self, path: &Path, report: &mut RunReport) {
        info!("Reading data file");
        let archive = match SourceArchive::open(path) {
            Ok(archive) => archive,
            Err(e) => {
                report.archives_failed += 1;
                report.record(Issue::new(IssueKind::ArchiveUnreadable, e.to_string()).archive(path));
                return;
            }
        };
        report.archives_opened += 1;

        let extent = archive.bbox();
        if !extent.intersects(&self.mask.bbox()) {
            warn!(
                archive_bbox = ?extent,
                mask_bbox = ?self.mask.bbox(),
                "Region mask does not overlap the archive extent"
            );
        }

        if archive.crs() != self.mask.crs() {
            warn!(
                archive_crs = %archive.crs(),
                mask_crs = %self.mask.crs(),
                "Region mask CRS differs from archive CRS; no reprojection is performed"
            );
        }

        for variable in &self.config.variables {
            match archive.load_variable(variable) {
                Ok(series) => {
                    report.variables_processed += 1;
                    self.process_series(path, &series, report);
                }
                Err(ArchiveError::VariableAbsent { .. }) => {
                    report.variables_skipped += 1;
                    report.record(
                        Issue::new(
                            IssueKind::VariableAbsent,
                            format!("Variable {} not found in {}", variable, path.display()),
                        )
                        .archive(path)
                        .variable(variable.as_str()),
                    );
                }
                Err(e) => {
                    report.variables_skipped += 1;
                    report.record(
                        Issue::new(IssueKind::VariableUnreadable, e.to_string())
                            .archive(path)
                            .variable(variable.as_str()),
                    );
                }
            }
        }
    }

    /// Run every daily group of one series on the worker pool.
    pub fn process_series(&self, archive: &Path, series: &VariableSeries, report: &mut RunReport) {
        let variable = series.name();

        let mask = match self.mask_for(series) {
            Ok(mask) => mask,
            Err(e) => {
                report.record(
                    Issue::new(issue_kind(&e), e.to_string())
                        .archive(archive)
                        .variable(variable),
                );
                return;
            }
        };

        let options = self.config.aggregation_options(variable);
        let groups: Vec<DailyGroup<'_>> = series.daily_groups().collect();
        debug!(variable, days = groups.len(), ?options, "Processing variable");

        let outcomes: Vec<DayOutcome> = self.pool.install(|| {
            groups
                .par_iter()
                .map(|group| self.process_day(group, &mask, options))
                .collect()
        });

        for mut outcome in outcomes {
            for issue in &mut outcome.issues {
                issue.archive.get_or_insert_with(|| archive.to_path_buf());
            }
            report.merge_day(outcome);
        }
    }

    /// Region mask on the upsampled axes of `series`.
    fn mask_for(&self, series: &VariableSeries) -> grid_processor::Result<Arc<RegionMask>> {
        let lat = upsample_axis(series.lat(), self.factors.lat)?;
        let lon = upsample_axis(series.lon(), self.factors.lon)?;
        if self.mask.matches_axes(&lat, &lon) {
            return Ok(Arc::clone(&self.mask));
        }

        let aligned = align_mask(&self.mask, &lat, &lon)?;
        debug!(
            rows = lat.len(),
            cols = lon.len(),
            inside = aligned.inside_count(),
            "Aligned region mask to target grid"
        );
        Ok(Arc::new(aligned))
    }

    /// Upsample, clip and aggregate one day, then write its summaries.
    pub fn process_day(
        &self,
        group: &DailyGroup<'_>,
        mask: &RegionMask,
        options: AggregationOptions,
    ) -> DayOutcome {
        let variable = group.variable();
        let date = group.date();
        let mut outcome = DayOutcome::default();

        let summary = match self.summarize(group, mask, options) {
            Ok(summary) => summary,
            Err(e) => {
                outcome.issues.push(
                    Issue::new(issue_kind(&e), e.to_string())
                        .variable(variable)
                        .date(date),
                );
                return outcome;
            }
        };
        outcome.aggregated = true;

        if summary.extrapolated {
            info!(
                variable,
                %date,
                steps_used = summary.steps_used,
                "Final day incomplete, sum extrapolated over the missing hour"
            );
        }

        for (statistic, grid) in summary.outputs() {
            let key = OutputKey::new(variable, statistic, date);
            match self.writer.write(&key, grid) {
                Ok(WriteOutcome::Written { path, attempts }) => {
                    outcome.files_written += 1;
                    outcome.write_retries += attempts.saturating_sub(1) as usize;
                    info!(
                        variable = %key.product(),
                        %date,
                        path = %path.display(),
                        "GeoTIFF file written"
                    );
                }
                Ok(WriteOutcome::SkippedExisting { path }) => {
                    outcome.files_skipped += 1;
                    info!(
                        variable = %key.product(),
                        %date,
                        path = %path.display(),
                        "Output exists, skipped"
                    );
                }
                Err(e) => outcome.issues.push(
                    Issue::new(IssueKind::WriteFailed, format!("{}: {}", key, e))
                        .variable(variable)
                        .date(date),
                ),
            }
        }

        outcome
    }

    fn summarize(
        &self,
        group: &DailyGroup<'_>,
        mask: &RegionMask,
        options: AggregationOptions,
    ) -> grid_processor::Result<DailySummary> {
        let mut aggregator = DailyAggregator::new(options);
        for step in group.steps() {
            let mut grid = upsample(&step, self.factors.lat, self.factors.lon)?;
            clip_in_place(&mut grid, mask)?;
            aggregator.push(grid)?;
        }
        debug!(
            variable = group.variable(),
            date = %group.date(),
            steps = aggregator.pushed(),
            "Upsampled and clipped day"
        );
        aggregator.finish(group.is_truncated())
    }
}

fn issue_kind(error: &GridProcessorError) -> IssueKind {
    match error {
        GridProcessorError::EmptyDailyGroup { .. } => IssueKind::EmptyDailyGroup,
        GridProcessorError::AxisMismatch { .. } => IssueKind::AxisMismatch,
        _ => IssueKind::ProcessingFailed,
    }
}
