//! Run report: counts and per-unit issues.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::Result;

/// Why a unit of work was skipped or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Archive could not be opened or parsed.
    ArchiveUnreadable,
    /// Tracked variable not present in an archive.
    VariableAbsent,
    /// Variable present but could not be read.
    VariableUnreadable,
    /// Grid and region mask axes disagree.
    AxisMismatch,
    /// A day produced no usable steps.
    EmptyDailyGroup,
    /// Upsampling or aggregation failed for another reason.
    ProcessingFailed,
    /// An output file could not be written after a retry.
    WriteFailed,
}

impl IssueKind {
    /// Failures make the run exit non-zero; skips do not.
    pub fn is_failure(&self) -> bool {
        !matches!(self, IssueKind::VariableAbsent | IssueKind::EmptyDailyGroup)
    }
}

/// One skipped or failed unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub message: String,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            archive: None,
            variable: None,
            date: None,
            message: message.into(),
        }
    }

    pub fn archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive = Some(path.into());
        self
    }

    pub fn variable(mut self, name: impl Into<String>) -> Self {
        self.variable = Some(name.into());
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Result of processing one (variable, day) task.
#[derive(Debug, Clone, Default)]
pub struct DayOutcome {
    pub aggregated: bool,
    pub files_written: usize,
    pub files_skipped: usize,
    pub write_retries: usize,
    pub issues: Vec<Issue>,
}

/// Summary of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub archives_found: usize,
    pub archives_opened: usize,
    pub archives_failed: usize,
    pub variables_processed: usize,
    pub variables_skipped: usize,
    pub days_aggregated: usize,
    pub days_skipped: usize,
    pub days_failed: usize,
    pub files_written: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub write_retries: usize,
    pub issues: Vec<Issue>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            archives_found: 0,
            archives_opened: 0,
            archives_failed: 0,
            variables_processed: 0,
            variables_skipped: 0,
            days_aggregated: 0,
            days_skipped: 0,
            days_failed: 0,
            files_written: 0,
            files_skipped: 0,
            files_failed: 0,
            write_retries: 0,
            issues: Vec::new(),
        }
    }

    /// Record an issue and log it.
    pub fn record(&mut self, issue: Issue) {
        if issue.kind.is_failure() {
            error!(
                kind = ?issue.kind,
                archive = ?issue.archive,
                variable = ?issue.variable,
                date = ?issue.date,
                "{}",
                issue.message
            );
        } else {
            warn!(
                kind = ?issue.kind,
                archive = ?issue.archive,
                variable = ?issue.variable,
                date = ?issue.date,
                "{}",
                issue.message
            );
        }
        self.issues.push(issue);
    }

    /// Fold in the outcome of one day; its issues are logged here.
    pub fn merge_day(&mut self, day: DayOutcome) {
        self.files_written += day.files_written;
        self.files_skipped += day.files_skipped;
        self.write_retries += day.write_retries;

        let mut failed = false;
        let mut skipped = false;
        for issue in day.issues {
            match issue.kind {
                IssueKind::WriteFailed => self.files_failed += 1,
                IssueKind::EmptyDailyGroup => skipped = true,
                _ => failed = true,
            }
            self.record(issue);
        }

        if day.aggregated {
            self.days_aggregated += 1;
        } else if failed {
            self.days_failed += 1;
        } else if skipped {
            self.days_skipped += 1;
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall time in minutes, up to `finished_at` (or now).
    pub fn elapsed_minutes(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds() as f64 / 60_000.0
    }

    pub fn has_failures(&self) -> bool {
        self.issues.iter().any(|i| i.kind.is_failure())
    }

    pub fn log_summary(&self) {
        info!(
            archives_opened = self.archives_opened,
            archives_failed = self.archives_failed,
            variables_skipped = self.variables_skipped,
            days_aggregated = self.days_aggregated,
            days_skipped = self.days_skipped,
            days_failed = self.days_failed,
            files_written = self.files_written,
            files_skipped = self.files_skipped,
            files_failed = self.files_failed,
            "Processing completed. Run time = {:.2} minutes",
            self.elapsed_minutes()
        );
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
