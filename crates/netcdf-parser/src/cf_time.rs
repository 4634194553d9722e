//! CF-convention time and duration decoding.
//!
//! Reanalysis archives encode their `time` axis as offsets from an epoch,
//! e.g. `hours since 1900-01-01 00:00:00.0`, and their `step` axis as bare
//! durations (`hours`). Both are decoded here.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{ArchiveError, ArchiveResult};

/// Unit of a CF time offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Parse a CF unit word (`hours`, `hour`, `h`, `seconds`, ...).
    pub fn parse(s: &str) -> ArchiveResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Ok(Self::Seconds),
            "min" | "mins" | "minute" | "minutes" => Ok(Self::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Ok(Self::Hours),
            "d" | "day" | "days" => Ok(Self::Days),
            other => Err(ArchiveError::InvalidTime(format!(
                "unknown time unit '{}'",
                other
            ))),
        }
    }

    fn millis(&self) -> f64 {
        match self {
            Self::Seconds => 1_000.0,
            Self::Minutes => 60_000.0,
            Self::Hours => 3_600_000.0,
            Self::Days => 86_400_000.0,
        }
    }

    /// Convert an offset in this unit to a duration, rounded to the millisecond.
    pub fn to_duration(&self, value: f64) -> ArchiveResult<Duration> {
        if !value.is_finite() {
            return Err(ArchiveError::InvalidTime(format!(
                "non-finite offset {}",
                value
            )));
        }
        Ok(Duration::milliseconds((value * self.millis()).round() as i64))
    }
}

/// Parsed `<unit> since <epoch>` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfTimeUnits {
    pub unit: TimeUnit,
    pub epoch: DateTime<Utc>,
}

impl CfTimeUnits {
    /// Parse a CF `units` string such as `hours since 1900-01-01 00:00:00.0`.
    pub fn parse(units: &str) -> ArchiveResult<Self> {
        let (unit, epoch) = units
            .split_once(" since ")
            .ok_or_else(|| ArchiveError::InvalidTime(format!("unexpected units '{}'", units)))?;

        Ok(Self {
            unit: TimeUnit::parse(unit)?,
            epoch: parse_epoch(epoch)?,
        })
    }

    /// Decode one offset value.
    pub fn decode(&self, value: f64) -> ArchiveResult<DateTime<Utc>> {
        Ok(self.epoch + self.unit.to_duration(value)?)
    }
}

/// Parse the epoch part of a CF units string (always UTC).
fn parse_epoch(s: &str) -> ArchiveResult<DateTime<Utc>> {
    let s = s.trim().trim_end_matches('Z').trim_end_matches(" UTC");

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .ok_or_else(|| ArchiveError::InvalidTime(format!("unparseable epoch '{}'", s)))
}
