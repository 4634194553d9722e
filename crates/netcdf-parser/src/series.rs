//! In-memory variable series and their daily groups.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use raster_common::{Axis, Crs, Grid, GridError, GridResult};

/// One variable read from an archive: `(time, step, latitude, longitude)`
/// samples held row-major in a single buffer.
#[derive(Debug, Clone)]
pub struct VariableSeries {
    name: String,
    times: Vec<DateTime<Utc>>,
    steps: Vec<Duration>,
    lat: Axis,
    lon: Axis,
    crs: Crs,
    data: Vec<f32>,
}

impl VariableSeries {
    pub fn new(
        name: impl Into<String>,
        times: Vec<DateTime<Utc>>,
        steps: Vec<Duration>,
        lat: Axis,
        lon: Axis,
        crs: Crs,
        data: Vec<f32>,
    ) -> GridResult<Self> {
        let slice_len = lat.len() * lon.len();
        let expected = times.len() * steps.len() * slice_len;
        if data.len() != expected {
            return Err(GridError::ShapeMismatch {
                rows: times.len() * steps.len() * lat.len(),
                cols: lon.len(),
                actual: data.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            times,
            steps,
            lat,
            lon,
            crs,
            data,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
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

    pub fn crs(&self) -> Crs {
        self.crs
    }

    fn slice_len(&self) -> usize {
        self.lat.len() * self.lon.len()
    }

    /// Raw samples of one (time, step) slice.
    pub fn slice_data(&self, time: usize, step: usize) -> Option<&[f32]> {
        if time >= self.times.len() || step >= self.steps.len() {
            return None;
        }
        let len = self.slice_len();
        let start = (time * self.steps.len() + step) * len;
        Some(&self.data[start..start + len])
    }

    /// One (time, step) slice as an owned grid.
    pub fn slice(&self, time: usize, step: usize) -> Option<Grid> {
        let data = self.slice_data(time, step)?.to_vec();
        Grid::new(self.lat.clone(), self.lon.clone(), data, self.crs).ok()
    }

    /// The steps recorded at time index `time`.
    pub fn daily_group(&self, time: usize) -> Option<DailyGroup<'_>> {
        let reference = *self.times.get(time)?;
        let is_final = time + 1 == self.times.len();
        let truncated = is_final
            && self
                .steps
                .len()
                .checked_sub(1)
                .and_then(|last| self.slice_data(time, last))
                .map_or(false, |slice| slice.iter().all(|v| v.is_nan()));

        Some(DailyGroup {
            series: self,
            time_index: time,
            date: reference.date_naive(),
            is_final,
            truncated,
        })
    }

    /// Daily groups to process. Index 0 is skipped: the first reference
    /// time of an archive holds only the tail of the previous day.
    pub fn daily_groups(&self) -> impl Iterator<Item = DailyGroup<'_>> + '_ {
        (1..self.times.len()).filter_map(move |t| self.daily_group(t))
    }
}

/// The ordered step slices of one calendar day.
#[derive(Debug, Clone, Copy)]
pub struct DailyGroup<'a> {
    series: &'a VariableSeries,
    time_index: usize,
    date: NaiveDate,
    is_final: bool,
    truncated: bool,
}

impl<'a> DailyGroup<'a> {
    pub fn variable(&self) -> &'a str {
        self.series.name()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time_index(&self) -> usize {
        self.time_index
    }

    pub fn len(&self) -> usize {
        self.series.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.steps.is_empty()
    }

    /// Last time index of the archive.
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Final day whose last step has no valid cell.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Step slices in step order.
    pub fn steps(&self) -> impl Iterator<Item = Grid> + 'a {
        let series = self.series;
        let time = self.time_index;
        (0..series.steps.len()).filter_map(move |s| series.slice(time, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn series(days: usize, steps: usize, fill: impl Fn(usize, usize) -> f32) -> VariableSeries {
        let lat = Axis::latitude(vec![30.0, 29.0]).unwrap();
        let lon = Axis::longitude(vec![78.0, 79.0]).unwrap();
        let times = (0..days)
            .map(|d| Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap() + Duration::days(d as i64))
            .collect();
        let step_axis = (1..=steps).map(|h| Duration::hours(h as i64)).collect();
        let mut data = Vec::new();
        for t in 0..days {
            for s in 0..steps {
                data.extend(std::iter::repeat(fill(t, s)).take(4));
            }
        }
        VariableSeries::new("t2m", times, step_axis, lat, lon, Crs::WGS84, data).unwrap()
    }

    #[test]
    fn test_rejects_wrong_length() {
        let lat = Axis::latitude(vec![30.0, 29.0]).unwrap();
        let lon = Axis::longitude(vec![78.0, 79.0]).unwrap();
        let times = vec![Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap()];
        let steps = vec![Duration::hours(1), Duration::hours(2)];
        assert!(VariableSeries::new("t2m", times, steps, lat, lon, Crs::WGS84, vec![0.0; 4]).is_err());
    }

    #[test]
    fn test_slice_indexing() {
        let s = series(3, 4, |t, s| (t * 10 + s) as f32);
        assert_eq!(s.slice(2, 3).unwrap().data(), &[23.0; 4]);
        assert!(s.slice(3, 0).is_none());
        assert!(s.slice(0, 4).is_none());
    }

    #[test]
    fn test_daily_groups_skip_first_index() {
        let s = series(3, 24, |_, _| 1.0);
        let groups: Vec<_> = s.daily_groups().collect();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date(), NaiveDate::from_ymd_opt(2021, 3, 2).unwrap());
        assert_eq!(groups[0].steps().count(), 24);
        assert!(!groups[0].is_final());
        assert!(groups[1].is_final());
        assert!(!groups[1].is_truncated());
    }

    #[test]
    fn test_final_day_with_empty_last_step_is_truncated() {
        let s = series(2, 24, |t, s| if t == 1 && s == 23 { f32::NAN } else { 1.0 });
        let group = s.daily_group(1).unwrap();
        assert!(group.is_truncated());

        let s = series(3, 24, |t, s| if t == 1 && s == 23 { f32::NAN } else { 1.0 });
        assert!(!s.daily_group(1).unwrap().is_truncated());
    }
}
