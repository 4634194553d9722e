//! Daily min/max/sum aggregation.
//!
//! Steps of one day are pushed in order into a [`DailyAggregator`]. For
//! accumulating variables each step holds a running total since the start of
//! the day, so the aggregator first de-accumulates: the first step is its own
//! increment and later increments are `value[k] - value[k - 1]`. Statistics
//! are then taken over the increments.
//!
//! An increment is held back until the next step arrives so that a truncated
//! final day can drop its last increment without it ever being folded in.

use serde::{Deserialize, Serialize};

use raster_common::{Axis, Crs, Grid, Statistic, VariableKind, MISSING};

use crate::clip::ensure_same_axis;
use crate::error::{GridProcessorError, Result};

/// How a variable's steps are reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationOptions {
    pub kind: VariableKind,
    /// Replace non-positive increments with zero.
    pub clamp_negative: bool,
}

impl AggregationOptions {
    pub fn instantaneous() -> Self {
        Self {
            kind: VariableKind::Instantaneous,
            clamp_negative: false,
        }
    }

    pub fn accumulating(clamp_negative: bool) -> Self {
        Self {
            kind: VariableKind::Accumulating,
            clamp_negative,
        }
    }
}

/// Result of aggregating one day.
#[derive(Debug, Clone)]
pub struct DailySummary {
    pub min: Grid,
    pub max: Grid,
    /// Only for accumulating variables.
    pub sum: Option<Grid>,
    /// Increments (or instantaneous steps) folded into the statistics.
    pub steps_used: usize,
    /// The sum was scaled up to cover a dropped final step.
    pub extrapolated: bool,
}

impl DailySummary {
    /// Statistic grids in output order.
    pub fn outputs(&self) -> Vec<(Statistic, &Grid)> {
        let mut out = vec![(Statistic::Min, &self.min), (Statistic::Max, &self.max)];
        if let Some(sum) = &self.sum {
            out.push((Statistic::Sum, sum));
        }
        out
    }
}

/// Axes shared by every step of a day.
#[derive(Debug, Clone)]
struct Frame {
    lat: Axis,
    lon: Axis,
    crs: Crs,
}

impl Frame {
    fn grid(&self, data: Vec<f32>) -> Result<Grid> {
        Ok(Grid::new(self.lat.clone(), self.lon.clone(), data, self.crs)?)
    }
}

/// Streaming reducer for the steps of one day.
#[derive(Debug)]
pub struct DailyAggregator {
    options: AggregationOptions,
    frame: Option<Frame>,
    previous: Option<Vec<f32>>,
    pending: Option<Vec<f32>>,
    min: Vec<f32>,
    max: Vec<f32>,
    sum: Vec<f64>,
    used: usize,
    pushed: usize,
}

impl DailyAggregator {
    pub fn new(options: AggregationOptions) -> Self {
        Self {
            options,
            frame: None,
            previous: None,
            pending: None,
            min: Vec::new(),
            max: Vec::new(),
            sum: Vec::new(),
            used: 0,
            pushed: 0,
        }
    }

    /// Number of steps pushed so far.
    pub fn pushed(&self) -> usize {
        self.pushed
    }

    /// Add the next step of the day.
    pub fn push(&mut self, step: Grid) -> Result<()> {
        match &self.frame {
            Some(frame) => {
                ensure_same_axis(&frame.lat, step.lat())?;
                ensure_same_axis(&frame.lon, step.lon())?;
            }
            None => {
                let n = step.len();
                self.min = vec![MISSING; n];
                self.max = vec![MISSING; n];
                self.sum = vec![0.0; n];
                self.frame = Some(Frame {
                    lat: step.lat().clone(),
                    lon: step.lon().clone(),
                    crs: step.crs(),
                });
            }
        }
        self.pushed += 1;

        match self.options.kind {
            VariableKind::Instantaneous => {
                let values = step.into_data();
                self.fold(&values);
            }
            VariableKind::Accumulating => {
                let values = step.into_data();
                let increment = match &self.previous {
                    Some(prev) => values.iter().zip(prev).map(|(v, p)| v - p).collect(),
                    None => values.clone(),
                };
                self.previous = Some(values);
                if let Some(ready) = self.pending.replace(increment) {
                    self.fold(&ready);
                }
            }
        }
        Ok(())
    }

    fn fold(&mut self, values: &[f32]) {
        let clamp = self.options.clamp_negative;
        for (i, &raw) in values.iter().enumerate() {
            let v = if clamp && raw <= 0.0 { 0.0 } else { raw };
            if !v.is_nan() {
                if self.min[i].is_nan() || v < self.min[i] {
                    self.min[i] = v;
                }
                if self.max[i].is_nan() || v > self.max[i] {
                    self.max[i] = v;
                }
            }
            self.sum[i] += v as f64;
        }
        self.used += 1;
    }

    /// Finish the day.
    ///
    /// When `truncated` is set for an accumulating variable the last
    /// increment is discarded and the sum is scaled by `(n + 1) / n`, where
    /// `n` is the number of increments kept.
    pub fn finish(mut self, truncated: bool) -> Result<DailySummary> {
        let accumulating = self.options.kind == VariableKind::Accumulating;
        let mut extrapolated = false;

        if let Some(last) = self.pending.take() {
            if truncated {
                extrapolated = true;
            } else {
                self.fold(&last);
            }
        }

        let frame = match self.frame.take() {
            Some(f) if self.used > 0 => f,
            _ => {
                return Err(GridProcessorError::EmptyDailyGroup {
                    steps: self.pushed,
                })
            }
        };

        let sum = if accumulating {
            let scale = if extrapolated {
                (self.used as f64 + 1.0) / self.used as f64
            } else {
                1.0
            };
            let data = self.sum.iter().map(|s| (s * scale) as f32).collect();
            Some(frame.grid(data)?)
        } else {
            None
        };

        Ok(DailySummary {
            min: frame.grid(self.min)?,
            max: frame.grid(self.max)?,
            sum,
            steps_used: self.used,
            extrapolated,
        })
    }
}

/// Aggregate a whole day in one call.
pub fn aggregate<I>(steps: I, options: AggregationOptions, truncated: bool) -> Result<DailySummary>
where
    I: IntoIterator<Item = Grid>,
{
    let mut aggregator = DailyAggregator::new(options);
    for step in steps {
        aggregator.push(step)?;
    }
    aggregator.finish(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::AxisKind;
    use test_utils::{
        assert_approx_eq, create_grid_with_nans, create_temperature_grid, cumulative,
        regular_axis,
    };

    fn cell(values: &[f32]) -> Vec<Grid> {
        let lat = Axis::latitude(vec![1.0, 0.0]).unwrap();
        let lon = Axis::longitude(vec![0.0, 1.0]).unwrap();
        values
            .iter()
            .map(|&v| Grid::filled(lat.clone(), lon.clone(), v, Crs::WGS84).unwrap())
            .collect()
    }

    #[test]
    fn test_instantaneous_min_max() {
        let out = aggregate(cell(&[3.0, -1.0, 7.0]), AggregationOptions::instantaneous(), false)
            .unwrap();
        assert_eq!(out.min.data(), &[-1.0; 4]);
        assert_eq!(out.max.data(), &[7.0; 4]);
        assert!(out.sum.is_none());
        assert_eq!(out.outputs().len(), 2);
        assert_eq!(out.steps_used, 3);
    }

    #[test]
    fn test_deaccumulation() {
        let out = aggregate(cell(&[2.0, 5.0, 9.0, 9.0]), AggregationOptions::accumulating(false), false)
            .unwrap();
        // increments [2, 3, 4, 0]
        assert_eq!(out.min.data(), &[0.0; 4]);
        assert_eq!(out.max.data(), &[4.0; 4]);
        assert_eq!(out.sum.as_ref().unwrap().data(), &[9.0; 4]);
        assert_eq!(out.steps_used, 4);
        assert!(!out.extrapolated);
        let stats: Vec<_> = out.outputs().into_iter().map(|(s, _)| s).collect();
        assert_eq!(stats, vec![Statistic::Min, Statistic::Max, Statistic::Sum]);
    }

    #[test]
    fn test_diurnal_cycle_extremes() {
        let lat = regular_axis(AxisKind::Latitude, 30.2, -0.1, 3);
        let lon = regular_axis(AxisKind::Longitude, 78.0, 0.1, 4);
        let steps: Vec<Grid> = (0..24)
            .map(|h| create_temperature_grid(&lat, &lon, h))
            .collect();
        let warmest = steps[14].clone();
        let coldest = steps[2].clone();

        let out = aggregate(steps, AggregationOptions::instantaneous(), false).unwrap();
        assert_eq!(out.max.data(), warmest.data());
        assert_eq!(out.min.data(), coldest.data());
        assert_eq!(out.steps_used, 24);
    }

    #[test]
    fn test_hourly_increments_sum_to_daily_total() {
        let increments = [0.2, 0.0, 1.3, 0.4, 0.0, 2.1];
        let out = aggregate(
            cell(&cumulative(&increments)),
            AggregationOptions::accumulating(true),
            false,
        )
        .unwrap();
        assert_approx_eq!(out.sum.unwrap().data()[3], 4.0, 1e-5);
        assert_approx_eq!(out.max.data()[0], 2.1, 1e-5);
        assert_eq!(out.min.data()[0], 0.0);
    }

    #[test]
    fn test_missing_cell_stays_missing_all_day() {
        let lat = regular_axis(AxisKind::Latitude, 1.0, -1.0, 2);
        let lon = regular_axis(AxisKind::Longitude, 0.0, 1.0, 2);
        let steps: Vec<Grid> = (1..=3)
            .map(|h| create_grid_with_nans(&lat, &lon, h as f32, &[(1, 0)]))
            .collect();
        let out = aggregate(steps, AggregationOptions::accumulating(false), false).unwrap();
        let sum = out.sum.unwrap();
        assert_eq!(sum.valid_count(), 3);
        assert!(sum.get(1, 0).unwrap().is_nan());
        assert!(out.max.get(1, 0).unwrap().is_nan());
        assert_eq!(sum.get(0, 0), Some(3.0));
    }

    #[test]
    fn test_clamp_negative_keeps_missing() {
        let lat = Axis::latitude(vec![1.0, 0.0]).unwrap();
        let lon = Axis::longitude(vec![0.0, 1.0]).unwrap();
        let first = Grid::new(lat.clone(), lon.clone(), vec![1.0, 1.0, MISSING, 1.0], Crs::WGS84)
            .unwrap();
        let second = Grid::new(lat, lon, vec![0.9999, 1.5, MISSING, 1.0], Crs::WGS84).unwrap();

        let out = aggregate(vec![first, second], AggregationOptions::accumulating(true), false)
            .unwrap();
        let min = out.min.data();
        assert_eq!(min[0], 0.0);
        assert!(min[2].is_nan());
        assert_eq!(min[3], 0.0);
        let sum = out.sum.unwrap();
        assert_approx_eq!(sum.data()[0], 1.0, 1e-6);
        assert_approx_eq!(sum.data()[1], 1.5, 1e-6);
        assert!(sum.data()[2].is_nan());
    }

    #[test]
    fn test_unclamped_negative_increment_survives() {
        let out = aggregate(cell(&[1.0, 0.5]), AggregationOptions::accumulating(false), false).unwrap();
        assert_eq!(out.min.data(), &[-0.5; 4]);
    }

    #[test]
    fn test_truncated_final_day_scaling() {
        // 24 cumulative steps of +1 each; the 24th step is dropped.
        let cumulative: Vec<f32> = (1..=24).map(|h| h as f32).collect();
        let out = aggregate(cell(&cumulative), AggregationOptions::accumulating(false), true)
            .unwrap();
        assert_eq!(out.steps_used, 23);
        assert!(out.extrapolated);
        // S = 23, scaled by 24/23
        assert_approx_eq!(out.sum.unwrap().data()[0], 24.0, 1e-4);
        assert_eq!(out.max.data()[0], 1.0);
    }

    #[test]
    fn test_missing_step_propagates_to_sum_only() {
        let out = aggregate(cell(&[1.0, MISSING, 3.0]), AggregationOptions::accumulating(false), false)
            .unwrap();
        assert!(out.sum.unwrap().data()[0].is_nan());
        // increments [1, NaN, NaN]
        assert_eq!(out.min.data()[0], 1.0);
        assert_eq!(out.max.data()[0], 1.0);
    }

    #[test]
    fn test_empty_day() {
        let err = aggregate(Vec::new(), AggregationOptions::instantaneous(), false).unwrap_err();
        assert!(matches!(err, GridProcessorError::EmptyDailyGroup { steps: 0 }));

        // A truncated day with one step has no increment left.
        let err = aggregate(cell(&[1.0]), AggregationOptions::accumulating(false), true).unwrap_err();
        assert!(matches!(err, GridProcessorError::EmptyDailyGroup { steps: 1 }));
    }

    #[test]
    fn test_rejects_steps_on_other_axes() {
        let mut agg = DailyAggregator::new(AggregationOptions::instantaneous());
        agg.push(cell(&[1.0]).remove(0)).unwrap();
        let lat = Axis::latitude(vec![2.0, 0.0]).unwrap();
        let lon = Axis::longitude(vec![0.0, 1.0]).unwrap();
        let other = Grid::filled(lat, lon, 1.0, Crs::WGS84).unwrap();
        assert!(agg.push(other).is_err());
        assert_eq!(agg.pushed(), 1);
    }
}
