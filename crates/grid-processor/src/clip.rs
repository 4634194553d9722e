//! Region clipping.

use raster_common::{Axis, Grid, RegionMask, AXIS_REL_TOL, MISSING};

use crate::error::{GridProcessorError, Result};

/// Fail unless `actual` matches `expected` coordinate for coordinate.
pub fn ensure_same_axis(expected: &Axis, actual: &Axis) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(GridProcessorError::axis_mismatch(
            expected.kind(),
            format!("length {} vs {}", expected.len(), actual.len()),
        ));
    }
    if !expected.approx_eq(actual, AXIS_REL_TOL) {
        let (idx, a, b) = expected
            .values()
            .iter()
            .zip(actual.values())
            .enumerate()
            .map(|(i, (a, b))| (i, *a, *b))
            .max_by(|x, y| (x.1 - x.2).abs().total_cmp(&(y.1 - y.2).abs()))
            .unwrap_or((0, expected.first(), actual.first()));
        return Err(GridProcessorError::axis_mismatch(
            expected.kind(),
            format!("coordinate {} differs: {} vs {}", idx, a, b),
        ));
    }
    Ok(())
}

/// Set every cell outside `mask` to the missing sentinel, in place.
pub fn clip_in_place(grid: &mut Grid, mask: &RegionMask) -> Result<()> {
    ensure_same_axis(mask.lat(), grid.lat())?;
    ensure_same_axis(mask.lon(), grid.lon())?;

    for (v, &inside) in grid.data_mut().iter_mut().zip(mask.cells()) {
        if !inside {
            *v = MISSING;
        }
    }
    Ok(())
}

/// Put `mask` on the target axes.
///
/// A mask on a different grid is accepted only when it has the same
/// resolution and covers the whole target extent; it is then resampled by
/// nearest coordinate. Anything else is an axis mismatch.
pub fn align_mask(mask: &RegionMask, lat: &Axis, lon: &Axis) -> Result<RegionMask> {
    if mask.matches_axes(lat, lon) {
        return Ok(mask.clone());
    }
    ensure_compatible(mask.lat(), lat)?;
    ensure_compatible(mask.lon(), lon)?;
    Ok(mask.align_to(lat, lon)?)
}

fn ensure_compatible(source: &Axis, target: &Axis) -> Result<()> {
    let spacing = source.spacing();
    let tol = spacing * AXIS_REL_TOL;
    if target.len() > 1 && (target.spacing() - spacing).abs() > tol {
        return Err(GridProcessorError::axis_mismatch(
            source.kind(),
            format!("spacing {} vs {}", spacing, target.spacing()),
        ));
    }
    let half = spacing * 0.5;
    if target.min() < source.min() - half - tol || target.max() > source.max() + half + tol {
        return Err(GridProcessorError::axis_mismatch(
            source.kind(),
            format!(
                "target range [{}, {}] outside mask range [{}, {}]",
                target.min(),
                target.max(),
                source.min(),
                source.max()
            ),
        ));
    }
    Ok(())
}

/// Copy of `grid` with cells outside `mask` set to missing.
pub fn clip(grid: &Grid, mask: &RegionMask) -> Result<Grid> {
    let mut out = grid.clone();
    clip_in_place(&mut out, mask)?;
    Ok(out)
}
