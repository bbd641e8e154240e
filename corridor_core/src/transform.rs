//! Height transforms driven by a corridor stamp.
//!
//! Every transform reads from its input grids and returns a new grid, so
//! re-running an edit from the same baseline always gives the same result.

use bitflags::bitflags;

use crate::error::{CorridorError, CorridorResult};
use crate::grid::HeightGrid;
use crate::mask::{CarveDepthField, CorridorMask};
use crate::region::EditRegion;

bitflags! {
    /// Constraints on how an eroded grid is blended over its baseline.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BlendFlags: u8 {
        /// Eroded heights are clamped to the baseline before blending.
        const ONLY_LOWER = 1 << 0;
        /// Only negative deltas are applied, scaled by `delta_scale`.
        const NEGATIVE_DELTA_ONLY = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendParams {
    pub flags: BlendFlags,
    pub delta_scale: f64,
}

impl Default for BlendParams {
    fn default() -> Self {
        Self {
            flags: BlendFlags::empty(),
            delta_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmoothParams {
    pub radius: usize,
    pub passes: usize,
    /// Forces border cells of the entire grid to zero.
    pub zero_grid_edges: bool,
}

fn ensure_resolution(grid: &HeightGrid, resolution: usize, what: &str) -> CorridorResult<()> {
    if grid.resolution() == resolution {
        Ok(())
    } else {
        Err(CorridorError::configuration(format!(
            "{what} resolution {resolution} does not match grid resolution {}",
            grid.resolution()
        )))
    }
}

/// Lowers cells by their carve depth: `max(0, h − depth / vertical_size)`.
pub fn carve(
    source: &HeightGrid,
    depth: &CarveDepthField,
    region: &EditRegion,
) -> CorridorResult<HeightGrid> {
    ensure_resolution(source, depth.resolution(), "carve depth field")?;
    let vertical = source.metadata().vertical_size();
    let mut out = source.clone();
    for (x, z) in region.cells() {
        let d = depth.get(x, z) as f64;
        if d <= 0.0 {
            continue;
        }
        let idx = out.index(x, z);
        let old = out.heights()[idx] as f64;
        out.heights_mut()[idx] = (old - d / vertical).max(0.0) as f32;
    }
    Ok(out)
}

/// Composes `eroded` over `baseline` weighted by `mask`.
///
/// Cells outside `region` (when given) keep their baseline value.
pub fn blend(
    baseline: &HeightGrid,
    eroded: &HeightGrid,
    mask: &CorridorMask,
    region: Option<&EditRegion>,
    params: BlendParams,
) -> CorridorResult<HeightGrid> {
    baseline.ensure_same_shape(eroded, "eroded")?;
    ensure_resolution(baseline, mask.resolution(), "mask")?;

    let full = EditRegion::full(baseline.resolution());
    let region = region.unwrap_or(&full);
    let mut out = baseline.clone();
    for (x, z) in region.cells() {
        let idx = out.index(x, z);
        let b = baseline.heights()[idx] as f64;
        let e = eroded.heights()[idx] as f64;
        let m = mask.get(x, z) as f64;
        out.heights_mut()[idx] = blend_cell(b, e, m, params) as f32;
    }
    Ok(out)
}

pub fn blend_cell(baseline: f64, eroded: f64, mask: f64, params: BlendParams) -> f64 {
    if params.flags.contains(BlendFlags::NEGATIVE_DELTA_ONLY) {
        let delta = (eroded - baseline).min(0.0);
        return (baseline + delta * params.delta_scale * mask).clamp(0.0, 1.0);
    }
    let target = if params.flags.contains(BlendFlags::ONLY_LOWER) {
        eroded.min(baseline)
    } else {
        eroded
    };
    baseline + (target - baseline) * mask
}

/// `(2r+1)²` box average clamped at the grid edges, `passes` times.
///
/// Only cells inside `region` (when given) are rewritten; neighbours are read
/// from the whole grid.
pub fn smooth(
    grid: &HeightGrid,
    region: Option<&EditRegion>,
    params: SmoothParams,
) -> HeightGrid {
    let res = grid.resolution();
    let last = res as i64 - 1;
    let r = params.radius as i64;
    let full = EditRegion::full(res);
    let region = region.unwrap_or(&full);
    let mut out = grid.clone();

    if r > 0 {
        let window = ((2 * r + 1) * (2 * r + 1)) as f64;
        for _ in 0..params.passes {
            let source = out.heights().to_vec();
            for (x, z) in region.cells() {
                let mut sum = 0.0f64;
                for dz in -r..=r {
                    let nz = (z as i64 + dz).clamp(0, last) as usize;
                    for dx in -r..=r {
                        let nx = (x as i64 + dx).clamp(0, last) as usize;
                        sum += source[nz * res + nx] as f64;
                    }
                }
                let idx = out.index(x, z);
                out.heights_mut()[idx] = (sum / window) as f32;
            }
        }
    }

    if params.zero_grid_edges {
        zero_grid_edges(&mut out);
    }
    out
}

/// Sets every border cell of the grid to zero.
pub fn zero_grid_edges(grid: &mut HeightGrid) {
    let res = grid.resolution();
    let last = res - 1;
    for i in 0..res {
        for (x, z) in [(i, 0), (i, last), (0, i), (last, i)] {
            let idx = grid.index(x, z);
            grid.heights_mut()[idx] = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::GridMetadata;
    use bevy::math::{DVec2, DVec3};

    fn metadata(res: usize, vertical: f64) -> GridMetadata {
        GridMetadata::new(res, DVec2::ZERO, DVec3::new(4.0, vertical, 4.0)).unwrap()
    }

    fn depth_field(res: usize, cells: &[(usize, usize, f32)]) -> CarveDepthField {
        let mut field = CarveDepthField::new(res);
        for &(x, z, d) in cells {
            field.set(x, z, d);
        }
        field
    }

    #[test]
    fn carve_lowers_by_depth_over_vertical_size() {
        let grid = HeightGrid::flat(metadata(5, 10.0), 0.5);
        let depth = depth_field(5, &[(2, 2, 1.0)]);
        let out = carve(&grid, &depth, &EditRegion::full(5)).unwrap();
        assert!((out.get(2, 2) - 0.4).abs() < 1e-6);
        assert_eq!(out.get(1, 2), 0.5);
    }

    #[test]
    fn carve_never_goes_negative() {
        let grid = HeightGrid::flat(metadata(5, 10.0), 0.05);
        let depth = depth_field(5, &[(2, 2, 1.0), (0, 0, 30.0)]);
        let out = carve(&grid, &depth, &EditRegion::full(5)).unwrap();
        assert_eq!(out.get(2, 2), 0.0);
        assert_eq!(out.get(0, 0), 0.0);
        assert!(out.heights().iter().all(|&h| h >= 0.0));
    }

    #[test]
    fn carve_ignores_cells_outside_region() {
        let grid = HeightGrid::flat(metadata(5, 10.0), 0.5);
        let depth = depth_field(5, &[(4, 4, 2.0)]);
        let mut region = EditRegion::empty(5);
        region.include_box(0, 0, 2, 2);
        let out = carve(&grid, &depth, &region).unwrap();
        assert_eq!(out, grid);
    }

    #[test]
    fn negative_delta_only_applies_just_the_drop() {
        let params = BlendParams {
            flags: BlendFlags::NEGATIVE_DELTA_ONLY,
            delta_scale: 1.0,
        };
        assert!((blend_cell(0.5, 0.3, 1.0, params) - 0.3).abs() < 1e-12);
        assert_eq!(blend_cell(0.5, 0.7, 1.0, params), 0.5);

        let half = BlendParams {
            delta_scale: 0.5,
            ..params
        };
        assert!((blend_cell(0.5, 0.3, 1.0, half) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn plain_blend_lerps_by_mask() {
        let params = BlendParams::default();
        assert!((blend_cell(0.2, 0.6, 0.25, params) - 0.3).abs() < 1e-12);
        assert!((blend_cell(0.6, 0.2, 0.0, params) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn only_lower_never_exceeds_baseline() {
        let meta = metadata(6, 1.0);
        let baseline = HeightGrid::from_fn(meta, |x, z| 0.1 + 0.1 * ((x + z) % 5) as f32);
        let eroded = HeightGrid::from_fn(meta, |x, z| 0.1 * ((x * 3 + z) % 9) as f32);
        let mask = CorridorMask::filled(6);
        let params = BlendParams {
            flags: BlendFlags::ONLY_LOWER,
            delta_scale: 1.0,
        };
        let out = blend(&baseline, &eroded, &mask, None, params).unwrap();
        for (o, b) in out.heights().iter().zip(baseline.heights()) {
            assert!(o <= b);
        }
    }

    #[test]
    fn blend_rejects_mismatched_shapes() {
        let baseline = HeightGrid::flat(metadata(6, 1.0), 0.5);
        let eroded = HeightGrid::flat(metadata(7, 1.0), 0.5);
        let mask = CorridorMask::filled(6);
        let err = blend(&baseline, &eroded, &mask, None, BlendParams::default()).unwrap_err();
        assert!(matches!(err, CorridorError::Configuration(_)));
    }

    #[test]
    fn smoothing_spreads_a_spike() {
        let meta = metadata(5, 1.0);
        let mut grid = HeightGrid::new(meta);
        grid.set(2, 2, 0.9);
        let params = SmoothParams {
            radius: 1,
            passes: 1,
            zero_grid_edges: false,
        };
        let out = smooth(&grid, None, params);
        assert!((out.get(2, 2) - 0.1).abs() < 1e-6);
        assert!((out.get(1, 1) - 0.1).abs() < 1e-6);
        assert_eq!(out.get(0, 0), 0.0);
    }

    #[test]
    fn smoothing_can_be_confined_to_region() {
        let meta = metadata(6, 1.0);
        let grid = HeightGrid::from_fn(meta, |x, _| if x % 2 == 0 { 1.0 } else { 0.0 });
        let mut region = EditRegion::empty(6);
        region.include_box(1, 1, 2, 2);
        let params = SmoothParams {
            radius: 1,
            passes: 2,
            zero_grid_edges: false,
        };
        let out = smooth(&grid, Some(&region), params);
        for z in 0..6 {
            for x in 0..6 {
                if !region.contains(x, z) {
                    assert_eq!(out.get(x as i64, z as i64), grid.get(x as i64, z as i64));
                }
            }
        }
        assert_ne!(out.get(1, 1), grid.get(1, 1));
    }

    #[test]
    fn zero_edges_policy_clears_grid_border() {
        let meta = metadata(5, 1.0);
        let grid = HeightGrid::flat(meta, 0.8);
        let params = SmoothParams {
            radius: 1,
            passes: 1,
            zero_grid_edges: true,
        };
        let out = smooth(&grid, None, params);
        for i in 0..5 {
            assert_eq!(out.get(i, 0), 0.0);
            assert_eq!(out.get(i, 4), 0.0);
            assert_eq!(out.get(0, i), 0.0);
            assert_eq!(out.get(4, i), 0.0);
        }
        assert!((out.get(2, 2) - 0.8).abs() < 1e-6);
    }
}
