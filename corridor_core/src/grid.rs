use bevy::math::{DVec2, DVec3};

use crate::error::{CorridorError, CorridorResult};
use crate::mapper::{GridMapper, GridMetadata};

/// Square grid of heights normalized to `[0, 1]` by the vertical size.
///
/// Rows run along z: the value for cell `(x, z)` lives at `z * resolution + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightGrid {
    metadata: GridMetadata,
    heights: Vec<f32>,
}

impl HeightGrid {
    pub fn new(metadata: GridMetadata) -> Self {
        Self::flat(metadata, 0.0)
    }

    pub fn flat(metadata: GridMetadata, value: f32) -> Self {
        Self {
            metadata,
            heights: vec![value.clamp(0.0, 1.0); metadata.cell_count()],
        }
    }

    /// Wraps host heights. Non-finite values are rejected; the rest are
    /// clamped to `[0, 1]`.
    pub fn from_heights(metadata: GridMetadata, mut heights: Vec<f32>) -> CorridorResult<Self> {
        if heights.len() != metadata.cell_count() {
            return Err(CorridorError::configuration(format!(
                "expected {} heights for a {}x{} grid, got {}",
                metadata.cell_count(),
                metadata.resolution,
                metadata.resolution,
                heights.len()
            )));
        }
        if let Some(idx) = heights.iter().position(|h| !h.is_finite()) {
            return Err(CorridorError::configuration(format!(
                "height at cell ({}, {}) is not finite",
                idx % metadata.resolution,
                idx / metadata.resolution
            )));
        }
        for h in &mut heights {
            *h = h.clamp(0.0, 1.0);
        }
        Ok(Self { metadata, heights })
    }

    /// Builds a grid cell by cell. Values are clamped to `[0, 1]`; NaN becomes 0.
    pub fn from_fn(metadata: GridMetadata, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let res = metadata.resolution;
        let mut heights = Vec::with_capacity(metadata.cell_count());
        for z in 0..res {
            for x in 0..res {
                let h = f(x, z);
                heights.push(if h.is_nan() { 0.0 } else { h.clamp(0.0, 1.0) });
            }
        }
        Self { metadata, heights }
    }

    #[inline]
    pub fn metadata(&self) -> GridMetadata {
        self.metadata
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.metadata.resolution
    }

    pub fn mapper(&self) -> GridMapper {
        self.metadata.mapper()
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn heights_mut(&mut self) -> &mut [f32] {
        &mut self.heights
    }

    #[inline]
    pub fn index(&self, x: usize, z: usize) -> usize {
        debug_assert!(x < self.resolution() && z < self.resolution());
        z * self.resolution() + x
    }

    /// Height at a cell; coordinates are clamped into the grid.
    #[inline]
    pub fn get(&self, ix: i64, iz: i64) -> f32 {
        let (x, z) = self.clamp(ix, iz);
        self.heights[self.index(x, z)]
    }

    /// Writes a cell; coordinates are clamped into the grid.
    #[inline]
    pub fn set(&mut self, ix: i64, iz: i64, value: f32) {
        let (x, z) = self.clamp(ix, iz);
        let idx = self.index(x, z);
        self.heights[idx] = value;
    }

    #[inline]
    fn clamp(&self, ix: i64, iz: i64) -> (usize, usize) {
        let max = (self.resolution() - 1) as i64;
        (ix.clamp(0, max) as usize, iz.clamp(0, max) as usize)
    }

    pub fn world_height(&self, ix: i64, iz: i64) -> f64 {
        self.get(ix, iz) as f64 * self.metadata.vertical_size()
    }

    pub fn same_shape(&self, other: &HeightGrid) -> bool {
        self.metadata == other.metadata
    }

    pub fn ensure_same_shape(&self, other: &HeightGrid, what: &str) -> CorridorResult<()> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(CorridorError::configuration(format!(
                "{what} grid shape {:?} does not match {:?}",
                other.metadata, self.metadata
            )))
        }
    }

    /// Bilinear normalized height at fractional cell coordinates, clamped to the grid.
    pub fn sample_cell(&self, cell: DVec2) -> f64 {
        let last = (self.resolution() - 1) as f64;
        let fx = cell.x.clamp(0.0, last);
        let fz = cell.y.clamp(0.0, last);
        let x0 = fx.floor() as i64;
        let z0 = fz.floor() as i64;
        let tx = fx - x0 as f64;
        let tz = fz - z0 as f64;

        let h00 = self.get(x0, z0) as f64;
        let h10 = self.get(x0 + 1, z0) as f64;
        let h01 = self.get(x0, z0 + 1) as f64;
        let h11 = self.get(x0 + 1, z0 + 1) as f64;

        let a = h00 + (h10 - h00) * tx;
        let b = h01 + (h11 - h01) * tx;
        a + (b - a) * tz
    }

    pub fn min_max(&self) -> (f32, f32) {
        self.heights
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &h| (lo.min(h), hi.max(h)))
    }
}

/// Surface queries the descent tracer needs from the terrain.
pub trait SurfaceSampler {
    fn metadata(&self) -> GridMetadata;

    /// Surface height in world meters at a world x/z position.
    fn sample_height(&self, world_xz: DVec2) -> f64;

    /// Unit surface normal at a normalized footprint position in `[0, 1]²`.
    fn sample_normal(&self, uv: DVec2) -> DVec3;
}

impl SurfaceSampler for HeightGrid {
    fn metadata(&self) -> GridMetadata {
        self.metadata
    }

    fn sample_height(&self, world_xz: DVec2) -> f64 {
        let cell = self.mapper().world_to_cell_f(world_xz);
        self.sample_cell(cell) * self.metadata.vertical_size()
    }

    fn sample_normal(&self, uv: DVec2) -> DVec3 {
        let last = (self.resolution() - 1) as f64;
        let cell = uv * last;
        let spacing = self.mapper().cell_size();
        let vertical = self.metadata.vertical_size();

        let left = self.sample_cell(cell - DVec2::X) * vertical;
        let right = self.sample_cell(cell + DVec2::X) * vertical;
        let down = self.sample_cell(cell - DVec2::Y) * vertical;
        let up = self.sample_cell(cell + DVec2::Y) * vertical;

        let ddx = (right - left) / (2.0 * spacing.x);
        let ddz = (up - down) / (2.0 * spacing.y);
        DVec3::new(-ddx, 1.0, -ddz).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(res: usize) -> GridMetadata {
        GridMetadata::new(res, DVec2::ZERO, DVec3::new(4.0, 10.0, 4.0)).unwrap()
    }

    #[test]
    fn reads_and_writes_are_clamped() {
        let mut grid = HeightGrid::new(metadata(5));
        grid.set(-3, 99, 0.75);
        assert_eq!(grid.get(0, 4), 0.75);
        assert_eq!(grid.get(-1, 7), 0.75);
    }

    #[test]
    fn bilinear_sampling_interpolates_between_cells() {
        let grid = HeightGrid::from_fn(metadata(5), |x, _| x as f32 * 0.25);
        assert!((grid.sample_cell(DVec2::new(1.5, 2.0)) - 0.375).abs() < 1e-9);
        assert!((grid.sample_height(DVec2::new(2.0, 1.0)) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn normal_points_away_from_slope() {
        // Heights rise with x, so the normal tilts towards -x.
        let grid = HeightGrid::from_fn(metadata(5), |x, _| x as f32 * 0.1);
        let n = grid.sample_normal(DVec2::new(0.5, 0.5));
        assert!(n.x < 0.0);
        assert!(n.z.abs() < 1e-9);
        assert!((n.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn flat_grid_normal_is_up() {
        let grid = HeightGrid::flat(metadata(4), 0.3);
        let n = grid.sample_normal(DVec2::new(0.2, 0.9));
        assert!((n - DVec3::Y).length() < 1e-12);
    }

    #[test]
    fn from_heights_rejects_wrong_length() {
        assert!(HeightGrid::from_heights(metadata(3), vec![0.0; 8]).is_err());
    }

    #[test]
    fn from_heights_rejects_non_finite_and_clamps_range() {
        let mut heights = vec![0.5; 9];
        heights[4] = f32::NAN;
        assert!(matches!(
            HeightGrid::from_heights(metadata(3), heights),
            Err(CorridorError::Configuration(_))
        ));

        let mut heights = vec![0.5; 9];
        heights[2] = f32::INFINITY;
        assert!(HeightGrid::from_heights(metadata(3), heights).is_err());

        let mut heights = vec![0.5; 9];
        heights[0] = 1.5;
        heights[8] = -0.25;
        let grid = HeightGrid::from_heights(metadata(3), heights).unwrap();
        assert_eq!(grid.get(0, 0), 1.0);
        assert_eq!(grid.get(2, 2), 0.0);
        assert_eq!(grid.get(1, 1), 0.5);
    }

    #[test]
    fn from_fn_clamps_and_zeroes_nan() {
        let grid = HeightGrid::from_fn(metadata(3), |x, _| match x {
            0 => f32::NAN,
            1 => 2.0,
            _ => -1.0,
        });
        assert_eq!(grid.get(0, 1), 0.0);
        assert_eq!(grid.get(1, 1), 1.0);
        assert_eq!(grid.get(2, 1), 0.0);
    }
}
