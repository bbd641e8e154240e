//! World ↔ cell conversion for a square height grid.
//!
//! Cells sit on the grid's sample points: cell `0` is at `origin`, cell
//! `resolution - 1` is at `origin + size`. The mapper never clamps; callers
//! decide how out-of-range coordinates are handled.

use bevy::math::{DVec2, DVec3};

use crate::error::{CorridorError, CorridorResult};

/// Read-only description of a grid, queried once per operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetadata {
    pub resolution: usize,
    /// World-space x/z of cell `(0, 0)`.
    pub origin: DVec2,
    /// World width (x), vertical scale (y) and depth (z).
    pub size: DVec3,
}

impl GridMetadata {
    pub fn new(resolution: usize, origin: DVec2, size: DVec3) -> CorridorResult<Self> {
        if resolution < 2 {
            return Err(CorridorError::configuration(format!(
                "grid resolution must be at least 2, got {resolution}"
            )));
        }
        if !(size.x > 0.0 && size.z > 0.0) {
            return Err(CorridorError::configuration(format!(
                "grid footprint must be positive, got {}x{}",
                size.x, size.z
            )));
        }
        if size.y <= 0.0 {
            return Err(CorridorError::configuration(format!(
                "grid vertical size must be positive, got {}",
                size.y
            )));
        }
        Ok(Self {
            resolution,
            origin,
            size,
        })
    }

    #[inline]
    pub fn vertical_size(&self) -> f64 {
        self.size.y
    }

    #[inline]
    pub fn footprint(&self) -> DVec2 {
        DVec2::new(self.size.x, self.size.z)
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.resolution * self.resolution
    }

    pub fn mapper(&self) -> GridMapper {
        GridMapper::new(self)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GridMapper {
    origin: DVec2,
    extent: DVec2,
    last: f64,
    resolution: usize,
}

impl GridMapper {
    pub fn new(metadata: &GridMetadata) -> Self {
        Self {
            origin: metadata.origin,
            extent: metadata.footprint(),
            last: (metadata.resolution - 1) as f64,
            resolution: metadata.resolution,
        }
    }

    /// Position in `[0, 1]²` across the footprint (unclamped).
    #[inline]
    pub fn normalized(&self, world_xz: DVec2) -> DVec2 {
        (world_xz - self.origin) / self.extent
    }

    /// Fractional cell coordinates (unclamped).
    #[inline]
    pub fn world_to_cell_f(&self, world_xz: DVec2) -> DVec2 {
        self.normalized(world_xz) * self.last
    }

    /// Nearest cell to a world position (unclamped).
    pub fn world_to_cell(&self, world_xz: DVec2) -> (i64, i64) {
        let cell = self.world_to_cell_f(world_xz);
        (cell.x.round() as i64, cell.y.round() as i64)
    }

    pub fn cell_to_world(&self, ix: i64, iz: i64) -> DVec2 {
        let t = DVec2::new(ix as f64, iz as f64) / self.last;
        self.origin + self.extent * t
    }

    /// World distance between neighbouring cells along x and z.
    #[inline]
    pub fn cell_size(&self) -> DVec2 {
        self.extent / self.last
    }

    /// Number of whole cells covering `meters` along each axis.
    pub fn meters_to_cells(&self, meters: f64) -> (i64, i64) {
        let cell = self.cell_size();
        (
            (meters.max(0.0) / cell.x).ceil() as i64,
            (meters.max(0.0) / cell.y).ceil() as i64,
        )
    }

    pub fn clamp_cell(&self, ix: i64, iz: i64) -> (usize, usize) {
        let max = (self.resolution - 1) as i64;
        (ix.clamp(0, max) as usize, iz.clamp(0, max) as usize)
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn world_min(&self) -> DVec2 {
        self.origin
    }

    pub fn world_max(&self) -> DVec2 {
        self.origin + self.extent
    }
}
