//! Host grid storage boundary and region-bounded write-back.

use crate::error::{CorridorError, CorridorResult};
use crate::grid::HeightGrid;
use crate::mapper::GridMetadata;
use crate::region::EditRegion;

/// Rectangular block of normalized heights, row-major along z.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightBlock {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f32>,
}

impl HeightBlock {
    #[inline]
    pub fn get(&self, x: usize, z: usize) -> f32 {
        self.values[z * self.width + x]
    }
}

/// Read/write access to the host's height storage.
pub trait GridStorage {
    /// Resolution, placement and vertical scale. Queried once per operation.
    fn metadata(&self) -> GridMetadata;

    fn get_heights(&self, x0: usize, z0: usize, width: usize, height: usize) -> HeightBlock;

    fn set_heights(&mut self, x0: usize, z0: usize, block: &HeightBlock);

    /// Called after a write that altered at least one height.
    fn heights_changed(&mut self, _area: WrittenArea) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrittenArea {
    Region(EditRegion),
    Full,
}

impl WrittenArea {
    fn bounds(&self, resolution: usize) -> (usize, usize, usize, usize) {
        match self {
            WrittenArea::Region(region) => {
                (region.min_x, region.min_z, region.width(), region.height())
            }
            WrittenArea::Full => (0, 0, resolution, resolution),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteBackReport {
    pub area: WrittenArea,
    pub cells_written: usize,
    /// True when any written height differs from what storage held before.
    pub changed: bool,
}

/// Reads the whole grid out of storage.
pub fn read_grid<S: GridStorage + ?Sized>(storage: &S) -> CorridorResult<HeightGrid> {
    let metadata = storage.metadata();
    let res = metadata.resolution;
    let block = storage.get_heights(0, 0, res, res);
    HeightGrid::from_heights(metadata, block.values)
}

pub fn extract_block(
    grid: &HeightGrid,
    x0: usize,
    z0: usize,
    width: usize,
    height: usize,
) -> HeightBlock {
    let mut values = Vec::with_capacity(width * height);
    for z in z0..z0 + height {
        let start = grid.index(x0, z);
        values.extend_from_slice(&grid.heights()[start..start + width]);
    }
    HeightBlock {
        width,
        height,
        values,
    }
}

/// Writes `edited` back into storage.
///
/// Only the region's sub-block is written when the region is non-empty, not
/// already the whole grid, and `apply_full` is off.
pub fn write_back<S: GridStorage + ?Sized>(
    storage: &mut S,
    edited: &HeightGrid,
    region: &EditRegion,
    apply_full: bool,
) -> CorridorResult<WriteBackReport> {
    let metadata = storage.metadata();
    if metadata != edited.metadata() {
        return Err(CorridorError::configuration(format!(
            "edited grid {:?} does not match storage {:?}",
            edited.metadata(),
            metadata
        )));
    }
    if region.resolution() != metadata.resolution {
        return Err(CorridorError::configuration(format!(
            "edit region resolution {} does not match storage resolution {}",
            region.resolution(),
            metadata.resolution
        )));
    }

    let area = if !region.is_empty() && !region.is_full() && !apply_full {
        WrittenArea::Region(*region)
    } else {
        WrittenArea::Full
    };
    let (x0, z0, width, height) = area.bounds(metadata.resolution);
    let block = extract_block(edited, x0, z0, width, height);
    let previous = storage.get_heights(x0, z0, width, height);
    let changed = previous.values != block.values;

    storage.set_heights(x0, z0, &block);
    if changed {
        storage.heights_changed(area);
    }

    tracing::debug!(
        target: "corridor::storage",
        x0,
        z0,
        width,
        height,
        changed,
        "write_back.applied"
    );

    Ok(WriteBackReport {
        area,
        cells_written: width * height,
        changed,
    })
}

/// In-memory storage that counts change notifications.
#[derive(Debug, Clone)]
pub struct MemoryGridStorage {
    grid: HeightGrid,
    revision: u64,
    cells_written: usize,
}

impl MemoryGridStorage {
    pub fn new(grid: HeightGrid) -> Self {
        Self {
            grid,
            revision: 0,
            cells_written: 0,
        }
    }

    pub fn grid(&self) -> &HeightGrid {
        &self.grid
    }

    pub fn into_grid(self) -> HeightGrid {
        self.grid
    }

    /// Number of change notifications received.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Total cells written over the storage's lifetime.
    pub fn cells_written(&self) -> usize {
        self.cells_written
    }
}

impl GridStorage for MemoryGridStorage {
    fn metadata(&self) -> GridMetadata {
        self.grid.metadata()
    }

    fn get_heights(&self, x0: usize, z0: usize, width: usize, height: usize) -> HeightBlock {
        let res = self.grid.resolution();
        let x0 = x0.min(res);
        let z0 = z0.min(res);
        let width = width.min(res - x0);
        let height = height.min(res - z0);
        extract_block(&self.grid, x0, z0, width, height)
    }

    fn set_heights(&mut self, x0: usize, z0: usize, block: &HeightBlock) {
        let res = self.grid.resolution();
        for z in 0..block.height {
            for x in 0..block.width {
                let (gx, gz) = (x0 + x, z0 + z);
                if gx < res && gz < res {
                    let idx = self.grid.index(gx, gz);
                    self.grid.heights_mut()[idx] = block.get(x, z);
                    self.cells_written += 1;
                }
            }
        }
    }

    fn heights_changed(&mut self, _area: WrittenArea) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::{DVec2, DVec3};

    fn metadata() -> GridMetadata {
        GridMetadata::new(6, DVec2::ZERO, DVec3::new(5.0, 1.0, 5.0)).unwrap()
    }

    #[test]
    fn region_write_touches_only_sub_block() {
        let mut storage = MemoryGridStorage::new(HeightGrid::flat(metadata(), 0.5));
        let edited = HeightGrid::flat(metadata(), 0.2);
        let mut region = EditRegion::empty(6);
        region.include_box(1, 2, 3, 3);

        let report = write_back(&mut storage, &edited, &region, false).unwrap();
        assert_eq!(report.area, WrittenArea::Region(region));
        assert_eq!(report.cells_written, 6);
        assert!(report.changed);
        assert_eq!(storage.revision(), 1);
        assert_eq!(storage.cells_written(), 6);

        let grid = storage.grid();
        for z in 0..6 {
            for x in 0..6 {
                let expected = if region.contains(x, z) { 0.2 } else { 0.5 };
                assert_eq!(grid.get(x as i64, z as i64), expected);
            }
        }
    }

    #[test]
    fn empty_region_or_apply_full_writes_everything() {
        let mut storage = MemoryGridStorage::new(HeightGrid::flat(metadata(), 0.5));
        let edited = HeightGrid::flat(metadata(), 0.1);
        let report = write_back(&mut storage, &edited, &EditRegion::empty(6), false).unwrap();
        assert_eq!(report.area, WrittenArea::Full);
        assert_eq!(report.cells_written, 36);

        let mut region = EditRegion::empty(6);
        region.include_cell(0, 0);
        let report = write_back(&mut storage, &edited, &region, true).unwrap();
        assert_eq!(report.area, WrittenArea::Full);
        assert!(!report.changed);
        assert_eq!(storage.revision(), 1);
    }

    #[test]
    fn mismatched_grid_is_rejected_without_writing() {
        let mut storage = MemoryGridStorage::new(HeightGrid::flat(metadata(), 0.5));
        let other =
            GridMetadata::new(7, DVec2::ZERO, DVec3::new(5.0, 1.0, 5.0)).unwrap();
        let edited = HeightGrid::flat(other, 0.1);
        assert!(write_back(&mut storage, &edited, &EditRegion::full(7), false).is_err());
        assert_eq!(storage.cells_written(), 0);
    }

    #[test]
    fn read_grid_round_trips_storage() {
        let grid = HeightGrid::from_fn(metadata(), |x, z| (x * 6 + z) as f32 / 36.0);
        let storage = MemoryGridStorage::new(grid.clone());
        assert_eq!(read_grid(&storage).unwrap(), grid);
    }

    #[test]
    fn read_grid_rejects_non_finite_storage() {
        let mut storage = MemoryGridStorage::new(HeightGrid::flat(metadata(), 0.5));
        let poisoned = HeightBlock {
            width: 1,
            height: 1,
            values: vec![f32::NAN],
        };
        storage.set_heights(3, 2, &poisoned);
        assert!(matches!(
            read_grid(&storage),
            Err(CorridorError::Configuration(_))
        ));
    }
}
