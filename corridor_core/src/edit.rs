//! Corridor edit pipeline.
//!
//! Every edit is recomputed from the grid it is handed; nothing is carried
//! between calls, so re-running an edit against the same baseline with the
//! same configuration reproduces the same heights.

use crate::centerline::{Centerline, CenterlineSource};
use crate::config::CorridorConfig;
use crate::error::{CorridorError, CorridorResult};
use crate::grid::HeightGrid;
use crate::mapper::GridMetadata;
use crate::mask::{CorridorStamp, MaskBuilder};
use crate::region::EditRegion;
use crate::storage::{read_grid, write_back, GridStorage, WriteBackReport};
use crate::trace::TraceSummary;
use crate::transform::{self, BlendParams, SmoothParams};

/// Result of an in-memory corridor edit.
#[derive(Debug, Clone)]
pub struct CorridorEdit {
    pub grid: HeightGrid,
    pub stamp: CorridorStamp,
    pub centerline: Centerline,
}

impl CorridorEdit {
    fn unchanged(source: &HeightGrid, centerline: Centerline) -> Self {
        Self {
            grid: source.clone(),
            stamp: CorridorStamp::new(source.resolution()),
            centerline,
        }
    }

    pub fn region(&self) -> &EditRegion {
        &self.stamp.region
    }
}

/// What an applied edit did to storage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditReport {
    pub region: EditRegion,
    pub samples: usize,
    pub trace: Option<TraceSummary>,
    /// `None` when the edit touched no cells and storage was left alone.
    pub write: Option<WriteBackReport>,
}

impl EditReport {
    pub fn changed(&self) -> bool {
        self.write.is_some_and(|write| write.changed)
    }
}

/// Runs corridor edits under one validated configuration.
#[derive(Debug, Clone, Copy)]
pub struct CorridorEditor<'c> {
    config: &'c CorridorConfig,
}

impl<'c> CorridorEditor<'c> {
    pub fn new(config: &'c CorridorConfig) -> CorridorResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &'c CorridorConfig {
        self.config
    }

    /// Samples the centerline. Traces run over `surface`.
    pub fn resolve_centerline(
        &self,
        surface: &HeightGrid,
        source: CenterlineSource<'_>,
    ) -> CorridorResult<Centerline> {
        source.resolve(surface, self.config)
    }

    pub fn build_corridor(
        &self,
        metadata: &GridMetadata,
        centerline: &Centerline,
    ) -> CorridorStamp {
        MaskBuilder::new(
            metadata,
            &self.config.corridor,
            &self.config.carve,
            centerline.length,
        )
        .build(&centerline.samples)
    }

    /// Carves a trench along the centerline, starting from `baseline`.
    pub fn carve(
        &self,
        baseline: &HeightGrid,
        source: CenterlineSource<'_>,
    ) -> CorridorResult<CorridorEdit> {
        let centerline = self.resolve_centerline(baseline, source)?;
        if centerline.is_empty() {
            return Ok(CorridorEdit::unchanged(baseline, centerline));
        }
        let stamp = self.build_corridor(&baseline.metadata(), &centerline);
        let grid = transform::carve(baseline, &stamp.depth, &stamp.region)?;
        tracing::debug!(
            target: "corridor::edit",
            samples = centerline.samples.len(),
            region_cells = stamp.region.cell_count(),
            "carve.computed"
        );
        Ok(CorridorEdit {
            grid,
            stamp,
            centerline,
        })
    }

    /// Blends `eroded` over `baseline` inside the corridor.
    pub fn blend(
        &self,
        baseline: &HeightGrid,
        eroded: &HeightGrid,
        source: CenterlineSource<'_>,
    ) -> CorridorResult<CorridorEdit> {
        baseline.ensure_same_shape(eroded, "eroded")?;
        let centerline = self.resolve_centerline(baseline, source)?;
        if centerline.is_empty() {
            return Ok(CorridorEdit::unchanged(baseline, centerline));
        }
        let stamp = self.build_corridor(&baseline.metadata(), &centerline);
        let params = BlendParams {
            flags: self.config.blend.flags(),
            delta_scale: self.config.blend.delta_scale,
        };
        let grid = transform::blend(baseline, eroded, &stamp.mask, Some(&stamp.region), params)?;
        tracing::debug!(
            target: "corridor::edit",
            samples = centerline.samples.len(),
            region_cells = stamp.region.cell_count(),
            flags = ?params.flags,
            "blend.computed"
        );
        Ok(CorridorEdit {
            grid,
            stamp,
            centerline,
        })
    }

    /// Box-blurs `grid`, limited to `region` when confinement is configured.
    pub fn smooth(&self, grid: &HeightGrid, region: Option<&EditRegion>) -> HeightGrid {
        let smooth = &self.config.smooth;
        let region = region.filter(|_| smooth.confine_to_region);
        transform::smooth(
            grid,
            region,
            SmoothParams {
                radius: smooth.radius,
                passes: smooth.passes,
                zero_grid_edges: smooth.zero_grid_edges,
            },
        )
    }

    pub fn apply_carve<S: GridStorage + ?Sized>(
        &self,
        storage: &mut S,
        baseline: &HeightGrid,
        source: CenterlineSource<'_>,
    ) -> CorridorResult<EditReport> {
        ensure_matches_storage(storage, baseline)?;
        let edit = self.carve(baseline, source)?;
        self.commit(storage, edit, "carve")
    }

    pub fn apply_blend<S: GridStorage + ?Sized>(
        &self,
        storage: &mut S,
        baseline: &HeightGrid,
        eroded: &HeightGrid,
        source: CenterlineSource<'_>,
    ) -> CorridorResult<EditReport> {
        ensure_matches_storage(storage, baseline)?;
        let edit = self.blend(baseline, eroded, source)?;
        self.commit(storage, edit, "blend")
    }

    /// Smooths the stored grid. `None` smooths everything.
    pub fn apply_smooth<S: GridStorage + ?Sized>(
        &self,
        storage: &mut S,
        region: Option<&EditRegion>,
    ) -> CorridorResult<EditReport> {
        let current = read_grid(storage)?;
        if let Some(region) = region {
            if region.resolution() != current.resolution() {
                return Err(CorridorError::configuration(format!(
                    "smooth region resolution {} does not match grid resolution {}",
                    region.resolution(),
                    current.resolution()
                )));
            }
        }
        let grid = self.smooth(&current, region);

        // Unconfined smoothing and edge zeroing reach outside any region.
        let smooth = &self.config.smooth;
        let written = match region {
            Some(region) if smooth.confine_to_region && !smooth.zero_grid_edges => *region,
            _ => EditRegion::full(current.resolution()),
        };
        let write = write_back(storage, &grid, &written, self.config.write_back.apply_full)?;
        tracing::info!(
            target: "corridor::edit",
            cells = write.cells_written,
            changed = write.changed,
            "smooth.applied"
        );
        Ok(EditReport {
            region: written,
            samples: 0,
            trace: None,
            write: Some(write),
        })
    }

    fn commit<S: GridStorage + ?Sized>(
        &self,
        storage: &mut S,
        edit: CorridorEdit,
        operation: &'static str,
    ) -> CorridorResult<EditReport> {
        let region = edit.stamp.region;
        let samples = edit.centerline.samples.len();
        let trace = edit.centerline.trace;
        if region.is_empty() {
            tracing::info!(
                target: "corridor::edit",
                operation,
                samples,
                "edit.skipped=empty_region"
            );
            return Ok(EditReport {
                region,
                samples,
                trace,
                write: None,
            });
        }

        let write = write_back(storage, &edit.grid, &region, self.config.write_back.apply_full)?;
        tracing::info!(
            target: "corridor::edit",
            operation,
            samples,
            cells = write.cells_written,
            changed = write.changed,
            "edit.applied"
        );
        Ok(EditReport {
            region,
            samples,
            trace,
            write: Some(write),
        })
    }
}

fn ensure_matches_storage<S: GridStorage + ?Sized>(
    storage: &S,
    grid: &HeightGrid,
) -> CorridorResult<()> {
    let metadata = storage.metadata();
    if metadata == grid.metadata() {
        Ok(())
    } else {
        Err(CorridorError::configuration(format!(
            "baseline grid {:?} does not match storage {:?}",
            grid.metadata(),
            metadata
        )))
    }
}
