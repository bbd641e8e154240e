//! Rasterizes centerline samples into a corridor influence mask.
//!
//! Every stamp max-accumulates, so the finished mask does not depend on the
//! order samples are applied in.

use bevy::math::DVec2;

use crate::centerline::PathSample;
use crate::config::{CarveConfig, CorridorShapeConfig};
use crate::mapper::{GridMapper, GridMetadata};
use crate::noise::{lerp, smoothstep, EdgeJitter};
use crate::region::EditRegion;

const FALLOFF_EPSILON: f64 = 1e-9;
const FADE_EPSILON: f64 = 1e-9;

/// Per-cell corridor influence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorridorMask {
    resolution: usize,
    weights: Vec<f32>,
}

impl CorridorMask {
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution,
            weights: vec![0.0; resolution * resolution],
        }
    }

    /// Mask of ones over the whole grid.
    pub fn filled(resolution: usize) -> Self {
        Self {
            resolution,
            weights: vec![1.0; resolution * resolution],
        }
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    #[inline]
    pub fn get(&self, x: usize, z: usize) -> f32 {
        self.weights[z * self.resolution + x]
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    fn accumulate(&mut self, idx: usize, weight: f32) {
        let slot = &mut self.weights[idx];
        *slot = slot.max(weight.clamp(0.0, 1.0));
    }

    pub fn nonzero_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let res = self.resolution;
        self.weights
            .iter()
            .enumerate()
            .filter(|(_, &w)| w > 0.0)
            .map(move |(idx, _)| (idx % res, idx / res))
    }

    /// Iterative 3×3 average with edge-clamped neighbours.
    ///
    /// Each pass can spread influence one cell outward, so `region` is widened
    /// by one cell per pass and only cells inside it are recomputed.
    pub fn blur(&mut self, iterations: u32, region: &mut EditRegion) {
        let res = self.resolution;
        let last = res as i64 - 1;
        for _ in 0..iterations {
            if region.is_empty() {
                return;
            }
            region.expand(1);
            let source = self.weights.clone();
            for (x, z) in region.cells() {
                let mut sum = 0.0f32;
                for dz in -1i64..=1 {
                    for dx in -1i64..=1 {
                        let nx = (x as i64 + dx).clamp(0, last) as usize;
                        let nz = (z as i64 + dz).clamp(0, last) as usize;
                        sum += source[nz * res + nx];
                    }
                }
                self.weights[z * res + x] = (sum / 9.0).clamp(0.0, 1.0);
            }
        }
    }
}

/// Per-cell carve depth in world meters, max-accumulated like the mask.
#[derive(Debug, Clone, PartialEq)]
pub struct CarveDepthField {
    resolution: usize,
    depths: Vec<f32>,
}

impl CarveDepthField {
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution,
            depths: vec![0.0; resolution * resolution],
        }
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    #[inline]
    pub fn get(&self, x: usize, z: usize) -> f32 {
        self.depths[z * self.resolution + x]
    }

    pub fn depths(&self) -> &[f32] {
        &self.depths
    }

    /// Overwrites one cell's depth in meters.
    pub fn set(&mut self, x: usize, z: usize, depth: f32) {
        self.depths[z * self.resolution + x] = depth.max(0.0);
    }

    #[inline]
    fn accumulate(&mut self, idx: usize, depth: f32) {
        let slot = &mut self.depths[idx];
        *slot = slot.max(depth.max(0.0));
    }

    pub fn max_depth(&self) -> f32 {
        self.depths.iter().copied().fold(0.0, f32::max)
    }
}

/// Everything one pass over a centerline produces.
#[derive(Debug, Clone)]
pub struct CorridorStamp {
    pub mask: CorridorMask,
    pub depth: CarveDepthField,
    pub region: EditRegion,
}

impl CorridorStamp {
    pub fn new(resolution: usize) -> Self {
        Self {
            mask: CorridorMask::new(resolution),
            depth: CarveDepthField::new(resolution),
            region: EditRegion::empty(resolution),
        }
    }
}

/// Cross-section weight: 1 inside the half width, smoothstep falloff beyond it.
pub fn falloff_weight(dist_across: f64, half_width: f64, falloff: f64) -> f64 {
    if dist_across <= half_width {
        1.0
    } else if falloff > FALLOFF_EPSILON && dist_across <= half_width + falloff {
        1.0 - smoothstep((dist_across - half_width) / falloff)
    } else {
        0.0
    }
}

/// Blend between a linear (`softness = 0`) and smoothstep (`softness = 1`) ramp.
pub fn carve_profile(t: f64, softness: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    lerp(t, smoothstep(t), softness.clamp(0.0, 1.0))
}

pub struct MaskBuilder<'a> {
    mapper: GridMapper,
    resolution: usize,
    shape: &'a CorridorShapeConfig,
    carve: &'a CarveConfig,
    jitter: Option<EdgeJitter>,
    path_length: f64,
}

impl<'a> MaskBuilder<'a> {
    pub fn new(
        metadata: &GridMetadata,
        shape: &'a CorridorShapeConfig,
        carve: &'a CarveConfig,
        path_length: f64,
    ) -> Self {
        Self {
            mapper: metadata.mapper(),
            resolution: metadata.resolution,
            shape,
            carve,
            jitter: EdgeJitter::from_config(&shape.edge_jitter),
            path_length: path_length.max(0.0),
        }
    }

    /// Effective half width at a sample after profile scaling and jitter.
    pub fn half_width_at(&self, sample: &PathSample) -> f64 {
        let mut half_width =
            self.shape.half_width_meters * self.shape.width_profile.evaluate(sample.u);
        if let Some(jitter) = &self.jitter {
            half_width += jitter.offset(sample.position_xz());
        }
        half_width.max(self.shape.min_half_width_meters)
    }

    /// Longitudinal fade-in/out from each end of the path.
    pub fn fade(&self, u: f64) -> f64 {
        let ramp = |distance: f64, span: f64| {
            if span <= FADE_EPSILON {
                1.0
            } else {
                (distance / span).clamp(0.0, 1.0)
            }
        };
        let start = ramp(u * self.path_length, self.shape.start_fade_meters);
        let end = ramp((1.0 - u) * self.path_length, self.shape.end_fade_meters);
        start.min(end)
    }

    pub fn carve_depth_at(&self, u: f64) -> f64 {
        self.carve.max_depth_meters * self.carve.depth_profile.evaluate(u)
    }

    /// Rasterizes one sample into `stamp`.
    pub fn stamp(&self, sample: &PathSample, stamp: &mut CorridorStamp) {
        let half_width = self.half_width_at(sample);
        let falloff = self.shape.falloff_meters.max(0.0);
        let radius = half_width + falloff + self.shape.box_padding_meters.max(0.0);
        let (rx, rz) = self.mapper.meters_to_cells(radius);
        let center = sample.position_xz();
        let (cx, cz) = self.mapper.world_to_cell(center);

        let last = self.resolution as i64 - 1;
        let (x0, x1) = (cx - rx, cx + rx);
        let (z0, z1) = (cz - rz, cz + rz);
        if x1 < 0 || z1 < 0 || x0 > last || z0 > last {
            return;
        }
        stamp.region.include_box(x0, z0, x1, z1);

        let fade = self.fade(sample.u);
        if fade <= 0.0 {
            return;
        }
        let depth = self.carve_depth_at(sample.u) * fade;
        let left = sample.left_xz();
        let softness = self.shape.edge_softness;

        for z in z0.max(0)..=z1.min(last) {
            for x in x0.max(0)..=x1.min(last) {
                let cell: DVec2 = self.mapper.cell_to_world(x, z);
                let dist_across = (cell - center).dot(left).abs();
                let idx = z as usize * self.resolution + x as usize;

                let weight = falloff_weight(dist_across, half_width, falloff) * fade;
                if weight > 0.0 {
                    stamp.mask.accumulate(idx, weight as f32);
                }
                if depth > 0.0 && dist_across < half_width {
                    let s = carve_profile(1.0 - dist_across / half_width, softness);
                    stamp.depth.accumulate(idx, (depth * s) as f32);
                }
            }
        }
    }

    /// Stamps every sample, then runs the configured blur passes.
    pub fn build(&self, samples: &[PathSample]) -> CorridorStamp {
        let mut stamp = CorridorStamp::new(self.resolution);
        for sample in samples {
            self.stamp(sample, &mut stamp);
        }
        stamp
            .mask
            .blur(self.shape.mask_blur_iterations, &mut stamp.region);
        tracing::debug!(
            target: "corridor::mask",
            samples = samples.len(),
            region_cells = stamp.region.cell_count(),
            max_depth = stamp.depth.max_depth(),
            "mask.built"
        );
        stamp
    }
}
