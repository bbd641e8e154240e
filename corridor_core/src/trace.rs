//! Steepest-descent tracing over a surface.

use bevy::math::{DVec2, DVec3};

use crate::config::TraceConfig;
use crate::grid::SurfaceSampler;

const GRAVITY: DVec3 = DVec3::new(0.0, -1.0, 0.0);
const MIN_HORIZONTAL_STEP: f64 = 1e-9;

/// Why a trace stopped. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceTermination {
    MaxSteps,
    LowSlope,
    /// The horizontal downhill direction or the clamped step vanished.
    NoHorizontalMovement,
    MaxLength,
    StopHeight,
    /// The start point was already at or below the stop height.
    StartBelowStopHeight,
}

#[derive(Debug, Clone)]
pub struct TraceOutcome {
    /// Pre-step positions followed by the final position.
    pub raw_path: Vec<DVec3>,
    /// Loop iterations executed, including low-slope ones.
    pub steps: usize,
    pub traveled_meters: f64,
    pub termination: TraceTermination,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSummary {
    pub steps: usize,
    pub raw_points: usize,
    pub traveled_meters: f64,
    pub termination: TraceTermination,
}

impl TraceOutcome {
    pub fn summary(&self) -> TraceSummary {
        TraceSummary {
            steps: self.steps,
            raw_points: self.raw_path.len(),
            traveled_meters: self.traveled_meters,
            termination: self.termination,
        }
    }
}

/// Walks downhill from `start` in fixed horizontal steps.
///
/// Each iteration projects gravity onto the surface tangent plane. A shallow
/// position keeps the previous heading and counts towards
/// `low_slope_hysteresis`; the walk stops once that many shallow positions
/// happen in a row. A shallow start has no heading and stays in place.
pub fn trace_descent(
    surface: &dyn SurfaceSampler,
    start: DVec2,
    config: &TraceConfig,
) -> TraceOutcome {
    let metadata = surface.metadata();
    let mapper = metadata.mapper();
    let padding = DVec2::splat(config.edge_padding_meters.max(0.0));
    let mut lo = mapper.world_min() + padding;
    let mut hi = mapper.world_max() - padding;
    // Padding wider than half the footprint collapses to the centre line.
    if lo.x > hi.x {
        let mid = (lo.x + hi.x) * 0.5;
        lo.x = mid;
        hi.x = mid;
    }
    if lo.y > hi.y {
        let mid = (lo.y + hi.y) * 0.5;
        lo.y = mid;
        hi.y = mid;
    }

    let mut xz = start;
    let mut height = surface.sample_height(xz);
    let mut raw_path = Vec::new();
    let mut steps = 0usize;
    let mut traveled = 0.0;
    let mut low_slope_run = 0usize;
    let mut heading: Option<DVec2> = None;

    if let Some(stop) = config.stop_height_meters {
        if height <= stop {
            raw_path.push(DVec3::new(xz.x, height, xz.y));
            return TraceOutcome {
                raw_path,
                steps,
                traveled_meters: traveled,
                termination: TraceTermination::StartBelowStopHeight,
            };
        }
    }

    let mut termination = TraceTermination::MaxSteps;
    while steps < config.max_steps {
        steps += 1;

        let normal = surface.sample_normal(mapper.normalized(xz));
        let downhill = GRAVITY - normal * GRAVITY.dot(normal);
        let slope = downhill.length();

        let direction = if slope < config.min_slope {
            low_slope_run += 1;
            if low_slope_run >= config.low_slope_hysteresis {
                termination = TraceTermination::LowSlope;
                break;
            }
            // Coast along the last downhill heading; with none yet, stay put.
            match heading {
                Some(direction) => direction,
                None => continue,
            }
        } else {
            low_slope_run = 0;
            let horizontal = DVec2::new(downhill.x, downhill.z);
            if horizontal.length_squared() < MIN_HORIZONTAL_STEP * MIN_HORIZONTAL_STEP {
                termination = TraceTermination::NoHorizontalMovement;
                break;
            }
            let direction = horizontal.normalize();
            heading = Some(direction);
            direction
        };

        let next = (xz + direction * config.step_size_meters).clamp(lo, hi);
        let moved = next.distance(xz);
        if moved < MIN_HORIZONTAL_STEP {
            if low_slope_run > 0 {
                continue;
            }
            termination = TraceTermination::NoHorizontalMovement;
            break;
        }

        raw_path.push(DVec3::new(xz.x, height, xz.y));
        traveled += moved;
        xz = next;
        height = surface.sample_height(xz);

        if config
            .max_length_meters
            .is_some_and(|max_length| traveled >= max_length)
        {
            termination = TraceTermination::MaxLength;
            break;
        }
        if config.stop_height_meters.is_some_and(|stop| height <= stop) {
            termination = TraceTermination::StopHeight;
            break;
        }
    }
    raw_path.push(DVec3::new(xz.x, height, xz.y));

    tracing::debug!(
        target: "corridor::trace",
        steps,
        points = raw_path.len(),
        traveled,
        termination = ?termination,
        "trace.finished"
    );

    TraceOutcome {
        raw_path,
        steps,
        traveled_meters: traveled,
        termination,
    }
}
