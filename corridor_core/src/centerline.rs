//! Centerline sampling: turns a curve or a descent trace into ordered
//! [`PathSample`]s.

use bevy::math::{DVec2, DVec3};

use crate::config::{CorridorConfig, MIN_SAMPLES_ALONG};
use crate::curve::{CurveBackend, PolylineCurve};
use crate::error::{CorridorError, CorridorResult};
use crate::grid::SurfaceSampler;
use crate::smoothing::smooth_path;
use crate::trace::{trace_descent, TraceSummary};

pub const WORLD_UP: DVec3 = DVec3::Y;
pub const WORLD_LEFT: DVec3 = DVec3::NEG_X;
pub const WORLD_FORWARD: DVec3 = DVec3::Z;

/// Below this squared length a direction is treated as degenerate.
const DEGENERATE_LENGTH_SQUARED: f64 = 1e-6;
const MIN_DIRECTION_LENGTH_SQUARED: f64 = 1e-12;

const MIN_CURVE_LENGTH: f64 = 1e-9;
const MAX_TRACED_SAMPLES: usize = 1 << 16;
const TANGENT_PROBE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    /// Normalized progress along the path.
    pub u: f64,
    pub position: DVec3,
    pub forward: DVec3,
    /// Horizontal unit vector perpendicular to `forward`.
    pub left_dir: DVec3,
}

impl PathSample {
    /// Builds a sample from a raw direction, falling back to world forward when
    /// the direction is degenerate.
    pub fn new(u: f64, position: DVec3, direction: DVec3) -> Self {
        let forward = if direction.length_squared() < MIN_DIRECTION_LENGTH_SQUARED {
            WORLD_FORWARD
        } else {
            direction.normalize()
        };
        Self {
            u,
            position,
            forward,
            left_dir: left_direction(forward),
        }
    }

    #[inline]
    pub fn position_xz(&self) -> DVec2 {
        DVec2::new(self.position.x, self.position.z)
    }

    #[inline]
    pub fn left_xz(&self) -> DVec2 {
        DVec2::new(self.left_dir.x, self.left_dir.z)
    }
}

/// `normalize(up × forward)`, or world left when `forward` is nearly vertical.
pub fn left_direction(forward: DVec3) -> DVec3 {
    let left = WORLD_UP.cross(forward);
    if left.length_squared() < DEGENERATE_LENGTH_SQUARED {
        WORLD_LEFT
    } else {
        left.normalize()
    }
}

/// Ordered samples plus the world length of the path they came from.
#[derive(Debug, Clone, Default)]
pub struct Centerline {
    pub samples: Vec<PathSample>,
    pub length: f64,
    pub trace: Option<TraceSummary>,
}

impl Centerline {
    /// True when there is nothing to build a corridor from.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Where an edit's centerline comes from; chosen once per operation.
#[derive(Clone, Copy)]
pub enum CenterlineSource<'a> {
    Curve(&'a dyn CurveBackend),
    /// Steepest descent over the edit's source surface from a world x/z start.
    Trace { start: DVec2 },
}

impl std::fmt::Debug for CenterlineSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CenterlineSource::Curve(curve) => f
                .debug_struct("Curve")
                .field("length", &curve.length())
                .finish(),
            CenterlineSource::Trace { start } => {
                f.debug_struct("Trace").field("start", start).finish()
            }
        }
    }
}

impl CenterlineSource<'_> {
    pub fn resolve(
        &self,
        surface: &dyn SurfaceSampler,
        config: &CorridorConfig,
    ) -> CorridorResult<Centerline> {
        match *self {
            CenterlineSource::Curve(curve) => sample_curve(curve, config.sampling.samples_along),
            CenterlineSource::Trace { start } => sample_trace(surface, start, config),
        }
    }
}

/// Samples `count` evenly spaced points (`u = i / (count - 1)`).
pub fn sample_curve(curve: &dyn CurveBackend, count: usize) -> CorridorResult<Centerline> {
    if count < MIN_SAMPLES_ALONG {
        return Err(CorridorError::configuration(format!(
            "curve sampling needs at least {MIN_SAMPLES_ALONG} samples, got {count}"
        )));
    }
    let length = curve.length();
    if !(length > MIN_CURVE_LENGTH) {
        return Err(CorridorError::degenerate(format!(
            "curve length {length} leaves no centerline"
        )));
    }

    let samples = (0..count)
        .map(|i| {
            let u = i as f64 / (count - 1) as f64;
            PathSample::new(u, curve.evaluate_position(u), curve_direction(curve, u))
        })
        .collect();

    Ok(Centerline {
        samples,
        length,
        trace: None,
    })
}

fn curve_direction(curve: &dyn CurveBackend, u: f64) -> DVec3 {
    let tangent = curve.evaluate_tangent(u);
    if tangent.length_squared() >= DEGENERATE_LENGTH_SQUARED {
        return tangent;
    }
    let ahead = curve.evaluate_position((u + TANGENT_PROBE).min(1.0));
    let behind = curve.evaluate_position((u - TANGENT_PROBE).max(0.0));
    ahead - behind
}

/// Number of samples that keeps consecutive stamps at most
/// `half_width * spacing_factor` apart. Callers pass the narrowest half width
/// the corridor can take.
pub fn traced_sample_count(length: f64, half_width: f64, spacing_factor: f64) -> usize {
    let spacing = (half_width * spacing_factor).max(f64::EPSILON);
    let needed = (length / spacing).ceil();
    if !needed.is_finite() {
        return MAX_TRACED_SAMPLES;
    }
    (needed as usize + 1).clamp(MIN_SAMPLES_ALONG, MAX_TRACED_SAMPLES)
}

fn sample_trace(
    surface: &dyn SurfaceSampler,
    start: DVec2,
    config: &CorridorConfig,
) -> CorridorResult<Centerline> {
    let outcome = trace_descent(surface, start, &config.trace);
    let summary = outcome.summary();
    let traced = smooth_path(&outcome.raw_path, config.trace.smooth_window_meters);

    if traced.points.len() < 2 {
        tracing::debug!(
            target: "corridor::centerline",
            termination = ?summary.termination,
            "trace.degenerate=single_point"
        );
        return Ok(Centerline {
            trace: Some(summary),
            ..Centerline::default()
        });
    }

    let polyline = PolylineCurve::new(traced.points)?;
    let length = polyline.length();
    if !(length > MIN_CURVE_LENGTH) {
        return Ok(Centerline {
            trace: Some(summary),
            ..Centerline::default()
        });
    }

    let count = traced_sample_count(
        length,
        config.corridor.narrowest_half_width(),
        config.sampling.spacing_factor,
    );
    tracing::debug!(
        target: "corridor::centerline",
        steps = summary.steps,
        length,
        samples = count,
        "trace.sampled"
    );
    let mut centerline = sample_curve(&polyline, count)?;
    centerline.trace = Some(summary);
    Ok(centerline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CatmullRomCurve;
    use crate::grid::HeightGrid;
    use crate::mapper::GridMetadata;
    use crate::profile::ProfileCurve;

    #[test]
    fn left_is_perpendicular_and_horizontal() {
        let forward = DVec3::new(1.0, 0.3, 1.0).normalize();
        let left = left_direction(forward);
        assert!(left.dot(forward).abs() < 1e-12);
        assert!(left.y.abs() < 1e-12);
        assert!((left.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn vertical_forward_falls_back_to_world_left() {
        assert_eq!(left_direction(DVec3::Y), WORLD_LEFT);
        assert_eq!(left_direction(DVec3::new(0.0, -1.0, 1e-5)), WORLD_LEFT);
    }

    #[test]
    fn zero_direction_falls_back_to_world_forward() {
        let sample = PathSample::new(0.0, DVec3::ZERO, DVec3::ZERO);
        assert_eq!(sample.forward, WORLD_FORWARD);
    }

    #[test]
    fn curve_samples_are_evenly_spaced_in_u() {
        let curve = CatmullRomCurve::new(vec![DVec3::ZERO, DVec3::new(30.0, 0.0, 0.0)]).unwrap();
        let centerline = sample_curve(&curve, 16).unwrap();
        assert_eq!(centerline.samples.len(), 16);
        assert_eq!(centerline.samples[0].u, 0.0);
        assert_eq!(centerline.samples[15].u, 1.0);
        assert!((centerline.samples[5].u - 1.0 / 3.0).abs() < 1e-12);
        assert!((centerline.length - 30.0).abs() < 1e-9);
    }

    #[test]
    fn zero_length_curve_is_degenerate() {
        let curve = CatmullRomCurve::new(vec![DVec3::ONE, DVec3::ONE]).unwrap();
        let err = sample_curve(&curve, 8).unwrap_err();
        assert!(matches!(err, CorridorError::DegenerateGeometry(_)));
    }

    #[test]
    fn too_few_samples_is_a_configuration_error() {
        let curve = CatmullRomCurve::new(vec![DVec3::ZERO, DVec3::X]).unwrap();
        assert!(matches!(
            sample_curve(&curve, 3),
            Err(CorridorError::Configuration(_))
        ));
    }

    #[test]
    fn traced_density_bounds_gaps_by_spacing() {
        // 100m path, 4m half width, factor 0.5 -> every 2m -> 51 samples.
        assert_eq!(traced_sample_count(100.0, 4.0, 0.5), 51);
        assert_eq!(traced_sample_count(1.0, 4.0, 0.5), MIN_SAMPLES_ALONG);
    }

    #[test]
    fn traced_samples_are_spaced_by_the_narrowest_width() {
        let metadata =
            GridMetadata::new(33, DVec2::ZERO, DVec3::new(32.0, 32.0, 32.0)).unwrap();
        let grid = HeightGrid::from_fn(metadata, |x, _| 1.0 - x as f32 / 32.0);
        let mut config = CorridorConfig::default();
        config.corridor.half_width_meters = 4.0;
        config.corridor.width_profile = ProfileCurve::linear(0.5, 1.0);
        config.sampling.spacing_factor = 1.0;
        config.trace.smooth_window_meters = 0.0;

        let centerline = CenterlineSource::Trace {
            start: DVec2::new(4.0, 16.0),
        }
        .resolve(&grid, &config)
        .unwrap();
        assert!(centerline.samples.len() > MIN_SAMPLES_ALONG);
        for pair in centerline.samples.windows(2) {
            let gap = pair[0].position.distance(pair[1].position);
            assert!(gap <= 2.0 + 1e-9, "gap {gap} exceeds the narrowest half width");
        }
    }

    #[test]
    fn flat_trace_yields_empty_centerline() {
        let metadata =
            GridMetadata::new(9, DVec2::ZERO, DVec3::new(8.0, 10.0, 8.0)).unwrap();
        let grid = HeightGrid::flat(metadata, 0.5);
        let config = CorridorConfig::default();
        let centerline = CenterlineSource::Trace {
            start: DVec2::new(4.0, 4.0),
        }
        .resolve(&grid, &config)
        .unwrap();
        assert!(centerline.is_empty());
        assert!(centerline.trace.is_some());
    }
}
