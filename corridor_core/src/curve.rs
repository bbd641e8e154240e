//! Curve backends a centerline can be sampled from.

use bevy::math::DVec3;

use crate::error::{CorridorError, CorridorResult};

const LENGTH_STEPS_PER_SEGMENT: usize = 32;

/// Parametric curve over `u ∈ [0, 1]`. Implementations must be deterministic
/// and continuous.
pub trait CurveBackend {
    fn evaluate_position(&self, u: f64) -> DVec3;

    /// Derivative direction at `u`; need not be normalized and may be zero.
    fn evaluate_tangent(&self, u: f64) -> DVec3;

    /// Arc length in world meters.
    fn length(&self) -> f64;
}

/// Uniform Catmull-Rom spline through a list of control points.
#[derive(Debug, Clone)]
pub struct CatmullRomCurve {
    points: Vec<DVec3>,
    length: f64,
}

impl CatmullRomCurve {
    pub fn new(points: Vec<DVec3>) -> CorridorResult<Self> {
        if points.len() < 2 {
            return Err(CorridorError::configuration(format!(
                "spline needs at least 2 control points, got {}",
                points.len()
            )));
        }
        let mut curve = Self {
            points,
            length: 0.0,
        };
        curve.length = curve.measure_length();
        Ok(curve)
    }

    pub fn control_points(&self) -> &[DVec3] {
        &self.points
    }

    fn segment_count(&self) -> usize {
        self.points.len() - 1
    }

    fn point(&self, i: isize) -> DVec3 {
        let n = self.points.len() as isize;
        if i < 0 {
            self.points[0] * 2.0 - self.points[1]
        } else if i >= n {
            self.points[(n - 1) as usize] * 2.0 - self.points[(n - 2) as usize]
        } else {
            self.points[i as usize]
        }
    }

    fn locate(&self, u: f64) -> (isize, f64) {
        let segments = self.segment_count();
        let s = u.clamp(0.0, 1.0) * segments as f64;
        let i = (s.floor() as usize).min(segments - 1);
        (i as isize, s - i as f64)
    }

    fn controls(&self, i: isize) -> [DVec3; 4] {
        [
            self.point(i - 1),
            self.point(i),
            self.point(i + 1),
            self.point(i + 2),
        ]
    }

    fn measure_length(&self) -> f64 {
        let steps = self.segment_count() * LENGTH_STEPS_PER_SEGMENT;
        let mut total = 0.0;
        let mut prev = self.evaluate_position(0.0);
        for step in 1..=steps {
            let next = self.evaluate_position(step as f64 / steps as f64);
            total += next.distance(prev);
            prev = next;
        }
        total
    }
}

impl CurveBackend for CatmullRomCurve {
    fn evaluate_position(&self, u: f64) -> DVec3 {
        let (i, t) = self.locate(u);
        let [p0, p1, p2, p3] = self.controls(i);
        let t2 = t * t;
        let t3 = t2 * t;
        0.5 * (2.0 * p1
            + (p2 - p0) * t
            + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
            + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
    }

    fn evaluate_tangent(&self, u: f64) -> DVec3 {
        let (i, t) = self.locate(u);
        let [p0, p1, p2, p3] = self.controls(i);
        let d = 0.5
            * ((p2 - p0)
                + 2.0 * (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t
                + 3.0 * (3.0 * p1 - p0 - 3.0 * p2 + p3) * t * t);
        d * self.segment_count() as f64
    }

    fn length(&self) -> f64 {
        self.length
    }
}

/// Polyline parameterized by arc length. Used for traced paths.
#[derive(Debug, Clone)]
pub struct PolylineCurve {
    points: Vec<DVec3>,
    cumulative: Vec<f64>,
}

impl PolylineCurve {
    pub fn new(points: Vec<DVec3>) -> CorridorResult<Self> {
        if points.len() < 2 {
            return Err(CorridorError::configuration(format!(
                "polyline needs at least 2 points, got {}",
                points.len()
            )));
        }
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        cumulative.push(0.0);
        for pair in points.windows(2) {
            total += pair[1].distance(pair[0]);
            cumulative.push(total);
        }
        Ok(Self { points, cumulative })
    }

    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    /// Index of the segment end containing arc distance `d`.
    fn segment_end(&self, d: f64) -> usize {
        self.cumulative
            .partition_point(|&c| c < d)
            .clamp(1, self.points.len() - 1)
    }
}

impl CurveBackend for PolylineCurve {
    fn evaluate_position(&self, u: f64) -> DVec3 {
        let d = u.clamp(0.0, 1.0) * self.length();
        let end = self.segment_end(d);
        let span = self.cumulative[end] - self.cumulative[end - 1];
        if span <= f64::EPSILON {
            return self.points[end];
        }
        let t = ((d - self.cumulative[end - 1]) / span).clamp(0.0, 1.0);
        self.points[end - 1].lerp(self.points[end], t)
    }

    fn evaluate_tangent(&self, u: f64) -> DVec3 {
        let d = u.clamp(0.0, 1.0) * self.length();
        let mut end = self.segment_end(d);
        // Skip over coincident points so the tangent reflects real travel.
        while end + 1 < self.points.len()
            && self.points[end].distance(self.points[end - 1]) <= f64::EPSILON
        {
            end += 1;
        }
        self.points[end] - self.points[end - 1]
    }

    fn length(&self) -> f64 {
        self.cumulative[self.cumulative.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spline_passes_through_control_points() {
        let curve = CatmullRomCurve::new(vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(10.0, 0.0, 5.0),
            DVec3::new(20.0, 0.0, 0.0),
        ])
        .unwrap();
        assert!(curve.evaluate_position(0.0).distance(DVec3::ZERO) < 1e-9);
        assert!(curve.evaluate_position(0.5).distance(DVec3::new(10.0, 0.0, 5.0)) < 1e-9);
        assert!(curve.evaluate_position(1.0).distance(DVec3::new(20.0, 0.0, 0.0)) < 1e-9);
        assert!(curve.length() > 20.0);
    }

    #[test]
    fn straight_spline_has_chord_length() {
        let curve =
            CatmullRomCurve::new(vec![DVec3::ZERO, DVec3::new(12.0, 0.0, 0.0)]).unwrap();
        assert!((curve.length() - 12.0).abs() < 1e-9);
        let tangent = curve.evaluate_tangent(0.3).normalize();
        assert!((tangent - DVec3::X).length() < 1e-9);
    }

    #[test]
    fn spline_rejects_single_point() {
        let err = CatmullRomCurve::new(vec![DVec3::ONE]).unwrap_err();
        assert!(matches!(err, CorridorError::Configuration(_)));
    }

    #[test]
    fn polyline_is_arc_length_parameterized() {
        let line = PolylineCurve::new(vec![
            DVec3::ZERO,
            DVec3::new(3.0, 0.0, 0.0),
            DVec3::new(3.0, 0.0, 1.0),
        ])
        .unwrap();
        assert_eq!(line.length(), 4.0);
        assert!(line.evaluate_position(0.5).distance(DVec3::new(2.0, 0.0, 0.0)) < 1e-12);
        assert!(line.evaluate_position(0.875).distance(DVec3::new(3.0, 0.0, 0.5)) < 1e-12);
        assert_eq!(line.evaluate_tangent(0.9), DVec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn polyline_tangent_skips_duplicate_points() {
        let line = PolylineCurve::new(vec![
            DVec3::ZERO,
            DVec3::ZERO,
            DVec3::new(0.0, 0.0, 2.0),
        ])
        .unwrap();
        assert_eq!(line.evaluate_tangent(0.0), DVec3::new(0.0, 0.0, 2.0));
    }
}
