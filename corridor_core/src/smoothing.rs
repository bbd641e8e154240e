use bevy::math::DVec3;

/// Windows at or below this length leave a path untouched.
pub const SMOOTH_WINDOW_EPSILON: f64 = 1e-6;

/// Smoothed world-space path handed to curve fitting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TracedPath {
    pub points: Vec<DVec3>,
}

impl TracedPath {
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[1].distance(w[0])).sum()
    }
}

/// Trailing moving average over a window measured in arc length.
///
/// For each point the window runs back from it while the arc length it spans
/// stays within `window_meters`; the emitted point is the mean of the window.
pub fn smooth_path(raw: &[DVec3], window_meters: f64) -> TracedPath {
    if window_meters <= SMOOTH_WINDOW_EPSILON || raw.len() < 2 {
        return TracedPath {
            points: raw.to_vec(),
        };
    }

    let mut cumulative = Vec::with_capacity(raw.len());
    let mut total = 0.0;
    cumulative.push(0.0);
    for pair in raw.windows(2) {
        total += pair[1].distance(pair[0]);
        cumulative.push(total);
    }

    let mut points = Vec::with_capacity(raw.len());
    let mut sum = DVec3::ZERO;
    let mut head = 0usize;
    for (i, &point) in raw.iter().enumerate() {
        sum += point;
        while head < i && cumulative[i] - cumulative[head] > window_meters {
            sum -= raw[head];
            head += 1;
        }
        points.push(sum / (i - head + 1) as f64);
    }

    TracedPath { points }
}
