use serde::Deserialize;

/// One key of a [`ProfileCurve`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ProfileKey {
    pub u: f64,
    pub value: f64,
}

/// Piecewise-linear multiplier over path progress `u`.
///
/// Values outside the first/last key are held constant. An empty curve is the
/// constant `1.0`; results are never negative.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Vec<ProfileKey>")]
pub struct ProfileCurve {
    keys: Vec<ProfileKey>,
}

impl From<Vec<ProfileKey>> for ProfileCurve {
    fn from(keys: Vec<ProfileKey>) -> Self {
        Self::new(keys)
    }
}

impl ProfileCurve {
    pub fn new(mut keys: Vec<ProfileKey>) -> Self {
        keys.retain(|k| k.u.is_finite() && k.value.is_finite());
        keys.sort_by(|a, b| a.u.total_cmp(&b.u));
        Self { keys }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![ProfileKey { u: 0.0, value }])
    }

    pub fn linear(start: f64, end: f64) -> Self {
        Self::new(vec![
            ProfileKey { u: 0.0, value: start },
            ProfileKey { u: 1.0, value: end },
        ])
    }

    pub fn keys(&self) -> &[ProfileKey] {
        &self.keys
    }

    /// Smallest value the curve takes anywhere.
    pub fn min_value(&self) -> f64 {
        self.keys
            .iter()
            .map(|k| k.value)
            .reduce(f64::min)
            .unwrap_or(1.0)
            .max(0.0)
    }

    pub fn evaluate(&self, u: f64) -> f64 {
        let value = match self.keys.as_slice() {
            [] => 1.0,
            [only] => only.value,
            keys => {
                let first = keys[0];
                let last = keys[keys.len() - 1];
                if u <= first.u {
                    first.value
                } else if u >= last.u {
                    last.value
                } else {
                    let upper = keys.partition_point(|k| k.u <= u);
                    let a = keys[upper - 1];
                    let b = keys[upper];
                    let span = b.u - a.u;
                    if span <= f64::EPSILON {
                        b.value
                    } else {
                        a.value + (b.value - a.value) * ((u - a.u) / span)
                    }
                }
            }
        };
        value.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_curve_is_unit() {
        assert_eq!(ProfileCurve::default().evaluate(0.3), 1.0);
    }

    #[test]
    fn interpolates_and_clamps_outside_range() {
        let curve = ProfileCurve::new(vec![
            ProfileKey { u: 0.2, value: 0.5 },
            ProfileKey { u: 0.6, value: 1.5 },
        ]);
        assert_eq!(curve.evaluate(-1.0), 0.5);
        assert_eq!(curve.evaluate(0.2), 0.5);
        assert!((curve.evaluate(0.4) - 1.0).abs() < 1e-12);
        assert_eq!(curve.evaluate(2.0), 1.5);
    }

    #[test]
    fn min_value_covers_every_key() {
        assert_eq!(ProfileCurve::default().min_value(), 1.0);
        let curve = ProfileCurve::new(vec![
            ProfileKey { u: 0.0, value: 1.2 },
            ProfileKey { u: 0.5, value: 0.4 },
            ProfileKey { u: 1.0, value: 0.9 },
        ]);
        assert_eq!(curve.min_value(), 0.4);
    }

    #[test]
    fn negative_values_floor_at_zero() {
        assert_eq!(ProfileCurve::linear(-1.0, -1.0).evaluate(0.5), 0.0);
    }

    #[test]
    fn deserializes_from_key_list() {
        let curve: ProfileCurve =
            serde_json::from_str(r#"[{"u": 1.0, "value": 0.0}, {"u": 0.0, "value": 2.0}]"#)
                .unwrap();
        assert!((curve.evaluate(0.25) - 1.5).abs() < 1e-12);
    }
}
