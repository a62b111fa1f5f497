//! Value/time cubic curves between keyframes

/// Tangent handles stored with a keyframe.
///
/// `in_*` shapes the segment arriving at the keyframe, `out_*` the segment
/// leaving it. Factors are fractions of the segment's time span.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tangents {
    pub in_factor: f64,
    pub in_value: f32,
    pub out_factor: f64,
    pub out_value: f32,
}

/// A cubic Bezier in (time, value) space.
///
/// Time is monotonic over the segment for well-formed tangents, so sampling
/// solves `time(t) = x` for the curve parameter and evaluates the value at it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicCurve {
    times: [f64; 4],
    values: [f64; 4],
}

const EPSILON: f64 = 1e-7;
const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 64;

impl CubicCurve {
    /// Curve through `(t0, v0)` and `(t3, v3)` with control points `(t1, v1)`
    /// and `(t2, v2)`
    #[allow(clippy::too_many_arguments)]
    pub fn new(t0: f64, v0: f32, t1: f64, v1: f32, t2: f64, v2: f32, t3: f64, v3: f32) -> Self {
        Self {
            times: [t0, t1, t2, t3],
            values: [f64::from(v0), f64::from(v1), f64::from(v2), f64::from(v3)],
        }
    }

    /// Fit the segment from `(from_time, from_value)` to
    /// `(to_time, to_value)` using the leaving frame's out handle and the
    /// arriving frame's in handle
    pub fn fit(
        from_time: f32,
        from_value: f32,
        out: &Tangents,
        to_time: f32,
        to_value: f32,
        next_in: Option<&Tangents>,
    ) -> Self {
        let span = f64::from(to_time) - f64::from(from_time);
        let out_time = f64::from(from_time) + span * out.out_factor;
        let (in_factor, in_value) = next_in.map_or((0.0, to_value), |t| (t.in_factor, t.in_value));
        let in_time = f64::from(to_time) - span * in_factor;

        Self::new(
            f64::from(from_time),
            from_value,
            out_time,
            out.out_value,
            in_time,
            in_value,
            f64::from(to_time),
            to_value,
        )
    }

    /// Value of the curve at `time`
    pub fn value_at(&self, time: f64) -> f32 {
        let t = self.parameter_at(time);
        bezier(&self.values, t) as f32
    }

    fn parameter_at(&self, time: f64) -> f64 {
        let start = self.times[0];
        let end = self.times[3];
        if end <= start {
            return 0.0;
        }
        if time <= start {
            return 0.0;
        }
        if time >= end {
            return 1.0;
        }

        let mut t = (time - start) / (end - start);
        for _ in 0..NEWTON_ITERATIONS {
            let error = bezier(&self.times, t) - time;
            if error.abs() < EPSILON {
                return t;
            }
            let slope = bezier_slope(&self.times, t);
            if slope.abs() < EPSILON {
                break;
            }
            t -= error / slope;
            if !(0.0..=1.0).contains(&t) {
                break;
            }
        }

        let mut low = 0.0;
        let mut high = 1.0;
        for _ in 0..BISECTION_ITERATIONS {
            t = (low + high) * 0.5;
            let x = bezier(&self.times, t);
            if (x - time).abs() < EPSILON {
                break;
            }
            if x < time {
                low = t;
            } else {
                high = t;
            }
        }
        t
    }
}

fn bezier(points: &[f64; 4], t: f64) -> f64 {
    let it = 1.0 - t;
    it * it * it * points[0]
        + 3.0 * it * it * t * points[1]
        + 3.0 * it * t * t * points[2]
        + t * t * t * points[3]
}

fn bezier_slope(points: &[f64; 4], t: f64) -> f64 {
    let it = 1.0 - t;
    3.0 * it * it * (points[1] - points[0])
        + 6.0 * it * t * (points[2] - points[1])
        + 3.0 * t * t * (points[3] - points[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_handles_are_linear() {
        let curve = CubicCurve::new(0.0, 0.0, 10.0 / 3.0, 10.0 / 3.0, 20.0 / 3.0, 20.0 / 3.0, 10.0, 10.0);
        for time in [0.0, 2.5, 5.0, 7.5, 10.0] {
            assert!((curve.value_at(time) - time as f32).abs() < 0.001);
        }
    }

    #[test]
    fn test_endpoints() {
        let out = Tangents {
            out_factor: 0.3,
            out_value: 4.0,
            ..Tangents::default()
        };
        let next_in = Tangents {
            in_factor: 0.3,
            in_value: -2.0,
            ..Tangents::default()
        };
        let curve = CubicCurve::fit(1.0, 1.0, &out, 3.0, 5.0, Some(&next_in));
        assert!((curve.value_at(1.0) - 1.0).abs() < 0.001);
        assert!((curve.value_at(3.0) - 5.0).abs() < 0.001);
        assert!((curve.value_at(-4.0) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_flat_handles_ease() {
        // Ease in/out: flat tangents keep the midpoint halfway but slow the ends
        let out = Tangents {
            out_factor: 0.5,
            out_value: 0.0,
            ..Tangents::default()
        };
        let next_in = Tangents {
            in_factor: 0.5,
            in_value: 1.0,
            ..Tangents::default()
        };
        let curve = CubicCurve::fit(0.0, 0.0, &out, 1.0, 1.0, Some(&next_in));
        assert!((curve.value_at(0.5) - 0.5).abs() < 0.001);
        assert!(curve.value_at(0.1) < 0.1);
        assert!(curve.value_at(0.9) > 0.9);
    }

    #[test]
    fn test_missing_in_handle_uses_target_value() {
        let out = Tangents {
            out_factor: 0.0,
            out_value: 0.0,
            ..Tangents::default()
        };
        let curve = CubicCurve::fit(0.0, 0.0, &out, 2.0, 8.0, None);
        assert!((curve.value_at(2.0) - 8.0).abs() < 0.001);
    }
}
