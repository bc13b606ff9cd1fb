//! Interpolation curves for keyframe segments

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::rc::Rc;

/// A user-supplied easing function
#[derive(Clone)]
pub struct CustomCurve(Rc<dyn Fn(f32) -> f32>);

impl CustomCurve {
    pub fn new(f: impl Fn(f32) -> f32 + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn apply(&self, t: f32) -> f32 {
        (self.0)(t)
    }
}

impl fmt::Debug for CustomCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomCurve(..)")
    }
}

/// Maps normalized segment progress (0.0 to 1.0) to eased progress.
///
/// Every variant except [`Curve::Custom`] round-trips through serde, so paths
/// built from named curves can be stored in config files.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum Curve {
    #[default]
    Linear,
    /// Quadratic ease-in
    EaseIn,
    /// Quadratic ease-out
    EaseOut,
    /// Quadratic ease-in-out
    EaseInOut,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    /// Overshoots the target slightly before settling
    OutBack,
    OutBounce,
    /// Damped oscillation around the linear ramp
    Spring,
    /// CSS-style cubic bezier with control points (x1, y1) and (x2, y2)
    CubicBezier(f32, f32, f32, f32),
    #[serde(skip)]
    Custom(CustomCurve),
}

impl Curve {
    /// Wrap a closure as a curve
    pub fn custom(f: impl Fn(f32) -> f32 + 'static) -> Self {
        Curve::Custom(CustomCurve::new(f))
    }

    /// Apply the curve to a progress value
    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Curve::Linear => t,
            Curve::EaseIn => ease_in(t, 2),
            Curve::EaseOut => ease_out(t, 2),
            Curve::EaseInOut => ease_in_out(t, 2),
            Curve::InCubic => ease_in(t, 3),
            Curve::OutCubic => ease_out(t, 3),
            Curve::InOutCubic => ease_in_out(t, 3),
            Curve::InQuart => ease_in(t, 4),
            Curve::OutQuart => ease_out(t, 4),
            Curve::InOutQuart => ease_in_out(t, 4),
            Curve::OutBack => {
                const OVERSHOOT: f32 = 1.70158;
                let u = t - 1.0;
                1.0 + (OVERSHOOT + 1.0) * u * u * u + OVERSHOOT * u * u
            }
            Curve::OutBounce => out_bounce(t),
            Curve::Spring => (1.0 - t) * (6.0 * PI * t).sin() + t,
            Curve::CubicBezier(x1, y1, x2, y2) => CubicBezier::new(*x1, *y1, *x2, *y2).ease(t),
            Curve::Custom(curve) => curve.apply(t),
        }
    }
}

fn out_bounce(t: f32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;

    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}

fn ease_in(t: f32, power: i32) -> f32 {
    t.powi(power)
}

fn ease_out(t: f32, power: i32) -> f32 {
    1.0 - ease_in(1.0 - t, power)
}

/// First half eases in, second half mirrors it
fn ease_in_out(t: f32, power: i32) -> f32 {
    if t < 0.5 {
        ease_in(2.0 * t, power) / 2.0
    } else {
        1.0 - ease_in(2.0 - 2.0 * t, power) / 2.0
    }
}

const BEZIER_EPSILON: f64 = 1e-7;

/// CSS `cubic-bezier()` timing function, anchored at (0, 0) and (1, 1).
///
/// Progress maps onto the x axis, which is inverted numerically; the result
/// is the y axis at the same curve parameter. Control point x values are
/// clamped to [0, 1] so x stays monotonic, while y may overshoot.
struct CubicBezier {
    x: BezierAxis,
    y: BezierAxis,
}

impl CubicBezier {
    fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: BezierAxis::new(x1.clamp(0.0, 1.0) as f64, x2.clamp(0.0, 1.0) as f64),
            y: BezierAxis::new(y1 as f64, y2 as f64),
        }
    }

    fn ease(&self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        self.y.at(self.x.solve(t as f64)) as f32
    }
}

/// One coordinate of the bezier as a polynomial `((a*s + b)*s + c)*s`
struct BezierAxis {
    a: f64,
    b: f64,
    c: f64,
}

impl BezierAxis {
    fn new(p1: f64, p2: f64) -> Self {
        Self {
            a: 1.0 - 3.0 * p2 + 3.0 * p1,
            b: 3.0 * p2 - 6.0 * p1,
            c: 3.0 * p1,
        }
    }

    #[inline]
    fn at(&self, s: f64) -> f64 {
        ((self.a * s + self.b) * s + self.c) * s
    }

    #[inline]
    fn slope(&self, s: f64) -> f64 {
        (3.0 * self.a * s + 2.0 * self.b) * s + self.c
    }

    /// Parameter in [0, 1] at which this axis reaches `target`.
    ///
    /// Requires a monotonic axis. Newton converges in a few steps on most
    /// curves; flat spots fall back to bisection.
    fn solve(&self, target: f64) -> f64 {
        let mut s = target;
        for _ in 0..8 {
            let err = self.at(s) - target;
            if err.abs() < BEZIER_EPSILON {
                return s;
            }
            let slope = self.slope(s);
            if slope.abs() < BEZIER_EPSILON {
                break;
            }
            s = (s - err / slope).clamp(0.0, 1.0);
        }

        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        while hi - lo > BEZIER_EPSILON {
            let mid = (lo + hi) * 0.5;
            if self.at(mid) < target {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        (lo + hi) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named_curves() -> Vec<Curve> {
        vec![
            Curve::Linear,
            Curve::EaseIn,
            Curve::EaseOut,
            Curve::EaseInOut,
            Curve::InCubic,
            Curve::OutCubic,
            Curve::InOutCubic,
            Curve::InQuart,
            Curve::OutQuart,
            Curve::InOutQuart,
            Curve::OutBack,
            Curve::OutBounce,
            Curve::Spring,
            Curve::CubicBezier(0.25, 0.1, 0.25, 1.0),
        ]
    }

    #[test]
    fn test_named_curves_hit_endpoints() {
        for curve in named_curves() {
            assert!(curve.apply(0.0).abs() < 1e-5, "{:?} at 0", curve);
            assert!((curve.apply(1.0) - 1.0).abs() < 1e-5, "{:?} at 1", curve);
        }
    }

    #[test]
    fn test_quad_midpoints() {
        assert!((Curve::EaseIn.apply(0.5) - 0.25).abs() < 1e-6);
        assert!((Curve::EaseOut.apply(0.5) - 0.75).abs() < 1e-6);
        assert!((Curve::EaseInOut.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_linear_bezier_matches_linear() {
        let curve = Curve::CubicBezier(0.0, 0.0, 1.0, 1.0);
        for i in 1..10 {
            let t = i as f32 / 10.0;
            assert!((curve.apply(t) - t).abs() < 1e-4);
        }
    }

    #[test]
    fn test_css_ease_is_monotonic() {
        let curve = Curve::CubicBezier(0.25, 0.1, 0.25, 1.0);
        let mut last = 0.0;
        for i in 1..=20 {
            let value = curve.apply(i as f32 / 20.0);
            assert!(value >= last);
            last = value;
        }
        assert!(curve.apply(0.5) > 0.5);
    }

    #[test]
    fn test_power_curves_mirror() {
        for curve in [Curve::InOutCubic, Curve::InOutQuart] {
            assert!((curve.apply(0.5) - 0.5).abs() < 1e-6);
            let (low, high) = (curve.apply(0.2), curve.apply(0.8));
            assert!((low + high - 1.0).abs() < 1e-6, "{:?}", curve);
        }
        assert!((Curve::OutCubic.apply(0.5) - 0.875).abs() < 1e-6);
        assert!((Curve::InQuart.apply(0.5) - 0.0625).abs() < 1e-6);
    }

    #[test]
    fn test_bezier_solver_inverts_x() {
        // Steep middle and flat ends, where plain Newton struggles
        let bezier = CubicBezier::new(0.9, 0.0, 0.1, 1.0);
        for i in 1..100 {
            let target = i as f64 / 100.0;
            let s = bezier.x.solve(target);
            assert!((0.0..=1.0).contains(&s));
            assert!((bezier.x.at(s) - target).abs() < 1e-5, "x({}) != {}", s, target);
        }
    }

    #[test]
    fn test_bezier_symmetric_ease_in_out() {
        let curve = Curve::CubicBezier(0.42, 0.0, 0.58, 1.0);
        assert!((curve.apply(0.5) - 0.5).abs() < 1e-4);
        assert!((curve.apply(0.25) + curve.apply(0.75) - 1.0).abs() < 1e-4);
        assert!(curve.apply(0.25) < 0.25);
    }

    #[test]
    fn test_bezier_y_may_overshoot() {
        // CSS "easeInOutBack"
        let curve = Curve::CubicBezier(0.68, -0.6, 0.32, 1.6);
        let values: Vec<f32> = (1..100).map(|i| curve.apply(i as f32 / 100.0)).collect();
        assert!(values.iter().any(|v| *v < 0.0));
        assert!(values.iter().any(|v| *v > 1.0));
    }

    #[test]
    fn test_bezier_clamps_x_control_points() {
        let clamped = Curve::CubicBezier(-0.5, 0.0, 1.5, 1.0);
        let reference = Curve::CubicBezier(0.0, 0.0, 1.0, 1.0);
        for i in 1..10 {
            let t = i as f32 / 10.0;
            assert!((clamped.apply(t) - reference.apply(t)).abs() < 1e-4);
        }
    }

    #[test]
    fn test_out_back_overshoots() {
        let peak = (1..100)
            .map(|i| Curve::OutBack.apply(i as f32 / 100.0))
            .fold(0.0_f32, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_custom_curve() {
        let curve = Curve::custom(|t| 1.0 - t);
        assert_eq!(curve.apply(0.25), 0.75);
    }

    #[test]
    fn test_serde_named_curves() {
        let json = serde_json::to_string(&Curve::EaseIn).unwrap();
        assert_eq!(json, "\"EaseIn\"");

        let curve: Curve = serde_json::from_str(r#"{"CubicBezier":[0.0,0.0,1.0,1.0]}"#).unwrap();
        assert!(matches!(curve, Curve::CubicBezier(_, _, _, _)));
    }

    #[test]
    fn test_custom_curve_is_not_serializable() {
        assert!(serde_json::to_string(&Curve::custom(|t| t)).is_err());
    }
}
