//! Interpolation helpers:
//! - cubic bezier basis and x-inversion by bisection
//! - per-axis temporal bezier segments built from speed/influence handles
//! - auto-bezier handle computation

use crate::data::KeyEase;

/// Influence used for the linear side of a mixed segment and for auto-bezier handles.
pub const THIRD: f64 = 1.0 / 3.0;

/// Cubic Bezier basis function
#[inline]
pub fn cubic_bezier(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Given x control points (x1, x2) of a curve from (0,0) to (1,1) and an input `x` in
/// [0,1], find the curve parameter whose x equals `x` by binary search.
#[inline]
pub fn solve_bezier_x(x: f64, x1: f64, x2: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    let mut lo = 0.0f64;
    let mut hi = 1.0f64;
    let mut mid = x;
    for _ in 0..48 {
        let cx = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (cx - x).abs() < 1e-10 {
            break;
        }
        if cx < x {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    mid
}

/// Eased value of one axis over a segment.
///
/// `u` is normalized time in [0,1], `dt` the segment duration, `out_ease` the handle
/// leaving `v0` and `in_ease` the handle arriving at `v1`.
pub fn bezier_axis(v0: f64, v1: f64, u: f64, dt: f64, out_ease: KeyEase, in_ease: KeyEase) -> f64 {
    let io = out_ease.influence.clamp(0.0, 1.0);
    let ii = in_ease.influence.clamp(0.0, 1.0);
    let s = solve_bezier_x(u, io, 1.0 - ii);
    let y1 = v0 + out_ease.speed * io * dt;
    let y2 = v1 - in_ease.speed * ii * dt;
    cubic_bezier(v0, y1, y2, v1, s)
}

/// Eased fraction in [0,1] for values that cannot carry per-axis speeds (paths).
pub fn bezier_fraction(u: f64, out_influence: f64, in_influence: f64) -> f64 {
    let io = out_influence.clamp(0.0, 1.0);
    let ii = in_influence.clamp(0.0, 1.0);
    let s = solve_bezier_x(u, io, 1.0 - ii);
    cubic_bezier(0.0, 0.0, 1.0, 1.0, s)
}

/// Handle that reproduces a straight line between two values.
#[inline]
pub fn linear_handle(v0: f64, v1: f64, dt: f64) -> KeyEase {
    let speed = if dt > 0.0 { (v1 - v0) / dt } else { 0.0 };
    KeyEase::new(speed, THIRD)
}

/// Auto-bezier speed of one axis at a key from its neighbours:
/// centered slope for interior keys, one-sided slope at the ends.
pub fn auto_speed(prev: Option<(f64, f64)>, cur: (f64, f64), next: Option<(f64, f64)>) -> f64 {
    let slope = |a: (f64, f64), b: (f64, f64)| {
        let dt = b.0 - a.0;
        if dt > 0.0 {
            (b.1 - a.1) / dt
        } else {
            0.0
        }
    };
    match (prev, next) {
        (Some(p), Some(n)) => slope(p, n),
        (Some(p), None) => slope(p, cur),
        (None, Some(n)) => slope(cur, n),
        (None, None) => 0.0,
    }
}
