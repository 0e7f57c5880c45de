//! Precision-based equality used by keyframe simplification and extreme detection.
//!
//! `precision` is a number of decimal places: two numbers are equal when they round
//! to the same value at that many decimals.

use crate::shape::PathShape;
use crate::Value;

/// Round `v` to `precision` decimal places.
#[inline]
pub fn round_to(v: f64, precision: u32) -> f64 {
    let m = 10f64.powi(precision as i32);
    (v * m).round() / m
}

/// Half a unit in the last kept decimal place.
#[inline]
pub fn tolerance(precision: u32) -> f64 {
    0.5 * 10f64.powi(-(precision as i32))
}

#[inline]
pub fn float_eq(a: f64, b: f64, precision: u32) -> bool {
    round_to(a, precision) == round_to(b, precision) || (a - b).abs() < tolerance(precision)
}

/// Sign of `v` after rounding: -1, 0 or 1.
#[inline]
pub fn rounded_sign(v: f64, precision: u32) -> i8 {
    let r = round_to(v, precision);
    if r > 0.0 {
        1
    } else if r < 0.0 {
        -1
    } else {
        0
    }
}

fn points_eq(a: &[[f64; 2]], b: &[[f64; 2]], precision: u32) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(p, q)| float_eq(p[0], q[0], precision) && float_eq(p[1], q[1], precision))
}

fn path_eq(a: &PathShape, b: &PathShape, precision: u32) -> bool {
    a.closed == b.closed
        && points_eq(&a.vertices, &b.vertices, precision)
        && points_eq(&a.in_tangents, &b.in_tangents, precision)
        && points_eq(&a.out_tangents, &b.out_tangents, precision)
}

/// Value-kind-appropriate equality: numeric tolerance, path-vertex tolerance, text equality.
/// Values of different kinds are never equal.
pub fn approx_eq(a: &Value, b: &Value, precision: u32) -> bool {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::Path(p), Value::Path(q)) => path_eq(p, q, precision),
        _ => match (a.components(), b.components()) {
            (Some(x), Some(y)) if a.kind() == b.kind() => x
                .iter()
                .zip(y.iter())
                .all(|(u, v)| float_eq(*u, *v, precision)),
            _ => false,
        },
    }
}
