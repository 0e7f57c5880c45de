//! Arithmetic and blending utilities for Value types.
//! - component-wise lerp for scalars, vectors and colors
//! - vertex-wise lerp for paths with matching topology (hold otherwise)
//! - step for text (left until t reaches 1)
//! - add/sub/scale used by offsetting and finite differences

use crate::shape::PathShape;
use crate::Value;

#[inline]
pub fn lerp_f(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn zip_components(a: &Value, b: &Value, f: impl Fn(f64, f64) -> f64) -> Option<Value> {
    match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => Some(Value::Scalar(f(*x, *y))),
        (Value::Vec2(x), Value::Vec2(y)) => Some(Value::Vec2(zip_array(x, y, f))),
        (Value::Vec3(x), Value::Vec3(y)) => Some(Value::Vec3(zip_array(x, y, f))),
        (Value::Color(x), Value::Color(y)) => Some(Value::Color(zip_array(x, y, f))),
        (Value::Path(p), Value::Path(q)) => p
            .zip_points(q, |u, v| [f(u[0], v[0]), f(u[1], v[1])])
            .map(Value::Path),
        _ => None,
    }
}

fn zip_array<const N: usize>(
    a: &[f64; N],
    b: &[f64; N],
    f: impl Fn(f64, f64) -> f64,
) -> [f64; N] {
    let mut out = [0.0f64; N];
    for i in 0..N {
        out[i] = f(a[i], b[i]);
    }
    out
}

/// Blend two values. Mismatched kinds and text step to `a` until `t >= 1`.
pub fn lerp(a: &Value, b: &Value, t: f64) -> Value {
    zip_components(a, b, |x, y| lerp_f(x, y, t)).unwrap_or_else(|| {
        if t >= 1.0 {
            b.clone()
        } else {
            a.clone()
        }
    })
}

/// `a + b` for values of the same kind.
pub fn add(a: &Value, b: &Value) -> Option<Value> {
    zip_components(a, b, |x, y| x + y)
}

/// `a - b` for values of the same kind.
pub fn sub(a: &Value, b: &Value) -> Option<Value> {
    zip_components(a, b, |x, y| x - y)
}

/// Multiply every numeric component (or path point) by `k`.
pub fn scale(a: &Value, k: f64) -> Option<Value> {
    match a {
        Value::Text(_) => None,
        Value::Path(p) => Some(Value::Path(scale_path(p, k))),
        _ => {
            let mut out = a.clone();
            if let Some(comps) = out.components_mut() {
                comps.iter_mut().for_each(|c| *c *= k);
            }
            Some(out)
        }
    }
}

fn scale_path(p: &PathShape, k: f64) -> PathShape {
    let s = |pts: &[[f64; 2]]| -> Vec<[f64; 2]> {
        pts.iter().map(|q| [q[0] * k, q[1] * k]).collect()
    };
    PathShape {
        vertices: s(&p.vertices),
        in_tangents: s(&p.in_tangents),
        out_tangents: s(&p.out_tangents),
        closed: p.closed,
    }
}

/// Euclidean norm of the numeric components (0 for text and paths).
pub fn norm(a: &Value) -> f64 {
    a.components()
        .map(|c| c.iter().map(|x| x * x).sum::<f64>().sqrt())
        .unwrap_or(0.0)
}

/// Distance between two values; paths use the largest point distance.
///
/// Returns `None` when the values cannot be compared numerically.
pub fn distance(a: &Value, b: &Value) -> Option<f64> {
    match (a, b) {
        (Value::Path(p), Value::Path(q)) => {
            if !p.same_topology(q) {
                return None;
            }
            Some(
                p.points()
                    .zip(q.points())
                    .map(|(u, v)| ((u[0] - v[0]).powi(2) + (u[1] - v[1]).powi(2)).sqrt())
                    .fold(0.0, f64::max),
            )
        }
        _ => sub(a, b).map(|d| norm(&d)),
    }
}
