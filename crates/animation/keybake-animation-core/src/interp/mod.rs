//! Keyframe curve evaluation.
//!
//! Hosts that store keys in this crate's [`Keyframe`] form can evaluate them here:
//! hold, linear and temporal-bezier segments per axis, text steps, paths blend with an
//! eased fraction when their topology matches.

pub mod functions;

use keybake_api_core::{blend, coercion, PathShape, Value};

use crate::data::{InterpolationKind, KeyEase, Keyframe};
use functions::{auto_speed, bezier_axis, bezier_fraction, linear_handle};

/// Ease of `axis`, falling back to the first axis and then to the host default.
fn axis_ease(eases: &[KeyEase], axis: usize) -> KeyEase {
    eases
        .get(axis)
        .or_else(|| eases.first())
        .copied()
        .unwrap_or_default()
}

/// Index `i` such that `keys[i].time <= t < keys[i + 1].time`.
fn find_segment(keys: &[Keyframe], t: f64) -> usize {
    keys.partition_point(|k| k.time <= t).saturating_sub(1)
}

/// Evaluate a keyframe curve at `t`; `fallback` is returned when there are no keys.
pub fn evaluate_keys(keys: &[Keyframe], t: f64, fallback: &Value) -> Value {
    let (first, last) = match (keys.first(), keys.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return fallback.clone(),
    };
    if t <= first.time {
        return first.value.clone();
    }
    if t >= last.time {
        return last.value.clone();
    }
    let i = find_segment(keys, t);
    let (a, b) = (&keys[i], &keys[i + 1]);
    let dt = b.time - a.time;
    if dt <= 0.0 {
        return b.value.clone();
    }
    if a.out_interp == InterpolationKind::Hold {
        return a.value.clone();
    }
    let u = (t - a.time) / dt;
    let linear =
        a.out_interp == InterpolationKind::Linear && b.in_interp == InterpolationKind::Linear;
    match (&a.value, &b.value) {
        (Value::Text(_), _) => a.value.clone(),
        (Value::Path(p), Value::Path(q)) => {
            let f = if linear {
                u
            } else {
                let out_infl = path_influence(a.out_interp, &a.out_ease);
                let in_infl = path_influence(b.in_interp, &b.in_ease);
                bezier_fraction(u, out_infl, in_infl)
            };
            blend_paths(p, q, f, &a.value)
        }
        _ if linear => blend::lerp(&a.value, &b.value, u),
        (va, vb) => match (va.components(), vb.components()) {
            (Some(ca), Some(cb)) if va.kind() == vb.kind() => {
                let comps: Vec<f64> = ca
                    .iter()
                    .zip(cb.iter())
                    .enumerate()
                    .map(|(axis, (v0, v1))| {
                        let out_h = side_handle(a.out_interp, &a.out_ease, axis, *v0, *v1, dt);
                        let in_h = side_handle(b.in_interp, &b.in_ease, axis, *v0, *v1, dt);
                        bezier_axis(*v0, *v1, u, dt, out_h, in_h)
                    })
                    .collect();
                coercion::from_components(va.kind(), &comps).unwrap_or_else(|_| va.clone())
            }
            _ => blend::lerp(va, vb, u),
        },
    }
}

fn side_handle(
    interp: InterpolationKind,
    eases: &[KeyEase],
    axis: usize,
    v0: f64,
    v1: f64,
    dt: f64,
) -> KeyEase {
    match interp {
        InterpolationKind::Bezier => axis_ease(eases, axis),
        InterpolationKind::Linear | InterpolationKind::Hold => linear_handle(v0, v1, dt),
    }
}

fn path_influence(interp: InterpolationKind, eases: &[KeyEase]) -> f64 {
    match interp {
        InterpolationKind::Bezier => axis_ease(eases, 0).influence,
        InterpolationKind::Linear | InterpolationKind::Hold => 0.0,
    }
}

fn blend_paths(p: &PathShape, q: &PathShape, f: f64, hold: &Value) -> Value {
    if p.same_topology(q) {
        blend::lerp(&Value::Path(p.clone()), &Value::Path(q.clone()), f)
    } else {
        hold.clone()
    }
}

/// In/out auto-bezier ease of key `i`: per-axis neighbour slope with influence 1/3.
///
/// Non-numeric keys get an empty ease list.
pub fn auto_bezier_ease(keys: &[Keyframe], i: usize) -> (Vec<KeyEase>, Vec<KeyEase>) {
    let Some(cur) = keys.get(i) else {
        return (Vec::new(), Vec::new());
    };
    let Some(comps) = cur.value.components() else {
        return (Vec::new(), Vec::new());
    };
    let sample = |k: &Keyframe, axis: usize| {
        k.value
            .components()
            .and_then(|c| c.get(axis).copied())
            .map(|v| (k.time, v))
    };
    let prev = if i > 0 { keys.get(i - 1) } else { None };
    let next = keys.get(i + 1);
    let eases: Vec<KeyEase> = (0..comps.len())
        .map(|axis| {
            let speed = auto_speed(
                prev.and_then(|k| sample(k, axis)),
                (cur.time, comps[axis]),
                next.and_then(|k| sample(k, axis)),
            );
            KeyEase::new(speed, functions::THIRD)
        })
        .collect();
    (eases.clone(), eases)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    fn scalar(v: &Value) -> f64 {
        match v {
            Value::Scalar(x) => *x,
            other => panic!("expected scalar, got {other:?}"),
        }
    }

    fn ramp() -> Vec<Keyframe> {
        vec![
            Keyframe::new(0.0, Value::Scalar(0.0)),
            Keyframe::new(1.0, Value::Scalar(5.0)),
            Keyframe::new(2.0, Value::Scalar(10.0)),
        ]
    }

    #[test]
    fn linear_segments() {
        let keys = ramp();
        approx(scalar(&evaluate_keys(&keys, 0.5, &Value::Scalar(0.0))), 2.5, 1e-12);
        approx(scalar(&evaluate_keys(&keys, 1.5, &Value::Scalar(0.0))), 7.5, 1e-12);
        approx(scalar(&evaluate_keys(&keys, -1.0, &Value::Scalar(0.0))), 0.0, 0.0);
        approx(scalar(&evaluate_keys(&keys, 3.0, &Value::Scalar(0.0))), 10.0, 0.0);
    }

    #[test]
    fn hold_keeps_left_value() {
        let mut keys = ramp();
        keys[0].out_interp = InterpolationKind::Hold;
        approx(scalar(&evaluate_keys(&keys, 0.99, &Value::Scalar(0.0))), 0.0, 0.0);
    }

    #[test]
    fn auto_bezier_on_a_ramp_stays_straight() {
        let mut keys = ramp();
        for i in 0..keys.len() {
            let (ie, oe) = auto_bezier_ease(&keys, i);
            keys[i].in_ease = ie;
            keys[i].out_ease = oe;
            keys[i].in_interp = InterpolationKind::Bezier;
            keys[i].out_interp = InterpolationKind::Bezier;
        }
        for i in 0..=20 {
            let t = i as f64 / 10.0;
            approx(scalar(&evaluate_keys(&keys, t, &Value::Scalar(0.0))), 5.0 * t, 1e-6);
        }
    }

    #[test]
    fn empty_curve_returns_fallback() {
        assert_eq!(evaluate_keys(&[], 1.0, &Value::Scalar(3.0)), Value::Scalar(3.0));
    }

    #[test]
    fn text_steps_between_keys() {
        let keys = vec![
            Keyframe::new(0.0, Value::Text("a".into())),
            Keyframe::new(1.0, Value::Text("b".into())),
        ];
        assert_eq!(evaluate_keys(&keys, 0.9, &Value::Text(String::new())), Value::Text("a".into()));
        assert_eq!(evaluate_keys(&keys, 1.0, &Value::Text(String::new())), Value::Text("b".into()));
    }
}
