use std::f64::consts::PI;

use keybake_animation_core::baking::{ExtremeSample, OriginalEase};
use keybake_animation_core::data::{InterpolationKind, KeyEase, Keyframe};
use keybake_animation_core::{
    set_keyframes_interpolation, Evaluator, NodeHandle, PropertyRef, SingleTrialRefiner,
    TangentRefiner, Value,
};
use keybake_test_fixtures::MockHost;

const STEP: f64 = 1.0 / 24.0;
const THIRD: f64 = 1.0 / 3.0;

fn bezier_key(t: f64, v: f64, speed: f64) -> Keyframe {
    Keyframe::new(t, Value::Scalar(v))
        .with_interpolation(InterpolationKind::Bezier, InterpolationKind::Bezier)
        .with_ease(
            vec![KeyEase::new(speed, THIRD)],
            vec![KeyEase::new(speed, THIRD)],
        )
}

fn peak_leaf(peak_speed: f64) -> (MockHost, NodeHandle, PropertyRef) {
    let mut host = MockHost::default();
    let layer = host.add_scene_node("Dial", "ADBE Vector Layer");
    let node = host.add_leaf(layer, "Slider", "ADBE Slider", Value::Scalar(0.0));
    host.set_keys(
        node,
        vec![
            bezier_key(0.0, 0.0, 100.0),
            bezier_key(1.0, 100.0, peak_speed),
            bezier_key(2.0, 0.0, -100.0),
        ],
    );
    let pref = PropertyRef::new(&host, node).unwrap();
    (host, node, pref)
}

fn sine_peak() -> ExtremeSample {
    let around = Value::Scalar(100.0 * (PI / 2.0 - PI * STEP / 2.0).sin());
    ExtremeSample {
        time: 1.0,
        value: Value::Scalar(100.0),
        prev_around: around.clone(),
        next_around: around,
        velocity: Value::Scalar(0.0),
        original: None,
    }
}

#[test]
fn overshooting_tangents_are_replaced() {
    let (mut host, node, pref) = peak_leaf(500.0);
    let outcome = SingleTrialRefiner
        .refine(&mut host, &pref, &sine_peak(), STEP)
        .unwrap();
    assert!(outcome.kept_in && outcome.kept_out);
    let key = &host.keys(node)[1];
    assert_eq!(key.in_ease, vec![KeyEase::new(0.0, THIRD)]);
    assert_eq!(key.out_ease, vec![KeyEase::new(0.0, THIRD)]);
}

#[test]
fn original_ease_is_tried_before_the_sampled_one() {
    let (mut host, node, pref) = peak_leaf(500.0);
    let wide = vec![KeyEase::new(0.0, 0.5)];
    let mut extreme = sine_peak();
    extreme.original = Some(OriginalEase {
        in_ease: wide.clone(),
        out_ease: wide.clone(),
    });
    let outcome = SingleTrialRefiner
        .refine(&mut host, &pref, &extreme, STEP)
        .unwrap();
    assert!(outcome.kept_in && outcome.kept_out);
    let key = &host.keys(node)[1];
    assert_eq!(key.in_ease, wide);
    assert_eq!(key.out_ease, wide);
}

#[test]
fn exact_neighbours_roll_back_to_auto_bezier() {
    let (mut host, node, pref) = peak_leaf(0.0);
    set_keyframes_interpolation(&mut host, &pref, InterpolationKind::Bezier, true).unwrap();
    let mut extreme = sine_peak();
    extreme.prev_around = host.value_at(node, 1.0 - STEP, true);
    extreme.next_around = host.value_at(node, 1.0 + STEP, true);

    let outcome = SingleTrialRefiner
        .refine(&mut host, &pref, &extreme, STEP)
        .unwrap();
    assert!(!outcome.any());
    assert!(host.keys(node)[1].temporal_auto_bezier);
    assert_eq!(host.value_at(node, 1.0 - STEP, true), extreme.prev_around);
}

#[test]
fn missing_key_is_a_no_op() {
    let (mut host, _, pref) = peak_leaf(0.0);
    let mut extreme = sine_peak();
    extreme.time = 0.5;
    let outcome = SingleTrialRefiner
        .refine(&mut host, &pref, &extreme, STEP)
        .unwrap();
    assert!(!outcome.any());
}
