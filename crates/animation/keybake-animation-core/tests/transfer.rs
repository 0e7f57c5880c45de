use keybake_animation_core::data::InterpolationKind;
use keybake_animation_core::transfer::capture_animation as capture_with;
use keybake_animation_core::{
    apply_animation, capture_animation, reverse_animation, AnimationNode, ApplyOptions,
    CaptureOptions, KeyframeEditor, NodeAnimation, NodeHandle, PropertyRef, TimeRange, Value,
};
use keybake_test_fixtures::{animations, rigs, MockHost, Rig};

fn approx(a: f64, b: f64, eps: f64) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn controls(rig: &Rig, layer: &str) -> (NodeHandle, PropertyRef) {
    let layer = rig.layer(layer).unwrap();
    let group = rig.host.find(layer, &["Controls"]).unwrap();
    (group, PropertyRef::new(&rig.host, group).unwrap())
}

fn leaf(rig: &Rig, layer: &str, name: &str) -> NodeHandle {
    let layer = rig.layer(layer).unwrap();
    rig.host.find(layer, &["Controls", name]).unwrap()
}

fn keys_of(host: &MockHost, node: NodeHandle) -> Vec<(f64, Value)> {
    host.keys(node)
        .iter()
        .map(|k| (k.time, k.value.clone()))
        .collect()
}

fn children(anim: &NodeAnimation) -> &[AnimationNode] {
    match &anim.root {
        AnimationNode::Group(g) => &g.children,
        other => panic!("expected group, got {other:?}"),
    }
}

fn source_capture(rig: &Rig) -> NodeAnimation {
    let (_, src) = controls(rig, "Source");
    capture_animation(&rig.host, &src, None, false).unwrap()
}

#[test]
fn capture_mirrors_the_subtree() {
    let rig = rigs::load("sliders").unwrap();
    let anim = source_capture(&rig);
    assert_eq!(anim.name, "Source");
    assert_eq!(anim.index, -1);
    let kids = children(&anim);
    assert_eq!(kids.len(), 3);
    assert_eq!(anim.time_bounds(), Some((0.0, 1.5)));
    match &kids[1] {
        AnimationNode::Leaf(b) => {
            assert_eq!(b.name, "B");
            assert_eq!(b.match_id, "ADBE Slider");
            assert_eq!(b.keys.len(), 2);
            assert_eq!(b.keys[0].out_interp, InterpolationKind::Hold);
            assert_eq!(b.keys[1].label, 3);
            assert_eq!(b.dimensions, 1);
            // Before the first key the curve holds the first key value.
            assert_eq!(b.start_value, Value::Scalar(2.0));
            assert_eq!(b.end_value, Value::Scalar(4.0));
        }
        other => panic!("expected leaf, got {other:?}"),
    }
    match &kids[2] {
        AnimationNode::Leaf(c) => {
            assert!(c.keys.is_empty());
            assert_eq!(c.start_value, Value::Scalar(7.5));
        }
        other => panic!("expected leaf, got {other:?}"),
    }
}

#[test]
fn capture_rebases_times_to_the_window() {
    let rig = rigs::load("sliders").unwrap();
    let (_, src) = controls(&rig, "Source");
    let anim = capture_animation(&rig.host, &src, Some(TimeRange::new(0.5, 2.0)), false).unwrap();
    match &children(&anim)[0] {
        AnimationNode::Leaf(a) => {
            assert_eq!(a.keys.len(), 1);
            approx(a.keys[0].time, 0.5, 1e-12);
            assert_eq!(a.start_value, Value::Scalar(5.0));
            assert_eq!(a.end_value, Value::Scalar(10.0));
        }
        other => panic!("expected leaf, got {other:?}"),
    }
}

#[test]
fn selected_only_keeps_selected_leaves() {
    let rig = rigs::load("sliders").unwrap();
    let layer = rig.layer("Source").unwrap();
    let root = PropertyRef::scene_node(&rig.host, layer);
    let opts = CaptureOptions::default().with_selected_only(true);
    let anim = capture_with(&rig.host, &root, &opts).unwrap();
    assert_eq!(anim.root.leaf_count(), 1);
    match &children(&anim)[0] {
        AnimationNode::Group(g) => assert_eq!(g.children[0].name(), "A"),
        other => panic!("expected group, got {other:?}"),
    }
}

#[test]
fn static_value_round_trips() {
    let source = rigs::load("sliders").unwrap();
    let anim = source_capture(&source);

    let mut target = rigs::load("sliders").unwrap();
    let c = leaf(&target, "Source", "C");
    target.host.node_mut(c).unwrap().value = Value::Scalar(-1.0);
    let (_, dst) = controls(&target, "Source");
    let out = apply_animation(&mut target.host, &dst, &anim, &ApplyOptions::default()).unwrap();
    assert!(out.is_complete());
    assert_eq!(out.report.applied.len(), 3);
    assert_eq!(target.host.static_value(c), Some(&Value::Scalar(7.5)));
}

#[test]
fn ignore_name_transfers_onto_renamed_rig() {
    let mut rig = rigs::load("sliders").unwrap();
    let anim = source_capture(&rig);
    let (_, dst) = controls(&rig, "Target");
    let opts = ApplyOptions::default().with_ignore_name(true);
    let out = apply_animation(&mut rig.host, &dst, &anim, &opts).unwrap();
    assert!(out.remaining.is_empty());
    assert_eq!(out.report.applied.len(), 3);

    let x = leaf(&rig, "Target", "X");
    let y = leaf(&rig, "Target", "Y");
    let z = leaf(&rig, "Target", "Z");
    assert_eq!(
        keys_of(&rig.host, x),
        vec![(0.0, Value::Scalar(0.0)), (1.0, Value::Scalar(10.0))]
    );
    let yk = rig.host.keys(y);
    assert_eq!(yk.len(), 2);
    assert_eq!(yk[0].out_interp, InterpolationKind::Hold);
    assert_eq!(yk[1].label, 3);
    assert_eq!(rig.host.static_value(z), Some(&Value::Scalar(7.5)));
}

#[test]
fn names_must_match_by_default() {
    let mut rig = rigs::load("sliders").unwrap();
    let anim = source_capture(&rig);
    let (_, dst) = controls(&rig, "Target");
    let out = apply_animation(&mut rig.host, &dst, &anim, &ApplyOptions::default()).unwrap();
    let names: Vec<&str> = out.remaining.iter().map(AnimationNode::name).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert!(out.report.applied.is_empty());
    let x = leaf(&rig, "Target", "X");
    assert_eq!(rig.host.num_keys(x), 0);
    assert_eq!(rig.host.static_value(x), Some(&Value::Scalar(1.0)));
}

#[test]
fn whole_layer_applies_through_matching_groups() {
    let mut rig = rigs::load("sliders").unwrap();
    let src = PropertyRef::scene_node(&rig.host, rig.layer("Source").unwrap());
    let anim = capture_animation(&rig.host, &src, None, false).unwrap();
    let dst = PropertyRef::scene_node(&rig.host, rig.layer("Target").unwrap());
    let opts = ApplyOptions::default().with_ignore_name(true);
    let out = apply_animation(&mut rig.host, &dst, &anim, &opts).unwrap();
    assert!(out.is_complete());
    assert_eq!(rig.host.num_keys(leaf(&rig, "Target", "X")), 2);
}

#[test]
fn whitelist_gates_subtrees() {
    let mut rig = rigs::load("sliders").unwrap();
    let src = PropertyRef::scene_node(&rig.host, rig.layer("Source").unwrap());
    let anim = capture_animation(&rig.host, &src, None, false).unwrap();
    let dst = PropertyRef::scene_node(&rig.host, rig.layer("Target").unwrap());

    let closed = ApplyOptions::default()
        .with_ignore_name(true)
        .with_whitelist(["ADBE Transform Group"]);
    let out = apply_animation(&mut rig.host, &dst, &anim, &closed).unwrap();
    assert!(out.remaining.is_empty());
    assert_eq!(out.report.skipped.len(), 3);
    assert!(out.report.skipped.iter().all(|s| s.reason == "not whitelisted"));
    assert_eq!(rig.host.num_keys(leaf(&rig, "Target", "X")), 0);

    let open = closed.with_whitelist(["ADBE Effect Parade"]);
    let out = apply_animation(&mut rig.host, &dst, &anim, &open).unwrap();
    assert_eq!(out.report.applied.len(), 3);
    assert_eq!(rig.host.num_keys(leaf(&rig, "Target", "X")), 2);
}

#[test]
fn offset_moves_the_curve_onto_the_current_pose() {
    let mut rig = rigs::load("sliders").unwrap();
    let anim = source_capture(&rig);
    let (_, dst) = controls(&rig, "Target");
    let opts = ApplyOptions::default()
        .with_ignore_name(true)
        .with_offset(true);
    apply_animation(&mut rig.host, &dst, &anim, &opts).unwrap();
    let x = leaf(&rig, "Target", "X");
    assert_eq!(
        keys_of(&rig.host, x),
        vec![(0.0, Value::Scalar(1.0)), (1.0, Value::Scalar(11.0))]
    );
    // C has no keys: with offset there is nothing to write.
    let z = leaf(&rig, "Target", "Z");
    assert_eq!(rig.host.static_value(z), Some(&Value::Scalar(1.0)));
}

#[test]
fn time_shift_and_replace() {
    let mut rig = rigs::load("sliders").unwrap();
    let anim = source_capture(&rig);
    let x = leaf(&rig, "Target", "X");
    rig.host.set_keys(
        x,
        vec![
            keybake_animation_core::data::Keyframe::new(0.25, Value::Scalar(3.0)),
            keybake_animation_core::data::Keyframe::new(0.75, Value::Scalar(4.0)),
        ],
    );
    let (_, dst) = controls(&rig, "Target");
    let opts = ApplyOptions::default()
        .with_ignore_name(true)
        .with_replace(true)
        .with_time(2.0);
    apply_animation(&mut rig.host, &dst, &anim, &opts).unwrap();
    assert_eq!(
        keys_of(&rig.host, x),
        vec![(2.0, Value::Scalar(0.0)), (3.0, Value::Scalar(10.0))]
    );
}

#[test]
fn only_keyframes_skips_static_values() {
    let mut rig = rigs::load("sliders").unwrap();
    let anim = source_capture(&rig);
    let (_, dst) = controls(&rig, "Target");
    let opts = ApplyOptions::default()
        .with_ignore_name(true)
        .with_only_keyframes(true);
    apply_animation(&mut rig.host, &dst, &anim, &opts).unwrap();
    let z = leaf(&rig, "Target", "Z");
    assert_eq!(rig.host.static_value(z), Some(&Value::Scalar(1.0)));
}

#[test]
fn locked_leaf_is_skipped_and_the_sweep_continues() {
    let mut rig = rigs::load("sliders").unwrap();
    let anim = source_capture(&rig);
    let y = leaf(&rig, "Target", "Y");
    rig.host.set_locked(y, true);
    let (_, dst) = controls(&rig, "Target");
    let opts = ApplyOptions::default().with_ignore_name(true);
    let out = apply_animation(&mut rig.host, &dst, &anim, &opts).unwrap();
    assert_eq!(out.report.applied.len(), 2);
    assert_eq!(out.report.skipped.len(), 1);
    assert_eq!(rig.host.num_keys(y), 0);
    assert_eq!(
        rig.host.static_value(leaf(&rig, "Target", "Z")),
        Some(&Value::Scalar(7.5))
    );
}

#[test]
fn expressions_are_written_where_accepted() {
    let mut rig = rigs::load("sliders").unwrap();
    let a = leaf(&rig, "Source", "A");
    let b = leaf(&rig, "Source", "B");
    rig.host.node_mut(a).unwrap().formula = Some("wiggle(2, 10)".into());
    rig.host.node_mut(b).unwrap().formula = Some("time * 2".into());
    let anim = source_capture(&rig);
    let x = leaf(&rig, "Target", "X");
    let y = leaf(&rig, "Target", "Y");
    rig.host.set_formula_capable(y, false);
    let (_, dst) = controls(&rig, "Target");
    let opts = ApplyOptions::default()
        .with_ignore_name(true)
        .with_set_expression(true);
    apply_animation(&mut rig.host, &dst, &anim, &opts).unwrap();
    assert_eq!(rig.host.formula(x).as_deref(), Some("wiggle(2, 10)"));
    assert!(rig.host.formula_enabled(x));
    assert_eq!(rig.host.formula(y), None);
}

#[test]
fn reverse_is_an_involution_on_fixture() {
    let mut original: NodeAnimation = animations::load("arm-swing").unwrap();
    original.root.for_each_leaf_mut(&mut |leaf| leaf.reindex());
    let mut anim = original.clone();
    reverse_animation(&mut anim);
    match &children(&anim)[0] {
        AnimationNode::Leaf(rot) => {
            let times: Vec<f64> = rot.keys.iter().map(|k| k.time).collect();
            assert_eq!(times, vec![0.0, 1.0, 2.0]);
            assert_eq!(rot.keys[0].in_interp, InterpolationKind::Linear);
            assert_eq!(rot.keys[0].out_interp, InterpolationKind::Bezier);
            assert_eq!(rot.keys[1].in_ease[0].influence, 0.2);
            assert_eq!(rot.keys[1].out_ease[0].influence, 0.5);
        }
        other => panic!("expected leaf, got {other:?}"),
    }
    reverse_animation(&mut anim);
    assert_eq!(anim, original);
}

#[test]
fn captured_tree_survives_json() {
    let rig = rigs::load("sliders").unwrap();
    let anim = source_capture(&rig);
    let json = anim.to_json().unwrap();
    assert_eq!(NodeAnimation::from_json(&json).unwrap(), anim);
    assert!(NodeAnimation::from_json("{").is_err());
}

fn mk_transform_layer(host: &mut MockHost, name: &str, keyed: bool) -> NodeHandle {
    let layer = host.add_scene_node(name, "ADBE Vector Layer");
    let group = host.add_group(layer, "Transform", "ADBE Transform Group");
    for (leaf_name, match_name) in [("Position", "ADBE Position"), ("Rotation", "ADBE Rotate Z")] {
        let node = host.add_leaf(group, leaf_name, match_name, Value::Scalar(0.0));
        if keyed {
            host.set_keys(
                node,
                vec![
                    keybake_animation_core::data::Keyframe::new(0.0, Value::Scalar(1.0)),
                    keybake_animation_core::data::Keyframe::new(1.0, Value::Scalar(2.0)),
                ],
            );
        }
    }
    layer
}

#[test]
fn whitelisted_leaf_type_receives_data() {
    let mut host = MockHost::default();
    let src = mk_transform_layer(&mut host, "Source", true);
    let dst = mk_transform_layer(&mut host, "Target", false);
    let src_ref = PropertyRef::scene_node(&host, src);
    let anim = capture_animation(&host, &src_ref, None, false).unwrap();

    let dst_ref = PropertyRef::scene_node(&host, dst);
    let opts = ApplyOptions::default()
        .with_ignore_name(true)
        .with_whitelist(["ADBE Position"]);
    let out = apply_animation(&mut host, &dst_ref, &anim, &opts).unwrap();
    assert_eq!(out.report.applied.len(), 1);
    assert_eq!(out.report.skipped.len(), 1);
    assert_eq!(out.report.skipped[0].reason, "not whitelisted");

    let position = host.find(dst, &["Transform", "Position"]).unwrap();
    let rotation = host.find(dst, &["Transform", "Rotation"]).unwrap();
    assert_eq!(host.num_keys(position), 2);
    assert_eq!(host.num_keys(rotation), 0);
}
