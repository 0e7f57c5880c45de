use keybake_animation_core::{
    AnimationError, KeyframeEditor, NodeHandle, NodeKind, PropertyRef, PropertyTree, Value,
    ValueKind,
};
use keybake_animation_core::data::Keyframe;
use keybake_test_fixtures::MockHost;

struct Scene {
    host: MockHost,
    layer: NodeHandle,
    effects: NodeHandle,
    a: NodeHandle,
    b: NodeHandle,
    position: NodeHandle,
}

fn mk_scene() -> Scene {
    let mut host = MockHost::default();
    let layer = host.add_scene_node("Layer 1", "ADBE Vector Layer");
    let effects = host.add_group(layer, "Effects", "ADBE Effect Parade");
    let a = host.add_leaf(effects, "A", "ADBE Slider", Value::Scalar(1.0));
    let b = host.add_leaf(effects, "B", "ADBE Slider", Value::Scalar(2.0));
    let transform = host.add_group(layer, "Transform", "ADBE Transform Group");
    let position = host.add_leaf(transform, "Position", "ADBE Position", Value::vec3(0.0, 0.0, 0.0));
    Scene {
        host,
        layer,
        effects,
        a,
        b,
        position,
    }
}

#[test]
fn captures_index_path_to_scene_node() {
    let s = mk_scene();
    let r = PropertyRef::new(&s.host, s.b).unwrap();
    assert_eq!(r.root(), s.layer);
    assert_eq!(r.path(), &[0, 1]);
    assert!(r.is_leaf());
    assert_eq!(r.resolve(&s.host).unwrap(), s.b);
    assert_eq!(r.path_string(), format!("{:?}:/0/1", s.layer));
}

#[test]
fn scene_node_has_empty_path() {
    let s = mk_scene();
    let r = PropertyRef::new(&s.host, s.layer).unwrap();
    assert!(r.path().is_empty());
    assert_eq!(r.kind(), NodeKind::Container);
    assert_eq!(r, PropertyRef::scene_node(&s.host, s.layer));
}

#[test]
fn navigates_through_a_trait_object() {
    let s = mk_scene();
    let tree: &dyn PropertyTree = &s.host;
    let root = PropertyRef::scene_node(tree, s.layer);
    let effects = root.child(tree, 0).unwrap();
    assert_eq!(effects.resolve(tree).unwrap(), s.effects);
    assert_eq!(effects.children(tree).unwrap().len(), 2);
}

#[test]
fn rewalks_after_structural_change() {
    let mut s = mk_scene();
    let r = PropertyRef::new(&s.host, s.b).unwrap();
    let gen = s.host.generation();
    // Appending after the referenced branch keeps the path valid.
    s.host.add_group(s.layer, "Masks", "ADBE Mask Parade");
    assert!(s.host.generation() > gen);
    assert_eq!(r.resolve(&s.host).unwrap(), s.b);

    // Removing an earlier sibling inside the group shifts the index.
    s.host.remove_node(s.a);
    assert!(matches!(
        r.resolve(&s.host),
        Err(AnimationError::InvalidReference { .. })
    ));
}

#[test]
fn kind_change_is_surfaced() {
    let mut s = mk_scene();
    let r = PropertyRef::new(&s.host, s.b).unwrap();
    s.host.retype(s.effects, NodeKind::Leaf);
    let err = r.resolve(&s.host).unwrap_err();
    assert_eq!(err.category(), "reference");

    let mut s = mk_scene();
    let r = PropertyRef::new(&s.host, s.effects).unwrap();
    s.host.retype(s.effects, NodeKind::Leaf);
    assert!(r.resolve(&s.host).is_err());
}

#[test]
fn inserted_container_in_path_is_invalid() {
    let mut s = mk_scene();
    let r = PropertyRef::new(&s.host, s.b).unwrap();
    s.host.insert_group(s.layer, 0, "Text", "ADBE Text Properties");
    assert!(r.resolve(&s.host).is_err());
}

#[test]
fn invalidate_forces_rewalk() {
    let s = mk_scene();
    let r = PropertyRef::new(&s.host, s.a).unwrap();
    r.invalidate();
    assert_eq!(r.resolve(&s.host).unwrap(), s.a);
}

#[test]
fn children_and_names() {
    let s = mk_scene();
    let group = PropertyRef::new(&s.host, s.effects).unwrap();
    let children = group.children(&s.host).unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[1].name(&s.host).unwrap(), "B");
    assert_eq!(children[1].match_name(&s.host).unwrap(), "ADBE Slider");
    assert_eq!(children[1], PropertyRef::new(&s.host, s.b).unwrap());
    assert!(children[0].children(&s.host).unwrap().is_empty());
}

#[test]
fn three_axis_value_on_flat_layer_is_two_dimensional() {
    let mut s = mk_scene();
    let r = PropertyRef::new(&s.host, s.position).unwrap();
    assert_eq!(r.dimensions(&s.host).unwrap(), 2);
    s.host.set_3d(s.layer, true);
    assert_eq!(r.dimensions(&s.host).unwrap(), 3);
    let a = PropertyRef::new(&s.host, s.a).unwrap();
    assert_eq!(a.dimensions(&s.host).unwrap(), 1);
}

#[test]
fn writes_pad_and_truncate_to_dimensions() {
    let mut host = MockHost::default();
    let layer = host.add_scene_node("Layer", "ADBE Vector Layer");
    let anchor = host.add_leaf(layer, "Anchor", "ADBE Anchor Point", Value::vec2(0.0, 0.0));
    let r = PropertyRef::new(&host, anchor).unwrap();

    r.set_value(&mut host, &Value::Scalar(4.0)).unwrap();
    assert_eq!(host.static_value(anchor), Some(&Value::Vec2([4.0, 0.0])));

    r.set_value(&mut host, &Value::vec3(1.0, 2.0, 3.0)).unwrap();
    assert_eq!(host.static_value(anchor), Some(&Value::Vec2([1.0, 2.0])));

    let idx = r.set_value_at_time(&mut host, 1.0, &Value::Scalar(5.0)).unwrap();
    assert_eq!(idx, 0);
    assert_eq!(host.keys(anchor)[0].value, Value::Vec2([5.0, 0.0]));
}

#[test]
fn flat_layer_position_drops_z() {
    let mut s = mk_scene();
    let r = PropertyRef::new(&s.host, s.position).unwrap();
    r.set_value(&mut s.host, &Value::vec3(1.0, 2.0, 3.0)).unwrap();
    assert_eq!(s.host.static_value(s.position), Some(&Value::Vec3([1.0, 2.0, 0.0])));
}

#[test]
fn text_onto_scalar_is_a_kind_mismatch() {
    let mut s = mk_scene();
    let r = PropertyRef::new(&s.host, s.a).unwrap();
    let err = r.set_value(&mut s.host, &Value::text("nope")).unwrap_err();
    assert!(matches!(
        err,
        AnimationError::KindMismatch {
            expected: ValueKind::Scalar,
            ..
        }
    ));
}

#[test]
fn container_is_not_a_leaf() {
    let s = mk_scene();
    let r = PropertyRef::new(&s.host, s.effects).unwrap();
    assert!(matches!(
        r.value_kind(&s.host),
        Err(AnimationError::NotALeaf { .. })
    ));
}

#[test]
fn editable_probe_leaves_value_unchanged() {
    let mut s = mk_scene();
    let r = PropertyRef::new(&s.host, s.a).unwrap();
    assert!(r.is_editable(&mut s.host).unwrap());
    assert_eq!(s.host.static_value(s.a), Some(&Value::Scalar(1.0)));

    s.host.set_keys(
        s.b,
        vec![
            Keyframe::new(0.0, Value::Scalar(0.0)),
            Keyframe::new(1.0, Value::Scalar(3.0)),
        ],
    );
    let rb = PropertyRef::new(&s.host, s.b).unwrap();
    assert!(rb.is_editable(&mut s.host).unwrap());
    assert_eq!(s.host.num_keys(s.b), 2);
    assert_eq!(s.host.keys(s.b)[0].value, Value::Scalar(0.0));

    s.host.set_locked(s.a, true);
    assert!(!r.is_editable(&mut s.host).unwrap());
}

#[test]
fn marker_is_never_editable() {
    let mut s = mk_scene();
    let marker = s.host.add_marker(s.layer, "Marker");
    let r = PropertyRef::new(&s.host, marker).unwrap();
    assert!(!r.is_editable(&mut s.host).unwrap());
}

#[test]
fn formula_probe_restores_state() {
    let mut s = mk_scene();
    let r = PropertyRef::new(&s.host, s.a).unwrap();
    assert!(r.is_formula_capable(&mut s.host).unwrap());
    assert_eq!(s.host.formula(s.a), None);
    assert!(!s.host.formula_enabled(s.a));

    s.host.set_formula_capable(s.a, false);
    assert!(!r.is_formula_capable(&mut s.host).unwrap());
}
