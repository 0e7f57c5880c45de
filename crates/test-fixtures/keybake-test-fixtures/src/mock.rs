//! In-memory host implementing every host trait.
//!
//! Nodes live in a map keyed by handle. Structural edits bump the generation; keyframe
//! edits do not. Keys are evaluated with the core interpolation routines, auto-bezier
//! keys report the ease the evaluator actually uses.

use hashbrown::HashMap;

use keybake_animation_core::data::{InterpolationKind, KeyEase, Keyframe, SpatialEase};
use keybake_animation_core::interp::{auto_bezier_ease, evaluate_keys};
use keybake_animation_core::keyframes::TIME_EPSILON;
use keybake_animation_core::{
    ChildKey, EaseScope, Evaluator, HostError, HostResult, KeyframeEditor, NodeHandle, NodeKind,
    PropertyTree,
};
use keybake_api_core::{Value, ValueKind};

use crate::formula::{FormulaFn, FormulaSpec};

pub struct MockNode {
    pub name: String,
    pub match_name: String,
    pub kind: NodeKind,
    pub value_kind: ValueKind,
    pub scene: bool,
    pub three_d: bool,
    pub selected: bool,
    pub spatial: bool,
    /// Rejects every write.
    pub locked: bool,
    /// Rejects formula writes.
    pub formula_capable: bool,
    pub value: Value,
    pub keys: Vec<Keyframe>,
    pub formula: Option<String>,
    pub formula_enabled: bool,
    formula_fn: Option<FormulaFn>,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
}

impl MockNode {
    fn new(name: &str, match_name: &str, kind: NodeKind, value: Value) -> Self {
        Self {
            name: name.to_string(),
            match_name: match_name.to_string(),
            kind,
            value_kind: value.kind(),
            scene: false,
            three_d: false,
            selected: false,
            spatial: false,
            locked: false,
            formula_capable: true,
            value,
            keys: Vec::new(),
            formula: None,
            formula_enabled: false,
            formula_fn: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

pub struct MockHost {
    nodes: HashMap<NodeHandle, MockNode>,
    next_id: u64,
    generation: u64,
    frame_duration: f64,
    timeline: (f64, f64),
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new(1.0 / 24.0, (0.0, 4.0))
    }
}

impl MockHost {
    pub fn new(frame_duration: f64, timeline: (f64, f64)) -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 1,
            generation: 0,
            frame_duration,
            timeline,
        }
    }

    fn alloc(&mut self, node: MockNode) -> NodeHandle {
        let handle = NodeHandle(self.next_id);
        self.next_id += 1;
        self.nodes.insert(handle, node);
        self.generation += 1;
        handle
    }

    fn attach(&mut self, parent: NodeHandle, index: Option<usize>, mut node: MockNode) -> NodeHandle {
        node.parent = Some(parent);
        let handle = self.alloc(node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            let at = index.unwrap_or(p.children.len()).min(p.children.len());
            p.children.insert(at, handle);
        }
        handle
    }

    pub fn add_scene_node(&mut self, name: &str, match_name: &str) -> NodeHandle {
        let mut node = MockNode::new(name, match_name, NodeKind::Container, Value::Scalar(0.0));
        node.scene = true;
        node.value_kind = ValueKind::NoValue;
        self.alloc(node)
    }

    pub fn add_group(&mut self, parent: NodeHandle, name: &str, match_name: &str) -> NodeHandle {
        self.insert_group(parent, usize::MAX, name, match_name)
    }

    /// Group inserted at `index` among the parent's children.
    pub fn insert_group(
        &mut self,
        parent: NodeHandle,
        index: usize,
        name: &str,
        match_name: &str,
    ) -> NodeHandle {
        let mut node = MockNode::new(name, match_name, NodeKind::Container, Value::Scalar(0.0));
        node.value_kind = ValueKind::NoValue;
        self.attach(parent, Some(index), node)
    }

    pub fn add_leaf(
        &mut self,
        parent: NodeHandle,
        name: &str,
        match_name: &str,
        value: Value,
    ) -> NodeHandle {
        self.attach(parent, None, MockNode::new(name, match_name, NodeKind::Leaf, value))
    }

    /// Leaf whose value kind cannot hold a curve.
    pub fn add_marker(&mut self, parent: NodeHandle, name: &str) -> NodeHandle {
        let mut node = MockNode::new(name, "ADBE Marker", NodeKind::Leaf, Value::Scalar(0.0));
        node.value_kind = ValueKind::Marker;
        self.attach(parent, None, node)
    }

    /// Detach a node (and its subtree) from the tree.
    pub fn remove_node(&mut self, node: NodeHandle) {
        let Some(removed) = self.nodes.remove(&node) else {
            return;
        };
        if let Some(p) = removed.parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| *c != node);
        }
        let mut stack = removed.children;
        while let Some(child) = stack.pop() {
            if let Some(n) = self.nodes.remove(&child) {
                stack.extend(n.children);
            }
        }
        self.generation += 1;
    }

    /// Change a node's structural kind in place (a container becoming a leaf, ...).
    pub fn retype(&mut self, node: NodeHandle, kind: NodeKind) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.kind = kind;
        }
        self.generation += 1;
    }

    pub fn node(&self, node: NodeHandle) -> Option<&MockNode> {
        self.nodes.get(&node)
    }

    pub fn node_mut(&mut self, node: NodeHandle) -> Option<&mut MockNode> {
        self.nodes.get_mut(&node)
    }

    /// Descendant reached by following child names from `root`.
    pub fn find(&self, root: NodeHandle, names: &[&str]) -> Option<NodeHandle> {
        names.iter().try_fold(root, |cur, name| {
            self.resolve_child(cur, ChildKey::Name(name))
        })
    }

    pub fn set_formula(&mut self, node: NodeHandle, spec: &FormulaSpec) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.formula = Some(spec.text());
            n.formula_fn = Some(spec.evaluator());
            n.formula_enabled = true;
        }
    }

    pub fn set_keys(&mut self, node: NodeHandle, mut keys: Vec<Keyframe>) {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        if let Some(n) = self.nodes.get_mut(&node) {
            n.keys = keys;
        }
    }

    pub fn set_locked(&mut self, node: NodeHandle, locked: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.locked = locked;
        }
    }

    pub fn set_formula_capable(&mut self, node: NodeHandle, capable: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.formula_capable = capable;
        }
    }

    pub fn set_selected(&mut self, node: NodeHandle, selected: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.selected = selected;
        }
    }

    pub fn set_spatial(&mut self, node: NodeHandle, spatial: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.spatial = spatial;
        }
    }

    pub fn set_3d(&mut self, scene_node: NodeHandle, three_d: bool) {
        if let Some(n) = self.nodes.get_mut(&scene_node) {
            n.three_d = three_d;
        }
    }

    /// Stored keys (auto-bezier eases not resolved).
    pub fn keys(&self, node: NodeHandle) -> &[Keyframe] {
        self.nodes.get(&node).map(|n| n.keys.as_slice()).unwrap_or(&[])
    }

    pub fn static_value(&self, node: NodeHandle) -> Option<&Value> {
        self.nodes.get(&node).map(|n| &n.value)
    }

    /// Keys with auto-bezier eases resolved, as evaluated.
    pub fn effective_keys(&self, node: NodeHandle) -> Vec<Keyframe> {
        let Some(n) = self.nodes.get(&node) else {
            return Vec::new();
        };
        let mut keys = n.keys.clone();
        for i in 0..keys.len() {
            if n.keys[i].temporal_auto_bezier {
                let (in_ease, out_ease) = auto_bezier_ease(&n.keys, i);
                keys[i].in_ease = in_ease;
                keys[i].out_ease = out_ease;
            }
        }
        keys
    }

    fn writable(&mut self, node: NodeHandle) -> HostResult<&mut MockNode> {
        let n = self
            .nodes
            .get_mut(&node)
            .ok_or_else(|| HostError::new(format!("unknown node {node:?}")))?;
        if n.locked {
            return Err(HostError::new(format!("{} is locked", n.name)));
        }
        Ok(n)
    }

    fn key_mut(&mut self, node: NodeHandle, index: u32) -> HostResult<&mut Keyframe> {
        let n = self.writable(node)?;
        let name = n.name.clone();
        n.keys
            .get_mut(index as usize)
            .ok_or_else(|| HostError::new(format!("{name} has no key {index}")))
    }

    fn set_key(n: &mut MockNode, time: f64, value: &Value) -> HostResult<u32> {
        if value.kind() != n.value_kind {
            return Err(HostError::new(format!(
                "{} expects {:?}, got {:?}",
                n.name,
                n.value_kind,
                value.kind()
            )));
        }
        if let Some(i) = n.keys.iter().position(|k| (k.time - time).abs() <= TIME_EPSILON) {
            n.keys[i].value = value.clone();
            return Ok(i as u32);
        }
        let at = n.keys.partition_point(|k| k.time < time);
        n.keys.insert(at, Keyframe::new(time, value.clone()));
        Ok(at as u32)
    }
}

impl PropertyTree for MockHost {
    fn generation(&self) -> u64 {
        self.generation
    }

    fn parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn index_in_parent(&self, node: NodeHandle) -> Option<u32> {
        let parent = self.parent(node)?;
        self.nodes
            .get(&parent)?
            .children
            .iter()
            .position(|c| *c == node)
            .map(|i| i as u32)
    }

    fn is_scene_node(&self, node: NodeHandle) -> bool {
        self.nodes.get(&node).map(|n| n.scene).unwrap_or(false)
    }

    fn resolve_child(&self, node: NodeHandle, key: ChildKey<'_>) -> Option<NodeHandle> {
        let n = self.nodes.get(&node)?;
        match key {
            ChildKey::Index(i) => n.children.get(i as usize).copied(),
            ChildKey::Name(name) => n.children.iter().copied().find(|c| {
                self.nodes
                    .get(c)
                    .map(|child| child.name == name || child.match_name == name)
                    .unwrap_or(false)
            }),
        }
    }

    fn node_kind(&self, node: NodeHandle) -> NodeKind {
        self.nodes
            .get(&node)
            .map(|n| n.kind)
            .unwrap_or(NodeKind::Container)
    }

    fn value_kind(&self, node: NodeHandle) -> ValueKind {
        self.nodes
            .get(&node)
            .map(|n| n.value_kind)
            .unwrap_or(ValueKind::NoValue)
    }

    fn num_children(&self, node: NodeHandle) -> u32 {
        self.nodes
            .get(&node)
            .map(|n| n.children.len() as u32)
            .unwrap_or(0)
    }

    fn name(&self, node: NodeHandle) -> String {
        self.nodes.get(&node).map(|n| n.name.clone()).unwrap_or_default()
    }

    fn match_name(&self, node: NodeHandle) -> String {
        self.nodes
            .get(&node)
            .map(|n| n.match_name.clone())
            .unwrap_or_default()
    }

    fn is_selected(&self, node: NodeHandle) -> bool {
        self.nodes.get(&node).map(|n| n.selected).unwrap_or(false)
    }

    fn is_spatial(&self, node: NodeHandle) -> bool {
        self.nodes.get(&node).map(|n| n.spatial).unwrap_or(false)
    }

    fn is_3d(&self, scene_node: NodeHandle) -> bool {
        self.nodes.get(&scene_node).map(|n| n.three_d).unwrap_or(false)
    }

    fn frame_duration(&self, _node: NodeHandle) -> f64 {
        self.frame_duration
    }

    fn timeline_bounds(&self, _node: NodeHandle) -> (f64, f64) {
        self.timeline
    }
}

impl Evaluator for MockHost {
    fn value_at(&self, node: NodeHandle, time: f64, pre_formula: bool) -> Value {
        let Some(n) = self.nodes.get(&node) else {
            return Value::Scalar(0.0);
        };
        if !pre_formula && n.formula_enabled {
            if let Some(f) = n.formula_fn.as_ref() {
                return f(time);
            }
        }
        evaluate_keys(&self.effective_keys(node), time, &n.value)
    }
}

impl KeyframeEditor for MockHost {
    fn formula(&self, node: NodeHandle) -> Option<String> {
        self.nodes.get(&node).and_then(|n| n.formula.clone())
    }

    fn formula_enabled(&self, node: NodeHandle) -> bool {
        self.nodes.get(&node).map(|n| n.formula_enabled).unwrap_or(false)
    }

    fn try_set_formula(&mut self, node: NodeHandle, text: &str) -> HostResult {
        let n = self.writable(node)?;
        if !n.formula_capable {
            return Err(HostError::new(format!("{} does not accept formulas", n.name)));
        }
        if n.formula.as_deref() != Some(text) {
            n.formula_fn = None;
        }
        n.formula = (!text.is_empty()).then(|| text.to_string());
        n.formula_enabled = n.formula.is_some();
        Ok(())
    }

    fn try_set_formula_enabled(&mut self, node: NodeHandle, enabled: bool) -> HostResult {
        let n = self.writable(node)?;
        if enabled && n.formula.is_none() {
            return Err(HostError::new(format!("{} has no formula", n.name)));
        }
        n.formula_enabled = enabled;
        Ok(())
    }

    fn try_set_value(&mut self, node: NodeHandle, value: &Value) -> HostResult {
        let n = self.writable(node)?;
        if !n.keys.is_empty() {
            return Err(HostError::new(format!("{} is animated", n.name)));
        }
        if value.kind() != n.value_kind {
            return Err(HostError::new(format!(
                "{} expects {:?}, got {:?}",
                n.name,
                n.value_kind,
                value.kind()
            )));
        }
        n.value = value.clone();
        Ok(())
    }

    fn try_set_value_at_time(
        &mut self,
        node: NodeHandle,
        time: f64,
        value: &Value,
    ) -> HostResult<u32> {
        let n = self.writable(node)?;
        Self::set_key(n, time, value)
    }

    fn num_keys(&self, node: NodeHandle) -> u32 {
        self.nodes.get(&node).map(|n| n.keys.len() as u32).unwrap_or(0)
    }

    fn keyframe(&self, node: NodeHandle, index: u32) -> Option<Keyframe> {
        let n = self.nodes.get(&node)?;
        let mut key = n.keys.get(index as usize)?.clone();
        if key.temporal_auto_bezier {
            let (in_ease, out_ease) = auto_bezier_ease(&n.keys, index as usize);
            key.in_ease = in_ease;
            key.out_ease = out_ease;
        }
        key.index = index as i32;
        Some(key)
    }

    fn insert_keyframes_batch(
        &mut self,
        node: NodeHandle,
        times: &[f64],
        values: &[Value],
    ) -> HostResult {
        if times.len() != values.len() {
            return Err(HostError::new("times and values differ in length"));
        }
        let n = self.writable(node)?;
        for (t, v) in times.iter().zip(values.iter()) {
            Self::set_key(n, *t, v)?;
        }
        Ok(())
    }

    fn remove_keyframe(&mut self, node: NodeHandle, index: u32) -> HostResult {
        let n = self.writable(node)?;
        if index as usize >= n.keys.len() {
            return Err(HostError::new(format!("{} has no key {index}", n.name)));
        }
        let removed = n.keys.remove(index as usize);
        if n.keys.is_empty() {
            n.value = removed.value;
        }
        Ok(())
    }

    fn set_interpolation(
        &mut self,
        node: NodeHandle,
        index: u32,
        in_interp: InterpolationKind,
        out_interp: InterpolationKind,
    ) -> HostResult {
        let key = self.key_mut(node, index)?;
        key.in_interp = in_interp;
        key.out_interp = out_interp;
        Ok(())
    }

    fn set_temporal_ease(
        &mut self,
        node: NodeHandle,
        index: u32,
        in_ease: &[KeyEase],
        out_ease: &[KeyEase],
    ) -> HostResult {
        let key = self.key_mut(node, index)?;
        key.in_ease = in_ease.to_vec();
        key.out_ease = out_ease.to_vec();
        key.temporal_auto_bezier = false;
        Ok(())
    }

    fn set_spatial_tangents(
        &mut self,
        node: NodeHandle,
        index: u32,
        in_tangent: &[f64],
        out_tangent: &[f64],
    ) -> HostResult {
        let key = self.key_mut(node, index)?;
        let spatial = key.spatial.get_or_insert_with(SpatialEase::default);
        spatial.in_tangent = in_tangent.to_vec();
        spatial.out_tangent = out_tangent.to_vec();
        Ok(())
    }

    fn set_continuity(
        &mut self,
        node: NodeHandle,
        index: u32,
        scope: EaseScope,
        continuous: bool,
    ) -> HostResult {
        let key = self.key_mut(node, index)?;
        match scope {
            EaseScope::Temporal => key.temporal_continuous = continuous,
            EaseScope::Spatial => {
                key.spatial.get_or_insert_with(SpatialEase::default).continuous = continuous
            }
        }
        Ok(())
    }

    fn set_auto_bezier(
        &mut self,
        node: NodeHandle,
        index: u32,
        scope: EaseScope,
        auto_bezier: bool,
    ) -> HostResult {
        let key = self.key_mut(node, index)?;
        match scope {
            EaseScope::Temporal => key.temporal_auto_bezier = auto_bezier,
            EaseScope::Spatial => {
                key.spatial.get_or_insert_with(SpatialEase::default).auto_bezier = auto_bezier
            }
        }
        Ok(())
    }

    fn set_roving(&mut self, node: NodeHandle, index: u32, roving: bool) -> HostResult {
        let key = self.key_mut(node, index)?;
        key.spatial.get_or_insert_with(SpatialEase::default).roving = roving;
        Ok(())
    }

    fn set_label(&mut self, node: NodeHandle, index: u32, label: i32) -> HostResult {
        self.key_mut(node, index)?.label = label;
        Ok(())
    }
}
