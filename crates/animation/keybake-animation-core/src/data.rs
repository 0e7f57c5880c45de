//! Keyframe and animation data model.
//!
//! The captured tree ([`NodeAnimation`] -> [`GroupAnimation`] -> [`Animation`]) mirrors the
//! host property tree at capture time but is a plain value: it is not bound to any live
//! node and can be applied to a different tree.

use serde::{Deserialize, Serialize};

use keybake_api_core::{blend, Value, ValueKind};

/// Interpolation on one side of a keyframe.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationKind {
    Hold,
    #[default]
    Linear,
    Bezier,
}

/// Temporal ease of one axis on one side of a keyframe.
///
/// `speed` is in value units per second; `influence` is the fraction (0..1) of the
/// segment duration the handle reaches into.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyEase {
    pub speed: f64,
    pub influence: f64,
}

/// Influence hosts assign to freshly created keys.
pub const DEFAULT_INFLUENCE: f64 = 1.0 / 6.0;

impl Default for KeyEase {
    fn default() -> Self {
        Self {
            speed: 0.0,
            influence: DEFAULT_INFLUENCE,
        }
    }
}

impl KeyEase {
    pub fn new(speed: f64, influence: f64) -> Self {
        Self { speed, influence }
    }

    /// Same handle length, opposite direction in time.
    pub fn reversed(self) -> Self {
        Self {
            speed: -self.speed,
            influence: self.influence,
        }
    }
}

/// Spatial interpolation of a 2D/3D positional keyframe.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialEase {
    #[serde(rename = "inTangent")]
    pub in_tangent: Vec<f64>,
    #[serde(rename = "outTangent")]
    pub out_tangent: Vec<f64>,
    #[serde(default)]
    pub continuous: bool,
    #[serde(default, rename = "autoBezier")]
    pub auto_bezier: bool,
    #[serde(default)]
    pub roving: bool,
}

impl SpatialEase {
    pub fn zero(dims: usize) -> Self {
        Self {
            in_tangent: vec![0.0; dims],
            out_tangent: vec![0.0; dims],
            ..Default::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        self.in_tangent
            .iter()
            .chain(self.out_tangent.iter())
            .all(|c| *c == 0.0)
    }
}

/// A single keyframe.
///
/// `index` is only a position hint from the moment the key was read; it is
/// invalidated by any insertion/removal of earlier keys on the same property.
/// Host writes re-resolve the index by `time`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub value: Value,
    #[serde(default, rename = "inInterp")]
    pub in_interp: InterpolationKind,
    #[serde(default, rename = "outInterp")]
    pub out_interp: InterpolationKind,
    /// One entry per axis; empty means "host default".
    #[serde(default, rename = "inEase")]
    pub in_ease: Vec<KeyEase>,
    #[serde(default, rename = "outEase")]
    pub out_ease: Vec<KeyEase>,
    #[serde(default)]
    pub spatial: Option<SpatialEase>,
    #[serde(default, rename = "temporalContinuous")]
    pub temporal_continuous: bool,
    #[serde(default, rename = "temporalAutoBezier")]
    pub temporal_auto_bezier: bool,
    #[serde(default)]
    pub label: i32,
    #[serde(default)]
    pub index: i32,
}

impl Keyframe {
    /// Linear keyframe with default ease.
    pub fn new(time: f64, value: Value) -> Self {
        Self {
            time,
            value,
            in_interp: InterpolationKind::Linear,
            out_interp: InterpolationKind::Linear,
            in_ease: Vec::new(),
            out_ease: Vec::new(),
            spatial: None,
            temporal_continuous: false,
            temporal_auto_bezier: false,
            label: 0,
            index: 0,
        }
    }

    pub fn with_interpolation(
        mut self,
        in_interp: InterpolationKind,
        out_interp: InterpolationKind,
    ) -> Self {
        self.in_interp = in_interp;
        self.out_interp = out_interp;
        self
    }

    pub fn with_ease(mut self, in_ease: Vec<KeyEase>, out_ease: Vec<KeyEase>) -> Self {
        self.in_ease = in_ease;
        self.out_ease = out_ease;
        self
    }

    /// Swap every in/out attribute; used when reversing time.
    pub fn swap_sides(&mut self) {
        std::mem::swap(&mut self.in_interp, &mut self.out_interp);
        std::mem::swap(&mut self.in_ease, &mut self.out_ease);
        self.in_ease = self.in_ease.iter().map(|e| e.reversed()).collect();
        self.out_ease = self.out_ease.iter().map(|e| e.reversed()).collect();
        if let Some(sp) = self.spatial.as_mut() {
            std::mem::swap(&mut sp.in_tangent, &mut sp.out_tangent);
        }
    }
}

/// Capture window in timeline seconds.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.end >= self.start
    }

    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Animation of one property leaf.
///
/// When `keys` is non-empty, `start_value`/`end_value` are the values sampled at the
/// capture window edges, not necessarily the first/last key values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub name: String,
    #[serde(rename = "matchId")]
    pub match_id: String,
    #[serde(default)]
    pub keys: Vec<Keyframe>,
    #[serde(rename = "startValue")]
    pub start_value: Value,
    #[serde(rename = "endValue")]
    pub end_value: Value,
    pub dimensions: u8,
    #[serde(default)]
    pub expression: Option<String>,
}

impl Animation {
    pub fn new(name: impl Into<String>, match_id: impl Into<String>, value: Value) -> Self {
        let dimensions = value.dimensions();
        Self {
            name: name.into(),
            match_id: match_id.into(),
            keys: Vec::new(),
            start_value: value.clone(),
            end_value: value,
            dimensions,
            expression: None,
        }
    }

    pub fn with_keys(mut self, keys: Vec<Keyframe>) -> Self {
        self.keys = keys;
        self.reindex();
        self
    }

    pub fn value_kind(&self) -> ValueKind {
        self.start_value.kind()
    }

    pub fn is_animated(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn start_time(&self) -> Option<f64> {
        self.keys.first().map(|k| k.time)
    }

    pub fn end_time(&self) -> Option<f64> {
        self.keys.last().map(|k| k.time)
    }

    /// Refresh the `index` hints after reordering.
    pub fn reindex(&mut self) {
        for (i, k) in self.keys.iter_mut().enumerate() {
            k.index = i as i32;
        }
    }

    /// Add `delta` to every key value and to the boundary values.
    ///
    /// Values that cannot be offset (text, mismatched kinds) are left untouched.
    pub fn offset_values(&mut self, delta: &Value) {
        let shift = |v: &mut Value| {
            if let Some(out) = blend::add(v, delta) {
                *v = out;
            }
        };
        self.keys.iter_mut().for_each(|k| shift(&mut k.value));
        shift(&mut self.start_value);
        shift(&mut self.end_value);
    }
}

/// Child of a [`GroupAnimation`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnimationNode {
    Leaf(Animation),
    Group(GroupAnimation),
}

impl AnimationNode {
    pub fn name(&self) -> &str {
        match self {
            AnimationNode::Leaf(a) => &a.name,
            AnimationNode::Group(g) => &g.name,
        }
    }

    pub fn match_id(&self) -> &str {
        match self {
            AnimationNode::Leaf(a) => &a.match_id,
            AnimationNode::Group(g) => &g.match_id,
        }
    }

    /// (first, last) key time over all descendant leaves.
    pub fn time_bounds(&self) -> Option<(f64, f64)> {
        match self {
            AnimationNode::Leaf(a) => a.start_time().zip(a.end_time()),
            AnimationNode::Group(g) => g.start_time.zip(g.end_time),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, AnimationNode::Group(_))
    }

    /// Visit every leaf, depth first.
    pub fn for_each_leaf_mut(&mut self, f: &mut impl FnMut(&mut Animation)) {
        match self {
            AnimationNode::Leaf(a) => f(a),
            AnimationNode::Group(g) => {
                for child in g.children.iter_mut() {
                    child.for_each_leaf_mut(f);
                }
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            AnimationNode::Leaf(_) => 1,
            AnimationNode::Group(g) => g.children.iter().map(AnimationNode::leaf_count).sum(),
        }
    }
}

/// Interior node of the captured tree.
///
/// `start_time`/`end_time` are the min/max over every descendant leaf key time,
/// `None` when no descendant has keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupAnimation {
    pub name: String,
    #[serde(rename = "matchId")]
    pub match_id: String,
    #[serde(default)]
    pub children: Vec<AnimationNode>,
    #[serde(rename = "startTime")]
    pub start_time: Option<f64>,
    #[serde(rename = "endTime")]
    pub end_time: Option<f64>,
}

impl GroupAnimation {
    pub fn new(name: impl Into<String>, match_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            match_id: match_id.into(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, child: AnimationNode) {
        self.children.push(child);
        self.update_time_bounds();
    }

    /// Recompute `start_time`/`end_time` from the children (groups must be up to date).
    pub fn update_time_bounds(&mut self) {
        let mut bounds: Option<(f64, f64)> = None;
        for (s, e) in self.children.iter().filter_map(AnimationNode::time_bounds) {
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(s), hi.max(e)),
                None => (s, e),
            });
        }
        self.start_time = bounds.map(|b| b.0);
        self.end_time = bounds.map(|b| b.1);
    }

    /// Recompute time bounds of this group and every nested group, bottom-up.
    pub fn refresh_time_bounds(&mut self) {
        for child in self.children.iter_mut() {
            if let AnimationNode::Group(g) = child {
                g.refresh_time_bounds();
            }
        }
        self.update_time_bounds();
    }
}

/// Captured animation of one scene node; the root of a transferable unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeAnimation {
    pub name: String,
    pub index: i32,
    /// Tree captured from the referenced property (a single leaf or a group).
    pub root: AnimationNode,
}

impl NodeAnimation {
    pub fn new(name: impl Into<String>, index: i32, root: AnimationNode) -> Self {
        Self {
            name: name.into(),
            index,
            root,
        }
    }

    /// Global `[start, end]` key window of the whole tree.
    pub fn time_bounds(&self) -> Option<(f64, f64)> {
        self.root.time_bounds()
    }

    /// [`Animation::offset_values`] on every leaf.
    pub fn offset_values(&mut self, delta: &Value) {
        self.root.for_each_leaf_mut(&mut |leaf| leaf.offset_values(delta));
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, times: &[f64]) -> AnimationNode {
        let keys = times
            .iter()
            .map(|t| Keyframe::new(*t, Value::Scalar(*t)))
            .collect();
        AnimationNode::Leaf(
            Animation::new(name, "ADBE Slider", Value::Scalar(0.0)).with_keys(keys),
        )
    }

    #[test]
    fn group_bounds_span_children() {
        let mut g = GroupAnimation::new("g", "ADBE Group");
        g.push(leaf("a", &[1.0, 2.0]));
        g.push(leaf("b", &[]));
        g.push(leaf("c", &[0.5, 1.5]));
        assert_eq!(g.start_time, Some(0.5));
        assert_eq!(g.end_time, Some(2.0));
    }

    #[test]
    fn group_without_keys_has_no_bounds() {
        let mut g = GroupAnimation::new("g", "ADBE Group");
        g.push(leaf("a", &[]));
        assert_eq!(g.start_time, None);
        assert_eq!(g.end_time, None);
    }

    #[test]
    fn swap_sides_negates_speed() {
        let mut k = Keyframe::new(0.0, Value::Scalar(1.0))
            .with_interpolation(InterpolationKind::Hold, InterpolationKind::Bezier)
            .with_ease(vec![KeyEase::new(2.0, 0.3)], vec![KeyEase::new(-1.0, 0.5)]);
        k.swap_sides();
        assert_eq!(k.in_interp, InterpolationKind::Bezier);
        assert_eq!(k.out_interp, InterpolationKind::Hold);
        assert_eq!(k.in_ease, vec![KeyEase::new(1.0, 0.5)]);
        assert_eq!(k.out_ease, vec![KeyEase::new(-2.0, 0.3)]);
    }

    #[test]
    fn offset_skips_text() {
        let mut a = Animation::new("t", "ADBE Text", Value::Text("x".into()));
        a.offset_values(&Value::Scalar(1.0));
        assert_eq!(a.start_value, Value::Text("x".into()));

        let mut b = Animation::new("s", "ADBE Slider", Value::Scalar(1.0))
            .with_keys(vec![Keyframe::new(0.0, Value::Scalar(2.0))]);
        b.offset_values(&Value::Scalar(0.5));
        assert_eq!(b.keys[0].value, Value::Scalar(2.5));
        assert_eq!(b.end_value, Value::Scalar(1.5));
    }

    #[test]
    fn tree_offset_reaches_nested_leaves() {
        let mut inner = GroupAnimation::new("inner", "ADBE Group");
        inner.push(leaf("b", &[1.0]));
        let mut g = GroupAnimation::new("g", "ADBE Group");
        g.push(leaf("a", &[0.0]));
        g.push(AnimationNode::Group(inner));
        let mut anim = NodeAnimation::new("Layer", 0, AnimationNode::Group(g));
        anim.offset_values(&Value::Scalar(10.0));
        let AnimationNode::Group(g) = &anim.root else {
            panic!("expected group");
        };
        match (&g.children[0], &g.children[1]) {
            (AnimationNode::Leaf(a), AnimationNode::Group(inner)) => {
                assert_eq!(a.keys[0].value, Value::Scalar(10.0));
                match &inner.children[0] {
                    AnimationNode::Leaf(b) => {
                        assert_eq!(b.keys[0].value, Value::Scalar(11.0));
                        assert_eq!(b.start_value, Value::Scalar(10.0));
                    }
                    other => panic!("expected leaf, got {other:?}"),
                }
            }
            other => panic!("unexpected children {other:?}"),
        }
    }

    #[test]
    fn json_roundtrip() {
        let mut g = GroupAnimation::new("Transform", "ADBE Transform Group");
        g.push(leaf("Rotation", &[0.0, 1.0]));
        let anim = NodeAnimation::new("Arm", 2, AnimationNode::Group(g));
        let json = anim.to_json().unwrap();
        assert_eq!(NodeAnimation::from_json(&json).unwrap(), anim);
    }
}
