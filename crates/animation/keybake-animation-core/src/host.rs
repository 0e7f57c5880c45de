//! Host traits: the scene-graph collaborator this crate reads from and writes to.
//!
//! Adapters implement these for a real application; the core never owns host nodes.
//! Every call may have side effects visible to the next one (toggling a formula changes
//! what [`Evaluator::value_at`] returns), so callers keep strict program order.
//! Keyframe indices are 0-based and only valid until the next insertion/removal.

use keybake_api_core::{Value, ValueKind};

use crate::data::{InterpolationKind, KeyEase, Keyframe};
use crate::error::HostResult;
use crate::ids::{ChildKey, NodeHandle};

/// Structural kind of a host node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Animatable parameter.
    Leaf,
    /// Group of properties (or a scene node itself).
    Container,
}

/// Which interpolation flags a continuity/auto-bezier write targets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EaseScope {
    Temporal,
    Spatial,
}

/// Read-only navigation of the property tree.
pub trait PropertyTree {
    /// Structural generation; bumped by the host on every insertion/removal of nodes.
    fn generation(&self) -> u64;

    /// Parent node, `None` above a scene node.
    fn parent(&self, node: NodeHandle) -> Option<NodeHandle>;

    /// 0-based position of `node` among its parent's children.
    fn index_in_parent(&self, node: NodeHandle) -> Option<u32>;

    /// Scene nodes (layers) are the boundary of a property path.
    fn is_scene_node(&self, node: NodeHandle) -> bool;

    fn resolve_child(&self, node: NodeHandle, key: ChildKey<'_>) -> Option<NodeHandle>;

    fn node_kind(&self, node: NodeHandle) -> NodeKind;

    fn value_kind(&self, node: NodeHandle) -> ValueKind;

    fn num_children(&self, node: NodeHandle) -> u32;

    /// Display name (user-editable).
    fn name(&self, node: NodeHandle) -> String;

    /// Type id, stable across renames.
    fn match_name(&self, node: NodeHandle) -> String;

    fn is_selected(&self, node: NodeHandle) -> bool;

    /// Positional parameter with spatial interpolation.
    fn is_spatial(&self, node: NodeHandle) -> bool;

    /// Whether a scene node is flagged 3D; 3-axis parameters of a flat node are 2D.
    fn is_3d(&self, scene_node: NodeHandle) -> bool;

    /// Grid step: minimum meaningful time increment (typically 1/fps).
    fn frame_duration(&self, node: NodeHandle) -> f64;

    /// (start, end) of the timeline owning `node`.
    fn timeline_bounds(&self, node: NodeHandle) -> (f64, f64);
}

/// Black-box evaluator of parameter values.
pub trait Evaluator {
    /// Value at `time`. With `pre_formula`, the formula is ignored and the keyframed
    /// (or static) value is returned.
    fn value_at(&self, node: NodeHandle, time: f64, pre_formula: bool) -> Value;
}

/// Writes and keyframe access.
pub trait KeyframeEditor {
    fn formula(&self, node: NodeHandle) -> Option<String>;
    fn formula_enabled(&self, node: NodeHandle) -> bool;
    fn try_set_formula(&mut self, node: NodeHandle, text: &str) -> HostResult;
    fn try_set_formula_enabled(&mut self, node: NodeHandle, enabled: bool) -> HostResult;

    /// Static value write; hosts reject it on animated parameters.
    fn try_set_value(&mut self, node: NodeHandle, value: &Value) -> HostResult;

    /// Create (or overwrite) a keyframe; returns its index.
    fn try_set_value_at_time(&mut self, node: NodeHandle, time: f64, value: &Value)
        -> HostResult<u32>;

    fn num_keys(&self, node: NodeHandle) -> u32;

    /// Full keyframe state, with the ease the host actually evaluates.
    fn keyframe(&self, node: NodeHandle, index: u32) -> Option<Keyframe>;

    /// Create many keyframes in one call.
    fn insert_keyframes_batch(
        &mut self,
        node: NodeHandle,
        times: &[f64],
        values: &[Value],
    ) -> HostResult;

    fn remove_keyframe(&mut self, node: NodeHandle, index: u32) -> HostResult;

    fn set_interpolation(
        &mut self,
        node: NodeHandle,
        index: u32,
        in_interp: InterpolationKind,
        out_interp: InterpolationKind,
    ) -> HostResult;

    fn set_temporal_ease(
        &mut self,
        node: NodeHandle,
        index: u32,
        in_ease: &[KeyEase],
        out_ease: &[KeyEase],
    ) -> HostResult;

    fn set_spatial_tangents(
        &mut self,
        node: NodeHandle,
        index: u32,
        in_tangent: &[f64],
        out_tangent: &[f64],
    ) -> HostResult;

    fn set_continuity(
        &mut self,
        node: NodeHandle,
        index: u32,
        scope: EaseScope,
        continuous: bool,
    ) -> HostResult;

    fn set_auto_bezier(
        &mut self,
        node: NodeHandle,
        index: u32,
        scope: EaseScope,
        auto_bezier: bool,
    ) -> HostResult;

    fn set_roving(&mut self, node: NodeHandle, index: u32, roving: bool) -> HostResult;

    fn set_label(&mut self, node: NodeHandle, index: u32, label: i32) -> HostResult;
}

/// Everything the engine needs from an application.
pub trait Host: PropertyTree + Evaluator + KeyframeEditor {}

impl<T: PropertyTree + Evaluator + KeyframeEditor> Host for T {}
