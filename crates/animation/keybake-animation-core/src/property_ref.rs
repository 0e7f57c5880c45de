//! Identity-stable handles to parameters in the host tree.
//!
//! A [`PropertyRef`] stores the scene node it belongs to and the index path from that
//! node down to the parameter. The live handle is cached together with the host
//! generation it was resolved in; any structural mutation bumps the generation and the
//! next [`PropertyRef::resolve`] re-walks the path.

use std::cell::Cell;
use std::fmt;

use keybake_api_core::{coercion, Value, ValueKind};

use crate::error::{AnimationError, HostResult};
use crate::host::{Host, NodeKind, PropertyTree};
use crate::ids::{ChildKey, NodeHandle};

#[derive(Clone, Debug)]
pub struct PropertyRef {
    root: NodeHandle,
    path: Vec<u32>,
    kind: NodeKind,
    cached: Cell<Option<(NodeHandle, u64)>>,
}

impl PropertyRef {
    /// Capture the scene node and index path of a live node by walking its parents.
    ///
    /// A scene node itself yields an empty path.
    pub fn new<H: PropertyTree + ?Sized>(
        host: &H,
        live: NodeHandle,
    ) -> Result<Self, AnimationError> {
        let mut path = Vec::new();
        let mut cur = live;
        while !host.is_scene_node(cur) {
            let parent = host
                .parent(cur)
                .ok_or_else(|| AnimationError::InvalidReference {
                    path: format!("{cur:?}"),
                    reason: "node is not attached to a scene node".into(),
                })?;
            let idx = host
                .index_in_parent(cur)
                .ok_or_else(|| AnimationError::InvalidReference {
                    path: format!("{cur:?}"),
                    reason: "node has no position in its parent".into(),
                })?;
            path.push(idx);
            cur = parent;
        }
        path.reverse();
        Ok(Self {
            root: cur,
            path,
            kind: host.node_kind(live),
            cached: Cell::new(Some((live, host.generation()))),
        })
    }

    /// Reference to a scene node's own property group.
    pub fn scene_node<H: PropertyTree + ?Sized>(host: &H, node: NodeHandle) -> Self {
        Self {
            root: node,
            path: Vec::new(),
            kind: NodeKind::Container,
            cached: Cell::new(Some((node, host.generation()))),
        }
    }

    pub fn root(&self) -> NodeHandle {
        self.root
    }

    pub fn path(&self) -> &[u32] {
        &self.path
    }

    /// Structural kind expected at the end of the path.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    /// `NodeHandle(7):/0/2/1`-style rendering of the reference, used in errors and logs.
    pub fn path_string(&self) -> String {
        self.to_string()
    }

    /// Current live node, re-walking the index path if the host generation moved.
    pub fn resolve<H: PropertyTree + ?Sized>(
        &self,
        host: &H,
    ) -> Result<NodeHandle, AnimationError> {
        let generation = host.generation();
        if let Some((node, gen)) = self.cached.get() {
            if gen == generation {
                return Ok(node);
            }
        }
        let mut cur = self.root;
        for (depth, idx) in self.path.iter().enumerate() {
            if host.node_kind(cur) != NodeKind::Container {
                return Err(self.invalid(format!(
                    "node at depth {depth} is no longer a container"
                )));
            }
            cur = host
                .resolve_child(cur, ChildKey::Index(*idx))
                .ok_or_else(|| self.invalid(format!("no child {idx} at depth {depth}")))?;
        }
        if host.node_kind(cur) != self.kind {
            return Err(self.invalid(format!(
                "expected {:?}, found {:?}",
                self.kind,
                host.node_kind(cur)
            )));
        }
        self.cached.set(Some((cur, generation)));
        Ok(cur)
    }

    /// Drop the cached handle; the next resolve re-walks the path.
    pub fn invalidate(&self) {
        self.cached.set(None);
    }

    fn invalid(&self, reason: String) -> AnimationError {
        AnimationError::InvalidReference {
            path: self.path_string(),
            reason,
        }
    }

    fn leaf<H: PropertyTree + ?Sized>(&self, host: &H) -> Result<NodeHandle, AnimationError> {
        if !self.is_leaf() {
            return Err(AnimationError::NotALeaf {
                path: self.path_string(),
            });
        }
        self.resolve(host)
    }

    /// Reference to the `index`-th child of this container.
    pub fn child<H: PropertyTree + ?Sized>(
        &self,
        host: &H,
        index: u32,
    ) -> Result<Self, AnimationError> {
        let node = self.resolve(host)?;
        let child = host
            .resolve_child(node, ChildKey::Index(index))
            .ok_or_else(|| self.invalid(format!("no child {index}")))?;
        let mut path = self.path.clone();
        path.push(index);
        Ok(Self {
            root: self.root,
            path,
            kind: host.node_kind(child),
            cached: Cell::new(Some((child, host.generation()))),
        })
    }

    /// References to every child (empty for leaves).
    pub fn children<H: PropertyTree + ?Sized>(
        &self,
        host: &H,
    ) -> Result<Vec<Self>, AnimationError> {
        if self.is_leaf() {
            return Ok(Vec::new());
        }
        let node = self.resolve(host)?;
        (0..host.num_children(node))
            .map(|i| self.child(host, i))
            .collect()
    }

    pub fn name<H: PropertyTree + ?Sized>(&self, host: &H) -> Result<String, AnimationError> {
        Ok(host.name(self.resolve(host)?))
    }

    pub fn match_name<H: PropertyTree + ?Sized>(
        &self,
        host: &H,
    ) -> Result<String, AnimationError> {
        Ok(host.match_name(self.resolve(host)?))
    }

    pub fn value_kind<H: PropertyTree + ?Sized>(
        &self,
        host: &H,
    ) -> Result<ValueKind, AnimationError> {
        Ok(host.value_kind(self.leaf(host)?))
    }

    /// 0 (non-numeric), 1, 2, 3 or 4; a 3-axis value of a flat scene node counts as 2.
    pub fn dimensions<H: PropertyTree + ?Sized>(&self, host: &H) -> Result<u8, AnimationError> {
        let node = self.leaf(host)?;
        let kind = host.value_kind(node);
        if kind == ValueKind::Vec3 && !host.is_3d(self.root) {
            return Ok(2);
        }
        Ok(kind.arity())
    }

    /// Probe whether the parameter accepts programmatic writes by rewriting its current
    /// value. The probe leaves the value unchanged.
    pub fn is_editable<H: Host + ?Sized>(&self, host: &mut H) -> Result<bool, AnimationError> {
        let node = self.leaf(&*host)?;
        if !host.value_kind(node).is_curve() {
            return Ok(false);
        }
        let probe: HostResult = match host.keyframe(node, 0) {
            Some(first) => host
                .try_set_value_at_time(node, first.time, &first.value)
                .map(|_| ()),
            None => {
                let current = host.value_at(node, 0.0, true);
                host.try_set_value(node, &current)
            }
        };
        if let Err(e) = &probe {
            log::trace!("editable probe failed on {}: {}", self, e);
        }
        Ok(probe.is_ok())
    }

    /// Probe whether the parameter accepts a formula by rewriting the current one
    /// (or an empty one when there is none).
    pub fn is_formula_capable<H: Host + ?Sized>(
        &self,
        host: &mut H,
    ) -> Result<bool, AnimationError> {
        let node = self.leaf(&*host)?;
        let current = host.formula(node).unwrap_or_default();
        let enabled = host.formula_enabled(node);
        let probe = host.try_set_formula(node, &current);
        if probe.is_ok() && host.formula_enabled(node) != enabled {
            host.try_set_formula_enabled(node, enabled)?;
        }
        Ok(probe.is_ok())
    }

    /// Write a static value, coerced to the parameter's dimensions.
    pub fn set_value<H: Host + ?Sized>(
        &self,
        host: &mut H,
        value: &Value,
    ) -> Result<(), AnimationError> {
        let node = self.leaf(&*host)?;
        let value = self.coerce(&*host, node, value)?;
        host.try_set_value(node, &value)?;
        Ok(())
    }

    /// Write a keyframe, coerced to the parameter's dimensions; returns its index.
    pub fn set_value_at_time<H: Host + ?Sized>(
        &self,
        host: &mut H,
        time: f64,
        value: &Value,
    ) -> Result<u32, AnimationError> {
        let node = self.leaf(&*host)?;
        let value = self.coerce(&*host, node, value)?;
        Ok(host.try_set_value_at_time(node, time, &value)?)
    }

    /// `value` as it would be written to this leaf.
    pub fn coerce_value<H: PropertyTree + ?Sized>(
        &self,
        host: &H,
        value: &Value,
    ) -> Result<Value, AnimationError> {
        let node = self.leaf(host)?;
        self.coerce(host, node, value)
    }

    fn coerce<H: PropertyTree + ?Sized>(
        &self,
        host: &H,
        node: NodeHandle,
        value: &Value,
    ) -> Result<Value, AnimationError> {
        let kind = host.value_kind(node);
        if !kind.is_numeric() {
            if value.kind() != kind {
                return Err(AnimationError::KindMismatch {
                    path: self.path_string(),
                    expected: kind,
                    actual: value.kind(),
                });
            }
            return Ok(value.clone());
        }
        let dims = self.dimensions(host)?;
        let value = coercion::to_dimensions(value, dims);
        coercion::coerce_to_kind(&value, kind).map_err(|_| AnimationError::KindMismatch {
            path: self.path_string(),
            expected: kind,
            actual: value.kind(),
        })
    }
}

impl fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.path.iter().map(u32::to_string).collect();
        write!(f, "{:?}:/{}", self.root, parts.join("/"))
    }
}

/// Equality on identity (scene node + path), not on the cached handle.
impl PartialEq for PropertyRef {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.path == other.path && self.kind == other.kind
    }
}

impl Eq for PropertyRef {}
