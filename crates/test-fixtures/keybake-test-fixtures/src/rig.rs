//! JSON description of a host scene, built into a [`MockHost`].

use serde::Deserialize;

use keybake_animation_core::data::Keyframe;
use keybake_animation_core::NodeHandle;
use keybake_api_core::Value;

use crate::formula::FormulaSpec;
use crate::mock::MockHost;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RigSpec {
    #[serde(default = "default_frame_duration")]
    pub frame_duration: f64,
    #[serde(default = "default_timeline")]
    pub timeline: (f64, f64),
    pub layers: Vec<LayerSpec>,
}

fn default_frame_duration() -> f64 {
    1.0 / 24.0
}

fn default_timeline() -> (f64, f64) {
    (0.0, 4.0)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSpec {
    pub name: String,
    pub match_name: String,
    #[serde(default)]
    pub three_d: bool,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeSpec {
    Group {
        name: String,
        #[serde(rename = "matchName")]
        match_name: String,
        #[serde(default)]
        children: Vec<NodeSpec>,
    },
    Leaf(LeafSpec),
    Marker {
        name: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafSpec {
    pub name: String,
    pub match_name: String,
    pub value: Value,
    #[serde(default)]
    pub keys: Vec<Keyframe>,
    #[serde(default)]
    pub formula: Option<FormulaSpec>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub spatial: bool,
    #[serde(default)]
    pub locked: bool,
}

/// A built rig: the host plus its scene nodes in declaration order.
pub struct Rig {
    pub host: MockHost,
    pub layers: Vec<NodeHandle>,
}

impl Rig {
    /// Scene node by name.
    pub fn layer(&self, name: &str) -> Option<NodeHandle> {
        self.layers
            .iter()
            .copied()
            .find(|l| self.host.node(*l).map(|n| n.name == name).unwrap_or(false))
    }
}

impl RigSpec {
    pub fn build(&self) -> Rig {
        let mut host = MockHost::new(self.frame_duration, self.timeline);
        let mut layers = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let handle = host.add_scene_node(&layer.name, &layer.match_name);
            host.set_3d(handle, layer.three_d);
            for child in &layer.children {
                build_node(&mut host, handle, child);
            }
            layers.push(handle);
        }
        Rig { host, layers }
    }
}

fn build_node(host: &mut MockHost, parent: NodeHandle, spec: &NodeSpec) {
    match spec {
        NodeSpec::Group {
            name,
            match_name,
            children,
        } => {
            let group = host.add_group(parent, name, match_name);
            for child in children {
                build_node(host, group, child);
            }
        }
        NodeSpec::Marker { name } => {
            host.add_marker(parent, name);
        }
        NodeSpec::Leaf(leaf) => {
            let node = host.add_leaf(parent, &leaf.name, &leaf.match_name, leaf.value.clone());
            host.set_keys(node, leaf.keys.clone());
            if let Some(formula) = leaf.formula.as_ref() {
                host.set_formula(node, formula);
            }
            host.set_selected(node, leaf.selected);
            host.set_spatial(node, leaf.spatial);
            host.set_locked(node, leaf.locked);
        }
    }
}
