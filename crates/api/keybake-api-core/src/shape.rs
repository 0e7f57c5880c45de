//! Bezier path values (mask and shape outlines).

use serde::{Deserialize, Serialize};

/// A bezier path: vertices with tangents relative to each vertex.
///
/// `in_tangents` and `out_tangents` always have the same length as `vertices`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PathShape {
    pub vertices: Vec<[f64; 2]>,
    #[serde(rename = "inTangents")]
    pub in_tangents: Vec<[f64; 2]>,
    #[serde(rename = "outTangents")]
    pub out_tangents: Vec<[f64; 2]>,
    #[serde(default)]
    pub closed: bool,
}

impl PathShape {
    /// Build a polygon (all tangents zero).
    pub fn polygon(vertices: Vec<[f64; 2]>, closed: bool) -> Self {
        let n = vertices.len();
        Self {
            vertices,
            in_tangents: vec![[0.0; 2]; n],
            out_tangents: vec![[0.0; 2]; n],
            closed,
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Two paths can be blended vertex by vertex only when their topology matches.
    pub fn same_topology(&self, other: &PathShape) -> bool {
        self.len() == other.len()
            && self.closed == other.closed
            && self.in_tangents.len() == other.in_tangents.len()
            && self.out_tangents.len() == other.out_tangents.len()
    }

    /// Iterate over every point of the path (vertices then tangents).
    pub fn points(&self) -> impl Iterator<Item = &[f64; 2]> {
        self.vertices
            .iter()
            .chain(self.in_tangents.iter())
            .chain(self.out_tangents.iter())
    }

    /// Apply `f` pairwise to every point of two paths with the same topology.
    pub fn zip_points(
        &self,
        other: &PathShape,
        mut f: impl FnMut([f64; 2], [f64; 2]) -> [f64; 2],
    ) -> Option<PathShape> {
        if !self.same_topology(other) {
            return None;
        }
        let mut zip = |a: &[[f64; 2]], b: &[[f64; 2]]| -> Vec<[f64; 2]> {
            a.iter().zip(b.iter()).map(|(p, q)| f(*p, *q)).collect()
        };
        let vertices = zip(&self.vertices, &other.vertices);
        let in_tangents = zip(&self.in_tangents, &other.in_tangents);
        let out_tangents = zip(&self.out_tangents, &other.out_tangents);
        Some(PathShape {
            vertices,
            in_tangents,
            out_tangents,
            closed: self.closed,
        })
    }
}
