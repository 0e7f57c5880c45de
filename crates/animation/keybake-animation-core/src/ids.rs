//! Identifiers for host nodes.

use serde::{Deserialize, Serialize};

/// Opaque handle to a live node in the host property tree.
///
/// Handles are only meaningful for the host generation they were obtained in;
/// [`PropertyRef`](crate::property_ref::PropertyRef) is the stable way to refer
/// to a parameter across structural mutations.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NodeHandle(pub u64);

/// Child selector used when walking the host tree.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChildKey<'a> {
    /// 0-based position among the parent's children.
    Index(u32),
    /// Display name or type id.
    Name(&'a str),
}

impl From<u32> for ChildKey<'_> {
    fn from(i: u32) -> Self {
        ChildKey::Index(i)
    }
}

impl<'a> From<&'a str> for ChildKey<'a> {
    fn from(s: &'a str) -> Self {
        ChildKey::Name(s)
    }
}
