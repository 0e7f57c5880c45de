//! Value: runtime instances of animatable parameters.
//! All numeric types use f64; timelines are sampled at sub-frame precision.

use serde::{Deserialize, Serialize};

use crate::shape::PathShape;

/// Coarse kind of a parameter as reported by the host.
///
/// `Marker` and `NoValue` are kinds a host tree may contain but that never carry
/// a curve; they have no [`Value`] counterpart and are skipped by baking sweeps.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Scalar,
    Vec2,
    Vec3,
    Color,
    Path,
    Text,
    Marker,
    NoValue,
}

impl ValueKind {
    /// Number of numeric components, or 0 for kinds that are not component vectors.
    #[inline]
    pub fn arity(self) -> u8 {
        match self {
            ValueKind::Scalar => 1,
            ValueKind::Vec2 => 2,
            ValueKind::Vec3 => 3,
            ValueKind::Color => 4,
            ValueKind::Path | ValueKind::Text | ValueKind::Marker | ValueKind::NoValue => 0,
        }
    }

    /// Scalar, vector and color kinds.
    #[inline]
    pub fn is_numeric(self) -> bool {
        self.arity() > 0
    }

    /// Kinds whose values can be blended between keyframes (numeric kinds and paths).
    #[inline]
    pub fn is_interpolable(self) -> bool {
        self.is_numeric() || self == ValueKind::Path
    }

    /// Kinds that can hold a curve at all.
    #[inline]
    pub fn is_curve(self) -> bool {
        !matches!(self, ValueKind::Marker | ValueKind::NoValue)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Value {
    /// Scalar parameter (opacity, rotation, slider...)
    Scalar(f64),

    /// 2D vector (position on a flat node, scale...)
    Vec2([f64; 2]),

    /// 3D vector
    Vec3([f64; 3]),

    /// RGBA color
    Color([f64; 4]),

    /// Bezier path (mask or shape outline)
    Path(PathShape),

    /// Text; step-only for interpolation
    Text(String),
}

impl Value {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Color(_) => ValueKind::Color,
            Value::Path(_) => ValueKind::Path,
            Value::Text(_) => ValueKind::Text,
        }
    }

    /// Number of numeric components (0 for path and text).
    #[inline]
    pub fn dimensions(&self) -> u8 {
        self.kind().arity()
    }

    /// Borrow the numeric components, if this is a numeric value.
    pub fn components(&self) -> Option<&[f64]> {
        match self {
            Value::Scalar(v) => Some(std::slice::from_ref(v)),
            Value::Vec2(a) => Some(a.as_slice()),
            Value::Vec3(a) => Some(a.as_slice()),
            Value::Color(a) => Some(a.as_slice()),
            Value::Path(_) | Value::Text(_) => None,
        }
    }

    /// Mutable access to the numeric components.
    pub fn components_mut(&mut self) -> Option<&mut [f64]> {
        match self {
            Value::Scalar(v) => Some(std::slice::from_mut(v)),
            Value::Vec2(a) => Some(a.as_mut_slice()),
            Value::Vec3(a) => Some(a.as_mut_slice()),
            Value::Color(a) => Some(a.as_mut_slice()),
            Value::Path(_) | Value::Text(_) => None,
        }
    }

    /// Neutral value of a kind: zeros, an empty open path, empty text.
    ///
    /// Returns `None` for kinds that carry no value.
    pub fn zero(kind: ValueKind) -> Option<Self> {
        match kind {
            ValueKind::Scalar => Some(Value::Scalar(0.0)),
            ValueKind::Vec2 => Some(Value::Vec2([0.0; 2])),
            ValueKind::Vec3 => Some(Value::Vec3([0.0; 3])),
            ValueKind::Color => Some(Value::Color([0.0; 4])),
            ValueKind::Path => Some(Value::Path(PathShape::default())),
            ValueKind::Text => Some(Value::Text(String::new())),
            ValueKind::Marker | ValueKind::NoValue => None,
        }
    }

    /// Convenience constructors
    pub fn scalar(v: f64) -> Self {
        Value::Scalar(v)
    }

    pub fn vec2(x: f64, y: f64) -> Self {
        Value::Vec2([x, y])
    }

    pub fn vec3(x: f64, y: f64, z: f64) -> Self {
        Value::Vec3([x, y, z])
    }

    pub fn color(r: f64, g: f64, b: f64, a: f64) -> Self {
        Value::Color([r, g, b, a])
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }
}
