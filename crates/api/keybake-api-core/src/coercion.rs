//! Coercion helpers between Value shapes.
//! Scalar <-> vector conversions pad with 0 or truncate; path and text never convert.

use thiserror::Error;

use crate::{Value, ValueKind};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("cannot coerce {from:?} into {to:?}")]
    Incompatible { from: ValueKind, to: ValueKind },
    #[error("{0:?} has no numeric components")]
    NotNumeric(ValueKind),
}

/// Convert a numeric Value into its component list.
/// - Scalar -> single element
/// - VecN / Color -> components
/// - Path / Text -> empty
pub fn to_components(v: &Value) -> Vec<f64> {
    v.components().map(<[f64]>::to_vec).unwrap_or_default()
}

/// Build a numeric value of `kind` from components, padding with 0 or truncating.
pub fn from_components(kind: ValueKind, comps: &[f64]) -> Result<Value, CoercionError> {
    let at = |i: usize| comps.get(i).copied().unwrap_or(0.0);
    match kind {
        ValueKind::Scalar => Ok(Value::Scalar(at(0))),
        ValueKind::Vec2 => Ok(Value::Vec2([at(0), at(1)])),
        ValueKind::Vec3 => Ok(Value::Vec3([at(0), at(1), at(2)])),
        ValueKind::Color => Ok(Value::Color([at(0), at(1), at(2), at(3)])),
        other => Err(CoercionError::NotNumeric(other)),
    }
}

/// Numeric kind with the given number of dimensions.
pub fn kind_for_dimensions(dims: u8) -> Option<ValueKind> {
    match dims {
        1 => Some(ValueKind::Scalar),
        2 => Some(ValueKind::Vec2),
        3 => Some(ValueKind::Vec3),
        4 => Some(ValueKind::Color),
        _ => None,
    }
}

/// Pad or truncate a numeric value to `dims` components.
///
/// Non-numeric values, and a `dims` of 0, return the value unchanged.
pub fn to_dimensions(v: &Value, dims: u8) -> Value {
    match (v.components(), kind_for_dimensions(dims)) {
        (Some(comps), Some(kind)) if kind != v.kind() => {
            from_components(kind, comps).unwrap_or_else(|_| v.clone())
        }
        _ => v.clone(),
    }
}

/// Coerce a value so it can be written to a parameter of `kind`.
pub fn coerce_to_kind(v: &Value, kind: ValueKind) -> Result<Value, CoercionError> {
    if v.kind() == kind {
        return Ok(v.clone());
    }
    match v.components() {
        Some(comps) if kind.is_numeric() => from_components(kind, comps),
        _ => Err(CoercionError::Incompatible {
            from: v.kind(),
            to: kind,
        }),
    }
}
