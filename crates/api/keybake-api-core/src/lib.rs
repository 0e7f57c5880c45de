//! keybake-api-core: typed value domain for animatable parameters (engine-agnostic)

pub mod blend;
pub mod coercion;
pub mod compare;
pub mod shape;
pub mod value;

pub use coercion::CoercionError;
pub use shape::PathShape;
pub use value::{Value, ValueKind};
