//! Error types for capture, bake and transfer operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use keybake_api_core::ValueKind;

/// Failure reported by a host write or probe.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("host rejected operation: {reason}")]
pub struct HostError {
    pub reason: String,
}

impl HostError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

pub type HostResult<T = ()> = core::result::Result<T, HostError>;

/// Error type for animation operations
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimationError {
    /// The stored index path no longer denotes a node of the expected structural kind
    #[error("Invalid property reference {path}: {reason}")]
    InvalidReference { path: String, reason: String },

    /// A leaf was required but a container was given (or the reverse)
    #[error("Property {path} is not a leaf parameter")]
    NotALeaf { path: String },

    /// The parameter rejected a programmatic write
    #[error("Property {path} is not writable")]
    NotWritable { path: String },

    /// Value kind that cannot be written to the target
    #[error("Value kind mismatch on {path}: expected {expected:?}, got {actual:?}")]
    KindMismatch {
        path: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// Empty, reversed or non-finite time range
    #[error("Invalid time range [{start}, {end}]")]
    InvalidTimeRange { start: f64, end: f64 },

    /// Host failure surfaced from a single-leaf operation
    #[error(transparent)]
    Host(#[from] HostError),

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl AnimationError {
    /// Tree-wide sweeps skip leaves failing with a recoverable error and continue.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotWritable { .. } | Self::KindMismatch { .. } | Self::Host(_)
        )
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidReference { .. } | Self::NotALeaf { .. } => "reference",
            Self::NotWritable { .. } | Self::Host(_) => "host",
            Self::KindMismatch { .. } | Self::InvalidTimeRange { .. } => "validation",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for AnimationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
