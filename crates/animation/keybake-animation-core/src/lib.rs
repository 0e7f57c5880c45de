//! Keybake Animation Core (host-agnostic)
//!
//! Capture, bake and transfer of keyframed parameter curves living in a host property
//! tree. The host is reached only through the traits in [`host`]; everything here is
//! single-threaded and runs in strict program order against it.

pub mod baking;
pub mod config;
pub mod data;
pub mod error;
pub mod host;
pub mod ids;
pub mod interp;
pub mod keyframes;
pub mod property_ref;
pub mod refine;
pub mod sampling;
pub mod transfer;

// Re-exports for consumers (adapters)
pub use baking::{BakeEngine, BakeReport, LeafBake, SkipReason};
pub use config::{default_precision, ApplyOptions, BakeConfig, BakeMode, CaptureOptions};
pub use data::{
    Animation, AnimationNode, GroupAnimation, InterpolationKind, KeyEase, Keyframe,
    NodeAnimation, SpatialEase, TimeRange,
};
pub use error::{AnimationError, HostError, HostResult};
pub use host::{EaseScope, Evaluator, Host, KeyframeEditor, NodeKind, PropertyTree};
pub use ids::{ChildKey, NodeHandle};
pub use keyframes::{
    clean_keyframes, clean_tree, fix_spatial_interpolation, set_keyframes_interpolation,
};
pub use property_ref::PropertyRef;
pub use refine::{SingleTrialRefiner, TangentRefiner};
pub use sampling::CurveSampler;
pub use transfer::{ApplyOutcome, ApplyReport};
pub use keybake_api_core::{Value, ValueKind};

pub type Result<T> = core::result::Result<T, AnimationError>;

/// Bake every formula-driven leaf under `pref`.
///
/// `frame_step` and `time_range` default to the host frame duration and timeline bounds.
pub fn bake<H: Host + ?Sized>(
    host: &mut H,
    pref: &PropertyRef,
    mode: BakeMode,
    frame_step: Option<f64>,
    time_range: Option<TimeRange>,
) -> Result<BakeReport> {
    let config = BakeConfig {
        mode,
        frame_step,
        time_range,
        ..Default::default()
    };
    BakeEngine::new(config).bake(host, pref)
}

/// Capture the animation tree below `pref` over `time_range` (timeline bounds when `None`).
pub fn capture_animation<H: Host + ?Sized>(
    host: &H,
    pref: &PropertyRef,
    time_range: Option<TimeRange>,
    selected_only: bool,
) -> Result<NodeAnimation> {
    let opts = CaptureOptions {
        time_range,
        selected_only,
    };
    transfer::capture_animation(host, pref, &opts)
}

/// Apply a captured tree onto `target`; returns the captured nodes that found no match.
pub fn apply_animation<H: Host + ?Sized>(
    host: &mut H,
    target: &PropertyRef,
    animation: &NodeAnimation,
    opts: &ApplyOptions,
) -> Result<ApplyOutcome> {
    transfer::apply_animation(host, target, animation, opts)
}

/// Time-reverse a captured tree in place.
pub fn reverse_animation(animation: &mut NodeAnimation) {
    transfer::reverse_animation(animation)
}
