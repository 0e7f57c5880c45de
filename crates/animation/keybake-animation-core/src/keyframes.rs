//! Keyframe-level operations on a single leaf: reading, time-based index resolution,
//! attribute writes, simplification and interpolation fix-ups.
//!
//! Indices returned by the host are only trusted until the next insertion or removal;
//! every write here re-resolves its key by time first.

use keybake_api_core::compare;

use crate::config::default_precision;
use crate::data::{InterpolationKind, Keyframe, SpatialEase};
use crate::error::{AnimationError, HostResult};
use crate::host::{EaseScope, Host, KeyframeEditor};
use crate::ids::NodeHandle;
use crate::property_ref::PropertyRef;
use crate::Result;

/// Two key times closer than this denote the same key.
pub const TIME_EPSILON: f64 = 1e-6;

/// Every key of a leaf, in time order.
pub fn read_keys<H: Host + ?Sized>(host: &H, pref: &PropertyRef) -> Result<Vec<Keyframe>> {
    let node = pref.resolve(host)?;
    Ok(keys_of(host, node))
}

pub(crate) fn keys_of<H: KeyframeEditor + ?Sized>(host: &H, node: NodeHandle) -> Vec<Keyframe> {
    (0..host.num_keys(node))
        .filter_map(|i| host.keyframe(node, i))
        .collect()
}

/// Index of the key at `time`, if any.
pub fn key_index_at<H: KeyframeEditor + ?Sized>(
    host: &H,
    node: NodeHandle,
    time: f64,
) -> Option<u32> {
    (0..host.num_keys(node)).find(|i| {
        host.keyframe(node, *i)
            .map(|k| (k.time - time).abs() <= TIME_EPSILON)
            .unwrap_or(false)
    })
}

/// Write interpolation, temporal ease, continuity, spatial state and label of `key` onto
/// the host key at `index`.
///
/// Explicit ease is written before the auto-bezier flag so an auto key ends up auto.
pub fn write_key_attributes<H: Host + ?Sized>(
    host: &mut H,
    node: NodeHandle,
    index: u32,
    key: &Keyframe,
) -> HostResult {
    host.set_interpolation(node, index, key.in_interp, key.out_interp)?;
    if !key.in_ease.is_empty() || !key.out_ease.is_empty() {
        let in_ease = if key.in_ease.is_empty() { &key.out_ease } else { &key.in_ease };
        let out_ease = if key.out_ease.is_empty() { &key.in_ease } else { &key.out_ease };
        host.set_temporal_ease(node, index, in_ease, out_ease)?;
    }
    host.set_continuity(node, index, EaseScope::Temporal, key.temporal_continuous)?;
    host.set_auto_bezier(node, index, EaseScope::Temporal, key.temporal_auto_bezier)?;
    if let Some(spatial) = key.spatial.as_ref() {
        if host.is_spatial(node) {
            write_spatial(host, node, index, spatial)?;
        }
    }
    if key.label != 0 {
        host.set_label(node, index, key.label)?;
    }
    Ok(())
}

fn write_spatial<H: Host + ?Sized>(
    host: &mut H,
    node: NodeHandle,
    index: u32,
    spatial: &SpatialEase,
) -> HostResult {
    host.set_spatial_tangents(node, index, &spatial.in_tangent, &spatial.out_tangent)?;
    host.set_continuity(node, index, EaseScope::Spatial, spatial.continuous)?;
    host.set_auto_bezier(node, index, EaseScope::Spatial, spatial.auto_bezier)?;
    host.set_roving(node, index, spatial.roving)
}

/// Re-create a previously read key (value and every attribute) at its own time.
pub fn restore_key<H: Host + ?Sized>(host: &mut H, node: NodeHandle, key: &Keyframe) -> HostResult {
    let index = host.try_set_value_at_time(node, key.time, &key.value)?;
    write_key_attributes(host, node, index, key)
}

/// Remove redundant keys of one leaf.
///
/// Keys are visited last to first. A key is removed when the live curve, sampled
/// without formula one grid step before, at, and one step after its time, is unchanged
/// at `precision` decimals by the removal; otherwise it is put back. A leaf left with a
/// single key becomes static. Returns the number of removed keys.
pub fn clean_keyframes<H: Host + ?Sized>(
    host: &mut H,
    pref: &PropertyRef,
    frame_step: f64,
    precision: u32,
) -> Result<usize> {
    let node = pref.resolve(&*host)?;
    if !host.value_kind(node).is_curve() {
        return Ok(0);
    }
    let mut removed = 0usize;
    let count = host.num_keys(node);
    for index in (0..count).rev() {
        if host.num_keys(node) <= 1 {
            break;
        }
        let Some(key) = host.keyframe(node, index) else {
            continue;
        };
        let probes = [key.time - frame_step, key.time, key.time + frame_step];
        let before: Vec<_> = probes.iter().map(|t| host.value_at(node, *t, true)).collect();
        host.remove_keyframe(node, index)?;
        let unchanged = probes
            .iter()
            .zip(before.iter())
            .all(|(t, v)| compare::approx_eq(&host.value_at(node, *t, true), v, precision));
        if unchanged {
            removed += 1;
        } else {
            restore_key(host, node, &key)?;
        }
    }
    if host.num_keys(node) == 1 {
        if let Some(last) = host.keyframe(node, 0) {
            host.remove_keyframe(node, 0)?;
            host.try_set_value(node, &last.value)?;
            removed += 1;
        }
    }
    log::trace!("cleaned {removed} keyframes on {pref}");
    Ok(removed)
}

/// [`clean_keyframes`] over every editable leaf of a subtree, with the host grid step
/// and (unless given) the precision derived from it.
pub fn clean_tree<H: Host + ?Sized>(
    host: &mut H,
    pref: &PropertyRef,
    precision: Option<u32>,
) -> Result<usize> {
    if !pref.is_leaf() {
        let mut total = 0;
        for child in pref.children(&*host)? {
            total += clean_tree(host, &child, precision)?;
        }
        return Ok(total);
    }
    if !pref.is_editable(host)? {
        return Ok(0);
    }
    let step = host.frame_duration(pref.resolve(&*host)?);
    let precision = precision.unwrap_or_else(|| default_precision(step));
    clean_keyframes(host, pref, step, precision)
}

/// Set every key of a leaf to `kind` on both sides.
///
/// With `continuous`, Bezier keys are also made temporally continuous and auto-bezier.
/// Text leaves only ever hold and are left untouched.
pub fn set_keyframes_interpolation<H: Host + ?Sized>(
    host: &mut H,
    pref: &PropertyRef,
    kind: InterpolationKind,
    continuous: bool,
) -> Result<()> {
    let node = pref.resolve(&*host)?;
    if !host.value_kind(node).is_interpolable() {
        return Ok(());
    }
    let smooth = continuous && kind == InterpolationKind::Bezier;
    for index in 0..host.num_keys(node) {
        host.set_interpolation(node, index, kind, kind)?;
        if smooth {
            host.set_continuity(node, index, EaseScope::Temporal, true)?;
            host.set_auto_bezier(node, index, EaseScope::Temporal, true)?;
        }
    }
    Ok(())
}

/// Zero the spatial tangents between consecutive keys holding the same position.
///
/// No-op on non-spatial leaves. Returns the number of segments straightened.
pub fn fix_spatial_interpolation<H: Host + ?Sized>(
    host: &mut H,
    pref: &PropertyRef,
    precision: u32,
) -> Result<usize> {
    let node = pref.resolve(&*host)?;
    if !host.is_spatial(node) {
        return Ok(0);
    }
    let mut fixed = 0usize;
    let count = host.num_keys(node);
    for index in 1..count {
        let (Some(a), Some(b)) = (host.keyframe(node, index - 1), host.keyframe(node, index))
        else {
            continue;
        };
        if !compare::approx_eq(&a.value, &b.value, precision) {
            continue;
        }
        let dims = usize::from(a.value.dimensions());
        let zeros = vec![0.0; dims];
        let a_sp = a.spatial.unwrap_or_else(|| SpatialEase::zero(dims));
        let b_sp = b.spatial.unwrap_or_else(|| SpatialEase::zero(dims));
        host.set_spatial_tangents(node, index - 1, &a_sp.in_tangent, &zeros)?;
        host.set_spatial_tangents(node, index, &zeros, &b_sp.out_tangent)?;
        fixed += 1;
    }
    Ok(fixed)
}

/// Remove every key of a leaf, keeping its current value as the static value.
pub fn clear_keyframes<H: Host + ?Sized>(host: &mut H, pref: &PropertyRef) -> Result<()> {
    let node = pref.resolve(&*host)?;
    while host.num_keys(node) > 0 {
        let last = host.num_keys(node) - 1;
        host.remove_keyframe(node, last)?;
    }
    Ok(())
}

pub(crate) fn not_writable(pref: &PropertyRef) -> AnimationError {
    AnimationError::NotWritable {
        path: pref.path_string(),
    }
}
