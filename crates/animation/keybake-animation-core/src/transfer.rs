//! Animation transfer: capture a property subtree into a plain [`NodeAnimation`],
//! apply it onto another subtree, and reverse it in time.

use serde::{Deserialize, Serialize};

use keybake_api_core::{blend, coercion, Value};

use crate::config::{ApplyOptions, CaptureOptions};
use crate::data::{Animation, AnimationNode, GroupAnimation, NodeAnimation, TimeRange};
use crate::error::AnimationError;
use crate::host::{Host, PropertyTree};
use crate::keyframes::{clear_keyframes, key_index_at, keys_of, not_writable, write_key_attributes};
use crate::property_ref::PropertyRef;
use crate::Result;

/// Capture the animation of `pref` and everything below it.
///
/// Keys inside the window are kept with times rebased to the window start; boundary
/// values are sampled without formula at the window edges. With `selected_only`, only
/// selected leaves (and groups leading to one) are kept.
pub fn capture_animation<H: Host + ?Sized>(
    host: &H,
    pref: &PropertyRef,
    opts: &CaptureOptions,
) -> Result<NodeAnimation> {
    let node = pref.resolve(host)?;
    let range = match opts.time_range {
        Some(r) => r,
        None => {
            let (start, end) = host.timeline_bounds(node);
            TimeRange::new(start, end)
        }
    };
    if !range.is_valid() {
        return Err(AnimationError::InvalidTimeRange {
            start: range.start,
            end: range.end,
        });
    }
    let root = match capture_node(host, pref, range, opts.selected_only)? {
        Some(root) => root,
        None => AnimationNode::Group(GroupAnimation::new(
            pref.name(host)?,
            pref.match_name(host)?,
        )),
    };
    let scene = pref.root();
    let index = host
        .index_in_parent(scene)
        .map(|i| i as i32)
        .unwrap_or(-1);
    Ok(NodeAnimation::new(host.name(scene), index, root))
}

fn capture_node<H: Host + ?Sized>(
    host: &H,
    pref: &PropertyRef,
    range: TimeRange,
    selected_only: bool,
) -> Result<Option<AnimationNode>> {
    let node = pref.resolve(host)?;
    if pref.is_leaf() {
        if !host.value_kind(node).is_curve() || (selected_only && !host.is_selected(node)) {
            return Ok(None);
        }
        return capture_leaf(host, pref, range).map(|a| Some(AnimationNode::Leaf(a)));
    }
    let mut group = GroupAnimation::new(host.name(node), host.match_name(node));
    for child in pref.children(host)? {
        if let Some(captured) = capture_node(host, &child, range, selected_only)? {
            group.push(captured);
        }
    }
    if selected_only && group.children.is_empty() {
        return Ok(None);
    }
    Ok(Some(AnimationNode::Group(group)))
}

fn capture_leaf<H: Host + ?Sized>(
    host: &H,
    pref: &PropertyRef,
    range: TimeRange,
) -> Result<Animation> {
    let node = pref.resolve(host)?;
    let keys = keys_of(host, node)
        .into_iter()
        .filter(|k| range.contains(k.time))
        .map(|mut k| {
            k.time -= range.start;
            k
        })
        .collect();
    let mut anim = Animation::new(
        host.name(node),
        host.match_name(node),
        host.value_at(node, range.start, true),
    )
    .with_keys(keys);
    anim.end_value = host.value_at(node, range.end, true);
    anim.dimensions = pref.dimensions(host)?;
    anim.expression = host.formula(node).filter(|f| !f.is_empty());
    Ok(anim)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedApply {
    pub path: String,
    pub reason: String,
}

/// Per-leaf bookkeeping of an apply sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Target leaves that received data.
    pub applied: Vec<String>,
    /// Matched target leaves that were left alone.
    pub skipped: Vec<SkippedApply>,
}

/// Result of [`apply_animation`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApplyOutcome {
    /// Captured nodes that found no structural match in the target.
    pub remaining: Vec<AnimationNode>,
    pub report: ApplyReport,
}

impl ApplyOutcome {
    pub fn is_complete(&self) -> bool {
        self.remaining.is_empty()
    }
}

/// Apply a captured tree onto `target`.
///
/// Children are matched in order by `(type id, name)` (type id only with
/// `ignore_name`); each target child receives at most one captured node. Unmatched
/// captured nodes are returned in [`ApplyOutcome::remaining`]. Leaf failures are
/// recorded and the sweep continues.
///
/// A non-empty whitelist limits writes to subtrees whose root type id (the target, a
/// matched group or a matched leaf) is listed.
pub fn apply_animation<H: Host + ?Sized>(
    host: &mut H,
    target: &PropertyRef,
    anim: &NodeAnimation,
    opts: &ApplyOptions,
) -> Result<ApplyOutcome> {
    let mut out = ApplyOutcome::default();
    let eligible = opts.allows(&target.match_name(&*host)?);
    match (&anim.root, target.is_leaf()) {
        (AnimationNode::Group(g), false) => {
            apply_children(host, target, &g.children, opts, eligible, &mut out)?;
        }
        (AnimationNode::Leaf(_), false) => {
            let single = std::slice::from_ref(&anim.root);
            apply_children(host, target, single, opts, eligible, &mut out)?;
        }
        (AnimationNode::Leaf(leaf), true) => {
            apply_matched_leaf(host, target, leaf, opts, eligible, &mut out);
        }
        (AnimationNode::Group(_), true) => out.remaining.push(anim.root.clone()),
    }
    Ok(out)
}

fn matches<H: PropertyTree + ?Sized>(
    host: &H,
    target: &PropertyRef,
    captured: &AnimationNode,
    opts: &ApplyOptions,
) -> Result<bool> {
    if target.is_leaf() == captured.is_group() {
        return Ok(false);
    }
    if target.match_name(host)? != captured.match_id() {
        return Ok(false);
    }
    Ok(opts.ignore_name || target.name(host)? == captured.name())
}

fn apply_children<H: Host + ?Sized>(
    host: &mut H,
    target: &PropertyRef,
    children: &[AnimationNode],
    opts: &ApplyOptions,
    eligible: bool,
    out: &mut ApplyOutcome,
) -> Result<()> {
    let targets = target.children(&*host)?;
    let mut used = vec![false; targets.len()];
    for captured in children {
        let mut found = None;
        for (i, t) in targets.iter().enumerate() {
            if !used[i] && matches(&*host, t, captured, opts)? {
                found = Some(i);
                break;
            }
        }
        let Some(i) = found else {
            log::trace!("no match for {} under {}", captured.name(), target);
            out.remaining.push(captured.clone());
            continue;
        };
        used[i] = true;
        let t = &targets[i];
        let eligible = eligible || opts.allows(&t.match_name(&*host)?);
        match captured {
            AnimationNode::Group(g) => apply_children(host, t, &g.children, opts, eligible, out)?,
            AnimationNode::Leaf(leaf) => apply_matched_leaf(host, t, leaf, opts, eligible, out),
        }
    }
    Ok(())
}

fn apply_matched_leaf<H: Host + ?Sized>(
    host: &mut H,
    target: &PropertyRef,
    anim: &Animation,
    opts: &ApplyOptions,
    eligible: bool,
    out: &mut ApplyOutcome,
) {
    let path = target.path_string();
    if !eligible {
        out.report.skipped.push(SkippedApply {
            path,
            reason: "not whitelisted".into(),
        });
        return;
    }
    match apply_leaf(host, target, anim, opts) {
        Ok(()) => out.report.applied.push(path),
        Err(e) => {
            log::warn!("apply skipped {} ({}): {}", target, e.category(), e);
            out.report.skipped.push(SkippedApply {
                path,
                reason: e.to_string(),
            });
        }
    }
}

/// Write one captured leaf onto one target leaf.
pub fn apply_leaf<H: Host + ?Sized>(
    host: &mut H,
    target: &PropertyRef,
    anim: &Animation,
    opts: &ApplyOptions,
) -> Result<()> {
    if !target.is_editable(host)? {
        return Err(not_writable(target));
    }
    let node = target.resolve(&*host)?;
    let delta = match anim.keys.first() {
        Some(first) if opts.offset => {
            let current = host.value_at(node, first.time + opts.time, true);
            offset_delta(&current, &anim.start_value)
        }
        _ => None,
    };
    if opts.replace {
        clear_keyframes(host, target)?;
    }

    if anim.keys.is_empty() {
        if !opts.offset && !opts.only_keyframes {
            target.set_value(host, &anim.start_value)?;
        }
    } else {
        let mut times = Vec::with_capacity(anim.keys.len());
        let mut values = Vec::with_capacity(anim.keys.len());
        for key in &anim.keys {
            let value = match delta.as_ref() {
                Some(d) => blend::add(&key.value, d).unwrap_or_else(|| key.value.clone()),
                None => key.value.clone(),
            };
            times.push(key.time + opts.time);
            values.push(target.coerce_value(&*host, &value)?);
        }
        let node = target.resolve(&*host)?;
        host.insert_keyframes_batch(node, &times, &values)?;
        for (key, time) in anim.keys.iter().zip(times.iter()) {
            if let Some(index) = key_index_at(&*host, node, *time) {
                write_key_attributes(host, node, index, key)?;
            }
        }
    }

    if opts.set_expression {
        if let Some(expr) = anim.expression.as_deref() {
            if target.is_formula_capable(host)? {
                let node = target.resolve(&*host)?;
                host.try_set_formula(node, expr)?;
                host.try_set_formula_enabled(node, true)?;
            }
        }
    }
    Ok(())
}

/// `current - start`, in the captured value's shape; `None` for values without arithmetic.
fn offset_delta(current: &Value, start: &Value) -> Option<Value> {
    let current = coercion::coerce_to_kind(current, start.kind()).ok()?;
    blend::sub(&current, start)
}

/// Reverse a captured tree in time, in place.
///
/// The global key window is read once before any leaf changes; every key time `t`
/// maps to `start + end - t`. In/out interpolation, ease (speed negated) and spatial
/// tangents swap, and so do each leaf's start/end values.
pub fn reverse_animation(anim: &mut NodeAnimation) {
    if let AnimationNode::Group(g) = &mut anim.root {
        g.refresh_time_bounds();
    }
    let Some((start, end)) = anim.time_bounds() else {
        anim.root.for_each_leaf_mut(&mut |leaf| {
            std::mem::swap(&mut leaf.start_value, &mut leaf.end_value);
        });
        return;
    };
    anim.root.for_each_leaf_mut(&mut |leaf| {
        leaf.keys.reverse();
        for key in leaf.keys.iter_mut() {
            key.time = start + end - key.time;
            key.swap_sides();
        }
        leaf.reindex();
        std::mem::swap(&mut leaf.start_value, &mut leaf.end_value);
    });
    if let AnimationNode::Group(g) = &mut anim.root {
        g.refresh_time_bounds();
    }
}
