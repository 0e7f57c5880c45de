//! Baking: re-encode formula-driven curves as keyframes.
//!
//! - Quick bake writes one key per grid step, simplifies, then makes every key
//!   continuous bezier.
//! - Smart bake keys the curve's extremes (plus the range anchors, and velocity
//!   inflections when enabled), simplifies, and refines the tangents of extremes,
//!   trying the ease of any key that sat there before the bake.
//!
//! Only leaves with an enabled formula are baked; the formula is disabled afterwards,
//! so baking the same tree again is a no-op. Paths and text always use quick bake.

use serde::{Deserialize, Serialize};

use keybake_api_core::{blend, compare, Value, ValueKind};

use crate::config::{BakeConfig, BakeMode};
use crate::data::{InterpolationKind, KeyEase, Keyframe, TimeRange};
use crate::error::AnimationError;
use crate::host::Host;
use crate::ids::NodeHandle;
use crate::interp::functions::THIRD;
use crate::keyframes::{
    clean_keyframes, clear_keyframes, fix_spatial_interpolation, key_index_at, keys_of,
    set_keyframes_interpolation, TIME_EPSILON,
};
use crate::property_ref::PropertyRef;
use crate::refine::{SingleTrialRefiner, TangentRefiner};
use crate::sampling::CurveSampler;
use crate::Result;

/// A local extremum found by the smart bake pass, with the values sampled one grid
/// step on either side.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtremeSample {
    pub time: f64,
    pub value: Value,
    pub prev_around: Value,
    pub next_around: Value,
    /// Velocity at the extreme, sampled with the formula active.
    pub velocity: Value,
    /// Ease of the key that sat at this time before the bake replaced the keys.
    pub original: Option<OriginalEase>,
}

/// Temporal ease read from a pre-existing key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OriginalEase {
    pub in_ease: Vec<KeyEase>,
    pub out_ease: Vec<KeyEase>,
}

/// A velocity inflection found by the smart bake pass.
#[derive(Clone, Debug, PartialEq)]
pub struct InflectionSample {
    pub time: f64,
    pub value: Value,
    pub velocity: Value,
    /// Speed carrying the sign of the first non-zero velocity component.
    pub signed_speed: f64,
}

/// Why a leaf was left alone by a bake sweep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Marker or other kinds that cannot hold a curve.
    UnsupportedKind { kind: ValueKind },
    /// No formula, or the formula is disabled.
    NoFormula,
    /// The editable probe failed.
    NotEditable,
    /// A recoverable host failure in the middle of the bake.
    Failed { error: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BakedLeaf {
    pub path: String,
    pub mode: BakeMode,
    /// Keys left on the leaf after the bake.
    pub keys: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkippedLeaf {
    pub path: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Outcome of a bake sweep.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BakeReport {
    pub baked: Vec<BakedLeaf>,
    pub skipped: Vec<SkippedLeaf>,
}

impl BakeReport {
    pub fn baked_count(&self) -> usize {
        self.baked.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn merge(&mut self, other: BakeReport) {
        self.baked.extend(other.baked);
        self.skipped.extend(other.skipped);
    }

    fn skip(&mut self, pref: &PropertyRef, reason: SkipReason) {
        log::debug!("bake skipped {}: {:?}", pref, reason);
        self.skipped.push(SkippedLeaf {
            path: pref.path_string(),
            reason,
        });
    }
}

/// Per-leaf result of [`BakeEngine::bake_leaf`].
#[derive(Clone, Debug, PartialEq)]
pub enum LeafBake {
    Baked { mode: BakeMode, keys: u32 },
    Skipped(SkipReason),
}

/// Bake driver; the tangent refiner is swappable.
#[derive(Clone, Debug, Default)]
pub struct BakeEngine<R: TangentRefiner = SingleTrialRefiner> {
    config: BakeConfig,
    refiner: R,
}

impl BakeEngine<SingleTrialRefiner> {
    pub fn new(config: BakeConfig) -> Self {
        Self {
            config,
            refiner: SingleTrialRefiner,
        }
    }
}

impl<R: TangentRefiner> BakeEngine<R> {
    pub fn with_refiner(config: BakeConfig, refiner: R) -> Self {
        Self { config, refiner }
    }

    pub fn config(&self) -> &BakeConfig {
        &self.config
    }

    /// Bake every leaf under `pref` (or `pref` itself when it is a leaf).
    ///
    /// Leaf failures are recorded in the report and the sweep continues; only a
    /// failure to resolve a container aborts.
    pub fn bake<H: Host + ?Sized>(&self, host: &mut H, pref: &PropertyRef) -> Result<BakeReport> {
        let mut report = BakeReport::default();
        self.sweep(host, pref, &mut report)?;
        log::debug!(
            "bake of {} done: {} baked, {} skipped",
            pref,
            report.baked_count(),
            report.skipped_count()
        );
        Ok(report)
    }

    fn sweep<H: Host + ?Sized>(
        &self,
        host: &mut H,
        pref: &PropertyRef,
        report: &mut BakeReport,
    ) -> Result<()> {
        if !pref.is_leaf() {
            for child in pref.children(&*host)? {
                self.sweep(host, &child, report)?;
            }
            return Ok(());
        }
        match self.bake_leaf(host, pref) {
            Ok(LeafBake::Baked { mode, keys }) => report.baked.push(BakedLeaf {
                path: pref.path_string(),
                mode,
                keys,
            }),
            Ok(LeafBake::Skipped(reason)) => report.skip(pref, reason),
            Err(e) => {
                log::warn!("bake failed on {} ({}): {}", pref, e.category(), e);
                report.skip(pref, SkipReason::Failed { error: e.to_string() });
            }
        }
        Ok(())
    }

    /// Bake a single leaf.
    pub fn bake_leaf<H: Host + ?Sized>(&self, host: &mut H, pref: &PropertyRef) -> Result<LeafBake> {
        let node = pref.resolve(&*host)?;
        let kind = host.value_kind(node);
        if !kind.is_curve() {
            return Ok(LeafBake::Skipped(SkipReason::UnsupportedKind { kind }));
        }
        if host.formula(node).is_none() || !host.formula_enabled(node) {
            return Ok(LeafBake::Skipped(SkipReason::NoFormula));
        }
        if !pref.is_editable(host)? {
            return Ok(LeafBake::Skipped(SkipReason::NotEditable));
        }
        let sampler = match self.config.frame_step {
            Some(step) => CurveSampler::new(step),
            None => CurveSampler::for_property(&*host, pref)?,
        };
        let precision = self.config.precision_for(sampler.frame_step());
        let range = match self.config.time_range {
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
        let mode = if self.config.mode == BakeMode::Smart && kind.is_numeric() {
            BakeMode::Smart
        } else {
            BakeMode::Quick
        };
        match mode {
            BakeMode::Quick => quick_bake(host, pref, &sampler, range, precision)?,
            BakeMode::Smart => self.smart_bake(host, pref, &sampler, range, precision)?,
        }
        let node = pref.resolve(&*host)?;
        Ok(LeafBake::Baked {
            mode,
            keys: host.num_keys(node),
        })
    }

    fn smart_bake<H: Host + ?Sized>(
        &self,
        host: &mut H,
        pref: &PropertyRef,
        sampler: &CurveSampler,
        range: TimeRange,
        precision: u32,
    ) -> Result<()> {
        let mut pass = scan_curve(&*host, pref, sampler, range, precision)?;
        let node = pref.resolve(&*host)?;
        attach_original_ease(&mut pass.extremes, &keys_of(&*host, node), sampler.frame_step());
        let mut keys: Vec<(f64, Value)> = pass
            .anchors
            .iter()
            .cloned()
            .chain(pass.extremes.iter().map(|e| (e.time, e.value.clone())))
            .collect();
        if self.config.enable_inflection_pass {
            keys.extend(pass.inflections.iter().map(|s| (s.time, s.value.clone())));
        }
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        keys.dedup_by(|b, a| (b.0 - a.0).abs() <= TIME_EPSILON);
        log::trace!(
            "smart bake of {}: {} extremes, {} inflections",
            pref,
            pass.extremes.len(),
            pass.inflections.len()
        );

        replace_with_keys(host, pref, node, &keys)?;
        let step = sampler.frame_step();
        clean_keyframes(host, pref, step, precision)?;
        set_keyframes_interpolation(host, pref, InterpolationKind::Bezier, true)?;

        if self.config.refine_tangents {
            for extreme in &pass.extremes {
                self.refiner.refine(host, pref, extreme, step)?;
            }
        }
        if self.config.enable_inflection_pass {
            for inflection in &pass.inflections {
                apply_inflection_ease(host, pref, inflection)?;
            }
        }

        let node = pref.resolve(&*host)?;
        host.try_set_formula_enabled(node, false)?;
        clean_keyframes(host, pref, step, precision)?;
        fix_spatial_interpolation(host, pref, precision)?;
        Ok(())
    }
}

/// Remember, for every extreme, the ease of the nearest existing key within `window`.
fn attach_original_ease(extremes: &mut [ExtremeSample], originals: &[Keyframe], window: f64) {
    for extreme in extremes.iter_mut() {
        extreme.original = originals
            .iter()
            .filter(|k| (k.time - extreme.time).abs() <= window + TIME_EPSILON)
            .filter(|k| !k.in_ease.is_empty() || !k.out_ease.is_empty())
            .min_by(|a, b| {
                (a.time - extreme.time)
                    .abs()
                    .total_cmp(&(b.time - extreme.time).abs())
            })
            .map(|k| OriginalEase {
                in_ease: k.in_ease.clone(),
                out_ease: k.out_ease.clone(),
            });
    }
}

/// Turn the formula off, drop existing keys, then write `keys` in one batch.
fn replace_with_keys<H: Host + ?Sized>(
    host: &mut H,
    pref: &PropertyRef,
    node: NodeHandle,
    keys: &[(f64, Value)],
) -> Result<()> {
    host.try_set_formula_enabled(node, false)?;
    clear_keyframes(host, pref)?;
    let node = pref.resolve(&*host)?;
    let (times, values): (Vec<f64>, Vec<Value>) = keys.iter().cloned().unzip();
    host.insert_keyframes_batch(node, &times, &values)?;
    Ok(())
}

fn quick_bake<H: Host + ?Sized>(
    host: &mut H,
    pref: &PropertyRef,
    sampler: &CurveSampler,
    range: TimeRange,
    precision: u32,
) -> Result<()> {
    let mut keys = Vec::new();
    for t in sampler.grid(range.start, range.end) {
        keys.push((t, sampler.value_at(&*host, pref, t, false)?));
    }
    let node = pref.resolve(&*host)?;
    replace_with_keys(host, pref, node, &keys)?;
    clean_keyframes(host, pref, sampler.frame_step(), precision)?;
    set_keyframes_interpolation(host, pref, InterpolationKind::Bezier, true)?;
    Ok(())
}

fn apply_inflection_ease<H: Host + ?Sized>(
    host: &mut H,
    pref: &PropertyRef,
    inflection: &InflectionSample,
) -> Result<()> {
    let node = pref.resolve(&*host)?;
    let (Some(index), Some(velocity)) = (
        key_index_at(&*host, node, inflection.time),
        inflection.velocity.components(),
    ) else {
        return Ok(());
    };
    let ease: Vec<KeyEase> = velocity.iter().map(|v| KeyEase::new(*v, THIRD)).collect();
    host.set_temporal_ease(node, index, &ease, &ease)?;
    Ok(())
}

/// Result of the smart bake sampling pass.
#[derive(Clone, Debug, Default)]
pub struct CurveScan {
    /// Samples at the range start and end.
    pub anchors: Vec<(f64, Value)>,
    pub extremes: Vec<ExtremeSample>,
    pub inflections: Vec<InflectionSample>,
}

#[derive(Clone, Debug)]
struct Sample {
    time: f64,
    value: Value,
    velocity: Value,
}

/// Single pass over the grid keeping a (prev, cur, next) window of values and
/// velocities, all sampled with the formula active.
pub fn scan_curve<H: Host + ?Sized>(
    host: &H,
    pref: &PropertyRef,
    sampler: &CurveSampler,
    range: TimeRange,
    precision: u32,
) -> Result<CurveScan> {
    let times = sampler.grid(range.start, range.end);
    let sample = |t: f64| -> Result<Sample> {
        Ok(Sample {
            time: t,
            value: sampler.value_at(host, pref, t, false)?,
            velocity: sampler.velocity_at(host, pref, t)?,
        })
    };
    let mut scan = CurveScan::default();
    let Some(first_time) = times.first().copied() else {
        return Ok(scan);
    };
    let first = sample(first_time)?;
    scan.anchors.push((first.time, first.value.clone()));
    if times.len() == 1 {
        return Ok(scan);
    }

    let mut prev = first;
    let mut cur = sample(times[1])?;
    for &t in &times[2..] {
        let next = sample(t)?;
        if is_extreme(&prev.value, &cur.value, &next.value, precision) {
            scan.extremes.push(ExtremeSample {
                time: cur.time,
                value: cur.value.clone(),
                prev_around: prev.value.clone(),
                next_around: next.value.clone(),
                velocity: cur.velocity.clone(),
                original: None,
            });
        } else if is_inflection(&prev.velocity, &cur.velocity, &next.velocity, precision) {
            scan.inflections.push(InflectionSample {
                time: cur.time,
                value: cur.value.clone(),
                signed_speed: signed_speed(&cur.velocity),
                velocity: cur.velocity.clone(),
            });
        }
        prev = cur;
        cur = next;
    }
    scan.anchors.push((cur.time, cur.value));
    Ok(scan)
}

/// Per-component rounded trend signs of `a -> b`.
fn trend(a: &Value, b: &Value, precision: u32) -> Option<Vec<i8>> {
    let d = blend::sub(b, a)?;
    d.components()
        .map(|c| c.iter().map(|x| compare::rounded_sign(*x, precision)).collect())
}

fn trend_breaks(before: &[i8], after: &[i8]) -> bool {
    before.iter().zip(after.iter()).any(|(a, b)| a != b)
}

/// `cur` is an extreme when, on any component, the rounded trend from `prev` reverses
/// towards `next`, or the curve enters or leaves a plateau there.
pub fn is_extreme(prev: &Value, cur: &Value, next: &Value, precision: u32) -> bool {
    match (trend(prev, cur, precision), trend(cur, next, precision)) {
        (Some(before), Some(after)) => trend_breaks(&before, &after),
        _ => false,
    }
}

/// `cur_vel` is an inflection when the velocity's own trend reverses on a component.
pub fn is_inflection(prev_vel: &Value, cur_vel: &Value, next_vel: &Value, precision: u32) -> bool {
    match (
        trend(prev_vel, cur_vel, precision),
        trend(cur_vel, next_vel, precision),
    ) {
        (Some(before), Some(after)) => before
            .iter()
            .zip(after.iter())
            .any(|(a, b)| *a != 0 && *b != 0 && a != b),
        _ => false,
    }
}

fn signed_speed(velocity: &Value) -> f64 {
    let speed = blend::norm(velocity);
    let sign = velocity
        .components()
        .and_then(|c| c.iter().find(|x| **x != 0.0).copied())
        .map(f64::signum)
        .unwrap_or(1.0);
    speed * sign
}
