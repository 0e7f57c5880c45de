//! Local tangent refinement of extreme keys after a smart bake.
//!
//! A refiner runs after the formula was disabled and the keys were written, so every
//! trial is measured on the live keyframed curve and must be rolled back when it does
//! not help. Trials are strictly sequential.

use keybake_api_core::{blend, Value};

use crate::baking::ExtremeSample;
use crate::data::KeyEase;
use crate::error::AnimationError;
use crate::host::{EaseScope, Host};
use crate::interp::functions::THIRD;
use crate::keyframes::key_index_at;
use crate::property_ref::PropertyRef;

/// Which sides of a key kept the trial ease.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RefineOutcome {
    pub kept_in: bool,
    pub kept_out: bool,
}

impl RefineOutcome {
    pub fn any(&self) -> bool {
        self.kept_in || self.kept_out
    }
}

/// Strategy improving the temporal ease of one extreme key.
pub trait TangentRefiner {
    fn refine<H: Host + ?Sized>(
        &self,
        host: &mut H,
        pref: &PropertyRef,
        extreme: &ExtremeSample,
        frame_step: f64,
    ) -> Result<RefineOutcome, AnimationError>;
}

/// One trial per side: the ease the key had before the bake (or, without one, an ease
/// built from the velocity sampled at the extreme) is kept on a side only when the
/// curve one grid step away gets strictly closer to the value sampled there before
/// baking. Auto-bezier is restored when both sides roll back.
#[derive(Copy, Clone, Debug, Default)]
pub struct SingleTrialRefiner;

impl TangentRefiner for SingleTrialRefiner {
    fn refine<H: Host + ?Sized>(
        &self,
        host: &mut H,
        pref: &PropertyRef,
        extreme: &ExtremeSample,
        frame_step: f64,
    ) -> Result<RefineOutcome, AnimationError> {
        let node = pref.resolve(&*host)?;
        let Some(index) = key_index_at(&*host, node, extreme.time) else {
            return Ok(RefineOutcome::default());
        };
        let Some(baseline) = host.keyframe(node, index) else {
            return Ok(RefineOutcome::default());
        };
        let sampled: Option<Vec<KeyEase>> = extreme
            .velocity
            .components()
            .map(|v| v.iter().map(|x| KeyEase::new(*x, THIRD)).collect());
        let trial = |original: Option<&Vec<KeyEase>>| {
            original
                .filter(|e| !e.is_empty())
                .cloned()
                .or_else(|| sampled.clone())
        };
        let original = extreme.original.as_ref();
        let (Some(cand_in), Some(cand_out)) = (
            trial(original.map(|o| &o.in_ease)),
            trial(original.map(|o| &o.out_ease)),
        ) else {
            return Ok(RefineOutcome::default());
        };
        let t_in = extreme.time - frame_step;
        let t_out = extreme.time + frame_step;

        let in_before = error_at(host.value_at(node, t_in, true), &extreme.prev_around);
        let out_before = error_at(host.value_at(node, t_out, true), &extreme.next_around);

        host.set_temporal_ease(node, index, &cand_in, &baseline.out_ease)?;
        let kept_in = error_at(host.value_at(node, t_in, true), &extreme.prev_around) < in_before;
        let in_final = if kept_in { &cand_in } else { &baseline.in_ease };

        host.set_temporal_ease(node, index, in_final, &cand_out)?;
        let kept_out =
            error_at(host.value_at(node, t_out, true), &extreme.next_around) < out_before;
        let out_final = if kept_out { &cand_out } else { &baseline.out_ease };

        host.set_temporal_ease(node, index, in_final, out_final)?;
        if !kept_in && !kept_out {
            host.set_auto_bezier(node, index, EaseScope::Temporal, baseline.temporal_auto_bezier)?;
            log::debug!("tangent trial rolled back at t={} on {}", extreme.time, pref);
        }
        Ok(RefineOutcome { kept_in, kept_out })
    }
}

fn error_at(live: Value, target: &Value) -> f64 {
    blend::distance(&live, target).unwrap_or(f64::INFINITY)
}
