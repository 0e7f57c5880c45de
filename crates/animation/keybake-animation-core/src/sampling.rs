//! Curve sampling through a [`PropertyRef`].
//!
//! Values come from the host evaluator; velocities are centered finite differences
//! with ε = half a grid step. No caching: the evaluator is stateful and every call is
//! forwarded.

use keybake_api_core::{blend, Value};

use crate::error::AnimationError;
use crate::host::{Evaluator, PropertyTree};
use crate::property_ref::PropertyRef;

/// Samples values, velocities and speeds of a parameter on a fixed grid step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CurveSampler {
    frame_step: f64,
}

impl CurveSampler {
    /// `frame_step` is the grid step (typically 1/fps); non-positive or non-finite
    /// steps fall back to 1/25 s.
    pub fn new(frame_step: f64) -> Self {
        let frame_step = if frame_step.is_finite() && frame_step > 0.0 {
            frame_step
        } else {
            DEFAULT_FRAME_STEP
        };
        Self { frame_step }
    }

    /// Sampler using the host's own frame duration for the referenced parameter.
    pub fn for_property<H: PropertyTree + ?Sized>(
        host: &H,
        pref: &PropertyRef,
    ) -> Result<Self, AnimationError> {
        Ok(Self::new(host.frame_duration(pref.resolve(host)?)))
    }

    #[inline]
    pub fn frame_step(&self) -> f64 {
        self.frame_step
    }

    /// Finite-difference half width.
    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.frame_step * 0.5
    }

    pub fn value_at<H: PropertyTree + Evaluator + ?Sized>(
        &self,
        host: &H,
        pref: &PropertyRef,
        t: f64,
        pre_formula: bool,
    ) -> Result<Value, AnimationError> {
        let node = pref.resolve(host)?;
        Ok(host.value_at(node, t, pre_formula))
    }

    /// `(value(t+ε) - value(t-ε)) / 2ε`, evaluated with the formula active.
    ///
    /// Text and mismatched samples have no derivative and yield a zero of the sampled kind.
    pub fn velocity_at<H: PropertyTree + Evaluator + ?Sized>(
        &self,
        host: &H,
        pref: &PropertyRef,
        t: f64,
    ) -> Result<Value, AnimationError> {
        let eps = self.epsilon();
        let forward = self.value_at(host, pref, t + eps, false)?;
        let backward = self.value_at(host, pref, t - eps, false)?;
        Ok(finite_difference(&forward, &backward, 2.0 * eps))
    }

    /// Euclidean norm of [`velocity_at`](Self::velocity_at).
    pub fn speed_at<H: PropertyTree + Evaluator + ?Sized>(
        &self,
        host: &H,
        pref: &PropertyRef,
        t: f64,
    ) -> Result<f64, AnimationError> {
        Ok(blend::norm(&self.velocity_at(host, pref, t)?))
    }

    /// Grid times covering `[start, end]`: `start`, `start + step`, ..., and `end` itself.
    pub fn grid(&self, start: f64, end: f64) -> Vec<f64> {
        if !(end > start) {
            return vec![start];
        }
        let span = end - start;
        let steps = (span / self.frame_step - 1e-9).ceil().max(1.0) as usize;
        let mut out: Vec<f64> = (0..steps)
            .map(|i| start + i as f64 * self.frame_step)
            .collect();
        out.push(end);
        out
    }
}

pub const DEFAULT_FRAME_STEP: f64 = 1.0 / 25.0;

impl Default for CurveSampler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_STEP)
    }
}

fn finite_difference(forward: &Value, backward: &Value, denom: f64) -> Value {
    if denom <= 0.0 {
        return zero_like(forward);
    }
    blend::sub(forward, backward)
        .and_then(|d| blend::scale(&d, denom.recip()))
        .unwrap_or_else(|| zero_like(forward))
}

fn zero_like(v: &Value) -> Value {
    blend::scale(v, 0.0).unwrap_or_else(|| Value::Scalar(0.0))
}
