//! Bake, capture and apply options.

use serde::{Deserialize, Serialize};

use crate::data::TimeRange;

/// Bake algorithm.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BakeMode {
    /// One key per grid step, then simplification.
    Quick,
    /// Keys on extremes (and optionally inflections) with tangent refinement.
    #[default]
    Smart,
}

/// Configuration for a bake call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeConfig {
    pub mode: BakeMode,
    /// Grid step override; `None` uses the host frame duration of each leaf.
    pub frame_step: Option<f64>,
    /// Decimal places used by equality tests; `None` derives it from the grid step.
    pub precision: Option<u32>,
    /// Also key velocity inflections in smart bake.
    pub enable_inflection_pass: bool,
    /// Run the tangent refiner on extreme keys in smart bake.
    pub refine_tangents: bool,
    /// Bake window; `None` uses the host timeline bounds of each leaf.
    pub time_range: Option<TimeRange>,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            mode: BakeMode::Smart,
            frame_step: None,
            precision: None,
            enable_inflection_pass: false,
            refine_tangents: true,
            time_range: None,
        }
    }
}

impl BakeConfig {
    pub fn quick() -> Self {
        Self {
            mode: BakeMode::Quick,
            ..Default::default()
        }
    }

    pub fn smart() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: BakeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_frame_step(mut self, step: f64) -> Self {
        self.frame_step = Some(step);
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn with_inflection_pass(mut self, enabled: bool) -> Self {
        self.enable_inflection_pass = enabled;
        self
    }

    pub fn with_tangent_refinement(mut self, enabled: bool) -> Self {
        self.refine_tangents = enabled;
        self
    }

    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// Precision in effect for a given grid step.
    pub fn precision_for(&self, frame_step: f64) -> u32 {
        self.precision.unwrap_or_else(|| default_precision(frame_step))
    }
}

/// Number of decimal digits of `round(1 / frame_step)`, at least 1.
///
/// 24 or 25 fps gives 2 decimals, 120 fps gives 3.
pub fn default_precision(frame_step: f64) -> u32 {
    if !(frame_step.is_finite() && frame_step > 0.0) {
        return 2;
    }
    let rate = (1.0 / frame_step).round();
    if rate < 1.0 {
        return 1;
    }
    let mut digits = 0u32;
    let mut n = rate as u64;
    while n > 0 {
        digits += 1;
        n /= 10;
    }
    digits.max(1)
}

/// Options for capturing an animation tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    /// Capture window; `None` uses the timeline bounds of the referenced property.
    pub time_range: Option<TimeRange>,
    /// Only leaves the user selected (and the groups leading to them).
    pub selected_only: bool,
}

impl CaptureOptions {
    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    pub fn with_selected_only(mut self, selected_only: bool) -> Self {
        self.selected_only = selected_only;
        self
    }
}

/// Options for applying a captured tree onto a target subtree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyOptions {
    /// Time offset added to every captured key time.
    pub time: f64,
    /// Match children by type id only.
    pub ignore_name: bool,
    /// Also write the captured formula text where the target accepts formulas.
    pub set_expression: bool,
    /// Skip static values; only keyframed leaves are written.
    pub only_keyframes: bool,
    /// Clear existing keys on each target leaf first.
    pub replace: bool,
    /// Type ids of groups allowed to receive data; empty means every group.
    pub whitelist: Vec<String>,
    /// Shift values so the animation starts from the target's current value.
    pub offset: bool,
}

impl ApplyOptions {
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    pub fn with_ignore_name(mut self, ignore_name: bool) -> Self {
        self.ignore_name = ignore_name;
        self
    }

    pub fn with_set_expression(mut self, set_expression: bool) -> Self {
        self.set_expression = set_expression;
        self
    }

    pub fn with_only_keyframes(mut self, only_keyframes: bool) -> Self {
        self.only_keyframes = only_keyframes;
        self
    }

    pub fn with_replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn with_whitelist<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_offset(mut self, offset: bool) -> Self {
        self.offset = offset;
        self
    }

    /// Whether a group with this type id is whitelisted (always true for an empty list).
    pub fn allows(&self, match_id: &str) -> bool {
        self.whitelist.is_empty() || self.whitelist.iter().any(|w| w == match_id)
    }
}
