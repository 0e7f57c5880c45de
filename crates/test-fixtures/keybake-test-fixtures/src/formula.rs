//! Procedural curves standing in for host formulas.

use std::f64::consts::TAU;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use keybake_api_core::Value;

pub type FormulaFn = Rc<dyn Fn(f64) -> Value>;

/// Serializable description of a formula.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FormulaSpec {
    /// `offset + amplitude * sin(2π (t / period) + phase)`
    Sine {
        amplitude: f64,
        period: f64,
        #[serde(default)]
        phase: f64,
        #[serde(default)]
        offset: f64,
    },
    /// `intercept + slope * t`
    Linear {
        slope: f64,
        #[serde(default)]
        intercept: f64,
    },
    /// Point on a circle around `center`, one turn per `period`.
    Circle {
        radius: f64,
        period: f64,
        #[serde(default)]
        center: [f64; 2],
    },
    Constant { value: Value },
}

impl FormulaSpec {
    /// Formula text as a host would display it.
    pub fn text(&self) -> String {
        match self {
            FormulaSpec::Sine {
                amplitude,
                period,
                phase,
                offset,
            } => format!("{offset} + {amplitude} * Math.sin(2 * Math.PI * time / {period} + {phase})"),
            FormulaSpec::Linear { slope, intercept } => format!("{intercept} + {slope} * time"),
            FormulaSpec::Circle {
                radius,
                period,
                center,
            } => format!("orbit([{}, {}], {radius}, {period})", center[0], center[1]),
            FormulaSpec::Constant { value } => format!("{value:?}"),
        }
    }

    pub fn evaluator(&self) -> FormulaFn {
        match self.clone() {
            FormulaSpec::Sine {
                amplitude,
                period,
                phase,
                offset,
            } => Rc::new(move |t| Value::Scalar(offset + amplitude * (TAU * t / period + phase).sin())),
            FormulaSpec::Linear { slope, intercept } => {
                Rc::new(move |t| Value::Scalar(intercept + slope * t))
            }
            FormulaSpec::Circle {
                radius,
                period,
                center,
            } => Rc::new(move |t| {
                let a = TAU * t / period;
                Value::Vec2([center[0] + radius * a.cos(), center[1] + radius * a.sin()])
            }),
            FormulaSpec::Constant { value } => Rc::new(move |_| value.clone()),
        }
    }
}
