//! Step model: one unit of the automation sequence and its execution policy.
//!
//! A [`Step`] is the raw record taken from a batch's brewtracker. The engine
//! never branches on its fields directly: it asks [`Step::classify`] which of
//! the four [`StepPolicy`] variants applies.
//!
//! ## Tooltip heuristic
//!
//! For steps that pause before executing, the recipe's `value` field is not
//! reliable. The target temperature is instead read from the free-text
//! `tooltip`, which embeds it as `<number> °<C|F>` (e.g. `"Heat to 65 °C"`).
//! That pattern lives in [`parse_target_temperature`] and nowhere else.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

static TEMPERATURE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d+(?:[.,]\d+)?)\s*°\s*([CF])\b").expect("temperature pattern is valid")
});

/// One step of a brewtracker stage, as stored by the recipe service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default)]
    pub description: String,
    /// Free-form category tag from the recipe (informational vs actionable).
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    /// `Some(true)` pauses, `Some(false)` auto-advances, `None` waits `duration`.
    #[serde(default)]
    pub pause_before: Option<bool>,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub tooltip: Option<String>,
    /// Seconds to wait before advancing when no pause is required.
    #[serde(default)]
    pub duration: Option<u64>,
}

impl Step {
    /// Decide how this step is executed.
    ///
    /// `stage_index` and `step_index` are only used to locate the step in the
    /// returned error.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedStep`] when `pause_before` is absent
    /// and `duration` is absent or zero.
    pub fn classify(
        &self,
        stage_index: usize,
        step_index: usize,
    ) -> Result<StepPolicy, ValidationError> {
        match self.pause_before {
            Some(false) => Ok(StepPolicy::AutoAdvance),
            Some(true) => Ok(match self.tooltip.as_deref().and_then(parse_target_temperature) {
                Some(target) => StepPolicy::PauseForHeat { target },
                None => StepPolicy::PauseForUser {
                    description: self.description.clone(),
                },
            }),
            None => match self.duration {
                Some(duration_secs) if duration_secs > 0 => {
                    Ok(StepPolicy::TimedWait { duration_secs })
                }
                _ => Err(ValidationError::MalformedStep {
                    stage_index,
                    step_index,
                    reason: "no pause flag and no positive duration",
                }),
            },
        }
    }

    /// Display label: the name when present, the description otherwise.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.description)
    }
}

/// How the engine executes a step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepPolicy {
    /// Move on to the next step immediately.
    AutoAdvance,
    /// Drive the setpoint to `target` and wait for telemetry to reach it.
    PauseForHeat { target: Temperature },
    /// Stop until an operator explicitly proceeds.
    PauseForUser { description: String },
    /// Wait `duration_secs` then advance.
    TimedWait { duration_secs: u64 },
}

/// Temperature scale as written in recipe tooltips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

/// A target temperature extracted from a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub value: f64,
    pub unit: TemperatureUnit,
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            TemperatureUnit::Celsius => 'C',
            TemperatureUnit::Fahrenheit => 'F',
        };
        write!(f, "{} °{unit}", self.value)
    }
}

/// Extract the first `<number> °<C|F>` occurrence from `text`.
///
/// Accepts a decimal comma as well as a decimal point.
#[must_use]
pub fn parse_target_temperature(text: &str) -> Option<Temperature> {
    let captures = TEMPERATURE_PATTERN.captures(text)?;
    let value = captures.get(1)?.as_str().replace(',', ".").parse().ok()?;
    let unit = match captures.get(2)?.as_str() {
        "C" => TemperatureUnit::Celsius,
        _ => TemperatureUnit::Fahrenheit,
    };
    Some(Temperature { value, unit })
}
