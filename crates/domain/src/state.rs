//! Automation state: the persisted, resumable progress record.
//!
//! There is a single [`AutomationState`] per deployment. It is created when a
//! batch is loaded, mutated only by the mash engine, and overwritten wholesale
//! when another batch is loaded.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AutomationError;
use crate::recipe::StageSteps;
use crate::step::Step;
use crate::time::{self, Timestamp};

/// Cursor value meaning "no step started yet".
pub const NOT_STARTED: i64 = -1;

/// Coarse brewing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Mash,
    Sparge,
    Boil,
    Hopstand,
    Fermentation,
}

/// Execution mode within a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Idle, or waiting for an operator.
    #[default]
    Standby,
    /// Setpoint written, waiting for telemetry to reach the target.
    Heat,
    /// A timer is pending.
    Rest,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standby => f.write_str("standby"),
            Self::Heat => f.write_str("heat"),
            Self::Rest => f.write_str("rest"),
        }
    }
}

/// A pending deferred wake-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub start_time: Timestamp,
    pub duration: u64,
    pub expected_end_time: Timestamp,
}

impl Timer {
    /// Start a timer of `duration_secs` at `start_time`.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::InvalidTimer`] when the resulting end time
    /// would not lie after `start_time`.
    pub fn start(start_time: Timestamp, duration_secs: u64) -> Result<Self, AutomationError> {
        let expected_end_time = time::add_seconds(start_time, duration_secs);
        if expected_end_time <= start_time {
            return Err(AutomationError::InvalidTimer { duration_secs });
        }
        Ok(Self {
            start_time,
            duration: duration_secs,
            expected_end_time,
        })
    }

    #[must_use]
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        self.expected_end_time <= now
    }
}

/// Progress of the loaded batch, as derived from the persisted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutomationStatus {
    /// Batch loaded, automation not started.
    Loaded,
    /// Waiting for an operator to proceed.
    PausedUser,
    Heating,
    WaitingTimer,
}

/// The persisted aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationState {
    pub stage: Stage,
    pub mode: Mode,
    pub batch_id: String,
    pub recipe_id: Option<String>,
    pub recipe_name: String,
    pub raw_steps: Vec<StageSteps>,
    pub mash_start_time: Option<Timestamp>,
    pub stage_index: i64,
    pub step_index: i64,
    pub step: Option<Step>,
    pub timer: Option<Timer>,
}

impl AutomationState {
    /// Fresh state for a newly loaded batch: first stage, no step started.
    #[must_use]
    pub fn loaded(
        batch_id: impl Into<String>,
        recipe_id: Option<String>,
        recipe_name: impl Into<String>,
        raw_steps: Vec<StageSteps>,
    ) -> Self {
        Self {
            stage: Stage::Mash,
            mode: Mode::Standby,
            batch_id: batch_id.into(),
            recipe_id,
            recipe_name: recipe_name.into(),
            raw_steps,
            mash_start_time: None,
            stage_index: 0,
            step_index: NOT_STARTED,
            step: None,
            timer: None,
        }
    }

    /// Current stage cursor as an index, if it is valid.
    #[must_use]
    pub fn stage_position(&self) -> Option<usize> {
        usize::try_from(self.stage_index).ok()
    }

    /// Resolve `raw_steps[stage_index].steps[step_index]`.
    #[must_use]
    pub fn step_at(&self, step_index: i64) -> Option<&Step> {
        let stage = self.raw_steps.get(self.stage_position()?)?;
        stage.steps.get(usize::try_from(step_index).ok()?)
    }

    #[must_use]
    pub fn status(&self) -> AutomationStatus {
        match self.mode {
            Mode::Heat => AutomationStatus::Heating,
            Mode::Rest => AutomationStatus::WaitingTimer,
            Mode::Standby if self.step_index == NOT_STARTED => AutomationStatus::Loaded,
            Mode::Standby => AutomationStatus::PausedUser,
        }
    }

    /// Target the current heating step waits for.
    #[must_use]
    pub fn heat_target(&self) -> Option<f64> {
        match self.mode {
            Mode::Heat => self.step.as_ref().map(|step| step.value),
            Mode::Standby | Mode::Rest => None,
        }
    }
}
