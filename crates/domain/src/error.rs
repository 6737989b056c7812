//! Error taxonomy shared by every layer of the workspace.
//!
//! Each family of failures has its own typed enum. They all convert into
//! [`BrewhubError`] through `#[from]`, which is the error type used across
//! port boundaries. Adapters box their own error types into
//! [`BrewhubError::Storage`] or [`BrewhubError::Upstream`].

use crate::time::Timestamp;

/// Top-level error propagated through ports and use-cases.
#[derive(Debug, thiserror::Error)]
pub enum BrewhubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("automation error")]
    Automation(#[from] AutomationError),

    #[error("device error")]
    Device(#[from] DeviceError),

    #[error("record could not be (de)serialized")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("upstream service error")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BrewhubError {
    /// Whether this error only reports that the current stage ran out of steps.
    #[must_use]
    pub fn is_stage_complete(&self) -> bool {
        matches!(self, Self::Automation(AutomationError::StageComplete { .. }))
    }
}

/// Input or recipe data that cannot be acted upon.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A step carries neither pause semantics nor a usable duration.
    #[error("step {step_index} of stage {stage_index} is malformed: {reason}")]
    MalformedStep {
        stage_index: usize,
        step_index: usize,
        reason: &'static str,
    },

    /// The loaded batch has no stages, or a stage without steps.
    #[error("stage {stage:?} has no steps")]
    EmptyRecipe { stage: String },

    #[error("batch id must not be empty")]
    EmptyBatchId,

    #[error("recipe id must not be empty")]
    EmptyRecipeId,

    #[error("batch status {0:?} is not one of Planning, Brewing, Fermenting")]
    InvalidBatchStatus(String),
}

/// A requested record does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// State machine violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AutomationError {
    #[error("no batch is loaded")]
    NotLoaded,

    /// The current stage has no step after `step_index`.
    #[error("stage {stage_index} has no step at index {step_index}")]
    StageComplete { stage_index: usize, step_index: i64 },

    #[error("timer duration must be positive, got {duration_secs}s")]
    InvalidTimer { duration_secs: u64 },

    #[error("wake-up deadline {deadline} is already in the past")]
    PastDeadline { deadline: Timestamp },

    /// Persisted state contradicts itself; needs an operator.
    #[error("inconsistent automation state: {0}")]
    InconsistentState(&'static str),
}

/// Failures talking to the setpoint actuator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("{operation} of block {device_id:?} timed out after {timeout_secs}s")]
    Timeout {
        device_id: String,
        operation: &'static str,
        timeout_secs: u64,
    },

    #[error("block {device_id:?} has no stored setting")]
    MissingSetting { device_id: String },

    #[error("device gateway unavailable")]
    Unavailable,
}
