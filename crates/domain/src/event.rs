//! Event: an immutable record of an automation transition.
//!
//! Events are broadcast best-effort through the notifier port; nothing in
//! the engine depends on them being delivered.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::{self, Timestamp};

/// Unique identifier for an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(uuid::Uuid);

impl Default for EventId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl EventId {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Kind of transition being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    BatchLoaded,
    MashStarted,
    /// A step that needs no pause completed; the engine moves on.
    StepAutoAdvanced,
    HeatingStarted,
    AutomationPaused,
    TimerStarted,
    TimerElapsed,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BatchLoaded => "batch_loaded",
            Self::MashStarted => "mash_started",
            Self::StepAutoAdvanced => "step_auto_advanced",
            Self::HeatingStarted => "heating_started",
            Self::AutomationPaused => "automation_paused",
            Self::TimerStarted => "timer_started",
            Self::TimerElapsed => "timer_elapsed",
        };
        f.write_str(name)
    }
}

/// Something that happened, with a free-form JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub message: String,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl Event {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(event_type: EventType, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            message: message.into(),
            data,
            timestamp: time::now(),
        }
    }
}
