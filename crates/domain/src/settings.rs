//! Settings: static automation configuration.

use serde::{Deserialize, Serialize};

use crate::device::DeviceRef;

/// Which actuator the mash automation drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MashAutomationSettings {
    pub setpoint_device: DeviceRef,
}

/// Loaded once at startup and persisted for observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub mash_automation: MashAutomationSettings,
}

impl Settings {
    #[must_use]
    pub fn new(setpoint_device: DeviceRef) -> Self {
        Self {
            mash_automation: MashAutomationSettings { setpoint_device },
        }
    }

    #[must_use]
    pub fn setpoint_device(&self) -> &DeviceRef {
        &self.mash_automation.setpoint_device
    }
}
