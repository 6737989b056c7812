//! Device blocks: the actuator the automation drives and the telemetry it reads.
//!
//! A controller service (identified by `service_id`) hosts named blocks. The
//! setpoint block's `data.storedSetting.value` is the target the engine
//! writes; its `data.value.value` is the measured temperature reported back
//! through telemetry.

use serde::{Deserialize, Serialize};

/// Address of a single block on a controller service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRef {
    pub service_id: String,
    pub id: String,
}

impl DeviceRef {
    #[must_use]
    pub fn new(service_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            id: id.into(),
        }
    }
}

/// Full state of a block, as read from or patched into the device gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(rename = "type", default)]
    pub block_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Block {
    /// The configured target (`data.storedSetting.value`), if any.
    #[must_use]
    pub fn stored_setting(&self) -> Option<f64> {
        self.data
            .get("storedSetting")
            .and_then(|setting| setting.get("value"))
            .and_then(serde_json::Value::as_f64)
    }

    /// The measured value (`data.value.value`), if any.
    #[must_use]
    pub fn measured_value(&self) -> Option<f64> {
        self.data
            .get("value")
            .and_then(|value| value.get("value"))
            .and_then(serde_json::Value::as_f64)
    }

    /// Build the partial data that replaces only the stored setting value.
    ///
    /// Other keys of `storedSetting` (such as its unit) are carried over.
    /// Returns `None` when the block has no stored setting object.
    #[must_use]
    pub fn stored_setting_patch(&self, target: f64) -> Option<serde_json::Value> {
        let mut setting = self.data.get("storedSetting")?.as_object()?.clone();
        setting.insert("value".to_string(), serde_json::json!(target));
        Some(serde_json::json!({ "storedSetting": setting }))
    }

    /// Convert into a telemetry reading when the block reports a measured value.
    #[must_use]
    pub fn reading(&self, fallback_service_id: &str) -> Option<Reading> {
        Some(Reading {
            service_id: self
                .service_id
                .clone()
                .unwrap_or_else(|| fallback_service_id.to_string()),
            device_id: self.id.clone(),
            value: self.measured_value()?,
        })
    }
}

/// A measured value reported by a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub service_id: String,
    pub device_id: String,
    pub value: f64,
}

impl Reading {
    #[must_use]
    pub fn is_from(&self, device: &DeviceRef) -> bool {
        self.service_id == device.service_id && self.device_id == device.id
    }
}
