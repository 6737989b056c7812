//! MQTT integration configuration.

use serde::Deserialize;

/// Configuration for the MQTT integration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Topic the engine notifications are published on (retained).
    pub state_topic: String,
    /// Topic (or filter) carrying Spark block state broadcasts.
    pub spark_state_topic: String,
    /// Outgoing request buffer between client and event loop.
    pub channel_capacity: usize,
    /// Pause between reconnection attempts, in seconds.
    pub reconnect_delay_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "brewhub".to_string(),
            keep_alive_secs: 30,
            state_topic: "brewcast/state/brewhub".to_string(),
            spark_state_topic: "brewcast/state/#".to_string(),
            channel_capacity: 64,
            reconnect_delay_secs: 5,
        }
    }
}
