//! MQTT adapter error types.

use brewhub_domain::error::BrewhubError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[from] rumqttc::ClientError),

    /// Failed to parse an incoming MQTT payload as JSON.
    #[error("failed to parse MQTT payload")]
    PayloadParse(#[source] serde_json::Error),

    /// Failed to encode an outgoing notification.
    #[error("failed to encode notification")]
    Encode(#[source] serde_json::Error),
}

impl From<MqttError> for BrewhubError {
    fn from(err: MqttError) -> Self {
        Self::Upstream(Box::new(err))
    }
}
