//! Spark telemetry listener.
//!
//! Spark services broadcast their block state on the event bus, either as a
//! full snapshot (`Spark.state`, blocks under `data.blocks`) or as a partial
//! update (`Spark.patch`, blocks under `data.changed`). Each block reporting a
//! measured value becomes a [`Reading`].

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use serde::Deserialize;
use tokio::sync::{mpsc, watch};

use brewhub_domain::device::{Block, Reading};

use crate::config::MqttConfig;
use crate::error::MqttError;

const SPARK_STATE: &str = "Spark.state";
const SPARK_PATCH: &str = "Spark.patch";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    key: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Extract readings from a Spark state broadcast.
///
/// Messages of any other type yield no readings.
///
/// # Errors
///
/// Returns [`MqttError::PayloadParse`] when the payload is not a JSON object
/// or its blocks are malformed.
pub fn parse_spark_state(payload: &[u8]) -> Result<Vec<Reading>, MqttError> {
    let envelope: Envelope = serde_json::from_slice(payload).map_err(MqttError::PayloadParse)?;
    let field = match envelope.kind.as_str() {
        SPARK_STATE => "blocks",
        SPARK_PATCH => "changed",
        _ => return Ok(Vec::new()),
    };
    let blocks = match envelope.data.get(field) {
        Some(value) => Vec::<Block>::deserialize(value).map_err(MqttError::PayloadParse)?,
        None => Vec::new(),
    };
    Ok(blocks
        .iter()
        .filter_map(|block| block.reading(&envelope.key))
        .collect())
}

/// Drive the MQTT event loop until shutdown.
///
/// Subscribes to the Spark state topic on every (re)connection and forwards
/// non-empty reading batches to `readings`. Connection errors are logged and
/// retried after a fixed delay.
pub async fn run(
    client: AsyncClient,
    mut event_loop: EventLoop,
    config: MqttConfig,
    readings: mpsc::Sender<Vec<Reading>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let reconnect_delay = Duration::from_secs(config.reconnect_delay_secs);

    loop {
        let event = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    if let Err(err) = client.disconnect().await {
                        tracing::debug!(error = %err, "mqtt disconnect failed");
                    }
                    tracing::debug!("mqtt listener stopped");
                    return;
                }
                continue;
            }
            event = event_loop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!(host = %config.broker_host, "connected to mqtt broker");
                if let Err(err) = client
                    .subscribe(config.spark_state_topic.clone(), QoS::AtMostOnce)
                    .await
                {
                    tracing::error!(error = %err, topic = %config.spark_state_topic, "subscribe failed");
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                match parse_spark_state(&publish.payload) {
                    Ok(batch) if batch.is_empty() => {}
                    Ok(batch) => {
                        if readings.send(batch).await.is_err() {
                            tracing::debug!("telemetry receiver dropped, stopping listener");
                            return;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(topic = %publish.topic, error = ?err, "ignoring malformed spark state");
                    }
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "mqtt connection error, retrying");
                tokio::time::sleep(reconnect_delay).await;
            }
        }
    }
}
