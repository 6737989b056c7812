//! # brewhub-adapter-mqtt
//!
//! MQTT adapter: the event bus side of brewhub.
//!
//! ## Responsibilities
//! - Connect to an MQTT broker
//! - Publish engine notifications as retained JSON on the state topic
//! - Subscribe to the Spark state topic and turn block states into readings
//!
//! ## Dependency rule
//! Same as other adapters: depends on `brewhub-app` and `brewhub-domain`.

pub mod config;
pub mod error;
pub mod notifier;
pub mod telemetry;

pub use config::MqttConfig;
pub use error::MqttError;
pub use notifier::MqttNotifier;

use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions};

/// Create a client and its event loop. Nothing happens on the wire until the
/// event loop is polled.
#[must_use]
pub fn connect(config: &MqttConfig) -> (AsyncClient, EventLoop) {
    let mut options = MqttOptions::new(
        config.client_id.clone(),
        config.broker_host.clone(),
        config.broker_port,
    );
    options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
    AsyncClient::new(options, config.channel_capacity)
}
