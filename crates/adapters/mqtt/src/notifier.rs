//! Notifier publishing engine events on the broker.

use std::future::Future;

use rumqttc::{AsyncClient, QoS};

use brewhub_app::ports::EventPublisher;
use brewhub_domain::error::BrewhubError;
use brewhub_domain::event::Event;

use crate::error::MqttError;

/// Publishes each event as retained JSON on a single topic, so a late
/// subscriber always sees the latest transition.
#[derive(Clone)]
pub struct MqttNotifier {
    client: AsyncClient,
    topic: String,
}

impl MqttNotifier {
    #[must_use]
    pub fn new(client: AsyncClient, topic: impl Into<String>) -> Self {
        Self {
            client,
            topic: topic.into(),
        }
    }

    /// Hand the notification to the event loop without waiting.
    ///
    /// A full request queue means the broker has been unreachable for a
    /// while; the notification is dropped rather than stalling the caller.
    fn enqueue(&self, event: &Event) -> Result<(), MqttError> {
        let payload = serde_json::to_vec(event).map_err(MqttError::Encode)?;
        self.client
            .try_publish(self.topic.clone(), QoS::AtLeastOnce, true, payload)?;
        tracing::debug!(event_type = %event.event_type, "notification queued");
        Ok(())
    }
}

impl EventPublisher for MqttNotifier {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), BrewhubError>> + Send {
        let result = self.enqueue(&event).map_err(BrewhubError::from);
        async move { result }
    }
}
