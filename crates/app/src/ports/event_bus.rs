//! Event bus port: best-effort broadcast of automation transitions.

use std::future::Future;

use brewhub_domain::error::BrewhubError;
use brewhub_domain::event::Event;

/// Publishes events to interested subscribers.
///
/// Callers treat failures as non-fatal: the engine logs them and carries on.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), BrewhubError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), BrewhubError>> + Send {
        (**self).publish(event)
    }
}
