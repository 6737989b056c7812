//! Telemetry forwarding from the event bus into the engine.

use std::sync::Arc;

use tokio::sync::mpsc;

use brewhub_domain::device::Reading;

use crate::mash_engine::{MashEngine, report_autonomous_failure};
use crate::ports::{DeviceGateway, EventPublisher, RecipeService, Scheduler, StateStore};

/// Feed every batch of readings to the engine until all senders are gone.
pub async fn forward_readings<RS, DG, SS, EP, SC>(
    engine: Arc<MashEngine<RS, DG, SS, EP, SC>>,
    mut readings: mpsc::Receiver<Vec<Reading>>,
) where
    RS: RecipeService + Send + Sync + 'static,
    DG: DeviceGateway + Send + Sync + 'static,
    SS: StateStore + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    SC: Scheduler + 'static,
{
    while let Some(batch) = readings.recv().await {
        if let Err(err) = engine.on_actuator_telemetry(&batch).await {
            report_autonomous_failure("telemetry", &err);
        }
    }
    tracing::debug!("telemetry forwarder stopped");
}
