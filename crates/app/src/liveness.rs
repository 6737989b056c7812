//! Gateway liveness loop.
//!
//! Polls the device gateway readiness on a fixed interval and re-runs timer
//! recovery every time the gateway comes back. The first successful poll
//! counts as a transition, which covers recovery at startup.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::mash_engine::{MashEngine, report_autonomous_failure};
use crate::ports::{DeviceGateway, EventPublisher, RecipeService, Scheduler, StateStore};

/// Run until `shutdown` flips to `true` or its sender is dropped.
pub async fn watch_gateway<RS, DG, SS, EP, SC>(
    engine: Arc<MashEngine<RS, DG, SS, EP, SC>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    RS: RecipeService + Send + Sync + 'static,
    DG: DeviceGateway + Send + Sync + 'static,
    SS: StateStore + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    SC: Scheduler + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut was_ready = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    tracing::debug!("liveness loop stopped");
                    return;
                }
                continue;
            }
        }

        let ready = engine.gateway_ready().await;
        match (was_ready, ready) {
            (false, true) => {
                tracing::info!("device gateway ready");
                if let Err(err) = engine.restore_timer().await {
                    report_autonomous_failure("reconnect", &err);
                }
            }
            (true, false) => tracing::warn!("device gateway unavailable"),
            _ => {}
        }
        was_ready = ready;
    }
}
