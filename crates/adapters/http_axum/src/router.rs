//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use brewhub_app::ports::{DeviceGateway, EventPublisher, RecipeService, Scheduler, StateStore};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the API routes under `/api` and includes a [`TraceLayer`] that logs
/// each HTTP request/response at the `DEBUG` level.
pub fn build<RS, DG, SS, EP, SC>(state: AppState<RS, DG, SS, EP, SC>) -> Router
where
    RS: RecipeService + Send + Sync + 'static,
    DG: DeviceGateway + Send + Sync + 'static,
    SS: StateStore + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    SC: Scheduler + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
