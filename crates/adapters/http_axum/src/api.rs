//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod batches;
#[allow(clippy::missing_errors_doc)]
pub mod mash;
#[allow(clippy::missing_errors_doc)]
pub mod recipes;

use axum::Router;
use axum::routing::{get, post};

use brewhub_app::ports::{DeviceGateway, EventPublisher, RecipeService, Scheduler, StateStore};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<RS, DG, SS, EP, SC>() -> Router<AppState<RS, DG, SS, EP, SC>>
where
    RS: RecipeService + Send + Sync + 'static,
    DG: DeviceGateway + Send + Sync + 'static,
    SS: StateStore + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    SC: Scheduler + 'static,
{
    Router::new()
        // Recipe service passthrough
        .route("/batches", get(batches::list::<RS, DG, SS, EP, SC>))
        .route("/batches/{id}/load", post(batches::load::<RS, DG, SS, EP, SC>))
        .route("/recipes", get(recipes::list::<RS, DG, SS, EP, SC>))
        .route("/recipes/{id}", get(recipes::get::<RS, DG, SS, EP, SC>))
        // Automation
        .route("/mash/start", post(mash::start::<RS, DG, SS, EP, SC>))
        .route("/mash/proceed", post(mash::proceed::<RS, DG, SS, EP, SC>))
        .route("/state", get(mash::state::<RS, DG, SS, EP, SC>))
        .route("/settings", get(mash::settings::<RS, DG, SS, EP, SC>))
}
