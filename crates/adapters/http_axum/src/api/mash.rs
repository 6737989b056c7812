//! Mash automation control.
//!
//! The control endpoints answer with the state as persisted after the
//! transition, so clients see where the automation stopped.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use brewhub_app::ports::{DeviceGateway, EventPublisher, RecipeService, Scheduler, StateStore};
use brewhub_domain::settings::Settings;
use brewhub_domain::state::{AutomationState, AutomationStatus};

use crate::error::ApiError;
use crate::state::AppState;

/// The persisted state plus its derived status.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    #[serde(flatten)]
    pub state: AutomationState,
    pub status: AutomationStatus,
}

impl From<AutomationState> for StateResponse {
    fn from(state: AutomationState) -> Self {
        let status = state.status();
        Self { state, status }
    }
}

/// `POST /api/mash/start`
pub async fn start<RS, DG, SS, EP, SC>(
    State(state): State<AppState<RS, DG, SS, EP, SC>>,
) -> Result<Json<StateResponse>, ApiError>
where
    RS: RecipeService + Send + Sync + 'static,
    DG: DeviceGateway + Send + Sync + 'static,
    SS: StateStore + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    SC: Scheduler + 'static,
{
    state.engine.start_automated_mash().await?;
    Ok(Json(state.engine.get_state().await?.into()))
}

/// `POST /api/mash/proceed`
pub async fn proceed<RS, DG, SS, EP, SC>(
    State(state): State<AppState<RS, DG, SS, EP, SC>>,
) -> Result<Json<StateResponse>, ApiError>
where
    RS: RecipeService + Send + Sync + 'static,
    DG: DeviceGateway + Send + Sync + 'static,
    SS: StateStore + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    SC: Scheduler + 'static,
{
    state.engine.proceed_to_next_step().await?;
    Ok(Json(state.engine.get_state().await?.into()))
}

/// `GET /api/state`
pub async fn state<RS, DG, SS, EP, SC>(
    State(state): State<AppState<RS, DG, SS, EP, SC>>,
) -> Result<Json<StateResponse>, ApiError>
where
    RS: RecipeService + Send + Sync + 'static,
    DG: DeviceGateway + Send + Sync + 'static,
    SS: StateStore + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    SC: Scheduler + 'static,
{
    Ok(Json(state.engine.get_state().await?.into()))
}

/// `GET /api/settings`
pub async fn settings<RS, DG, SS, EP, SC>(
    State(state): State<AppState<RS, DG, SS, EP, SC>>,
) -> Result<Json<Settings>, ApiError>
where
    RS: RecipeService + Send + Sync + 'static,
    DG: DeviceGateway + Send + Sync + 'static,
    SS: StateStore + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    SC: Scheduler + 'static,
{
    Ok(Json(state.engine.get_settings().await?))
}
