//! Batch listing and loading.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use brewhub_app::ports::{DeviceGateway, EventPublisher, RecipeService, Scheduler, StateStore};
use brewhub_domain::error::BrewhubError;
use brewhub_domain::recipe::{BatchStatus, BatchSummary};

use super::mash::StateResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Query string of the list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// `GET /api/batches?status=Brewing`
pub async fn list<RS, DG, SS, EP, SC>(
    State(state): State<AppState<RS, DG, SS, EP, SC>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BatchSummary>>, ApiError>
where
    RS: RecipeService + Send + Sync + 'static,
    DG: DeviceGateway + Send + Sync + 'static,
    SS: StateStore + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    SC: Scheduler + 'static,
{
    let status = query
        .status
        .as_deref()
        .map(BatchStatus::from_str)
        .transpose()
        .map_err(BrewhubError::from)?;
    let batches = state.engine.get_batches(status).await?;
    Ok(Json(batches))
}

/// `POST /api/batches/{id}/load`
///
/// Replaces the automation state with the freshly loaded batch.
pub async fn load<RS, DG, SS, EP, SC>(
    State(state): State<AppState<RS, DG, SS, EP, SC>>,
    Path(id): Path<String>,
) -> Result<Json<StateResponse>, ApiError>
where
    RS: RecipeService + Send + Sync + 'static,
    DG: DeviceGateway + Send + Sync + 'static,
    SS: StateStore + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    SC: Scheduler + 'static,
{
    let loaded = state.engine.load_batch(&id).await?;
    Ok(Json(loaded.into()))
}
