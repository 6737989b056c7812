//! Recipe listing and lookup.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use brewhub_app::ports::{DeviceGateway, EventPublisher, RecipeService, Scheduler, StateStore};
use brewhub_domain::recipe::{Recipe, RecipeSummary};

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: u32 = 10;

/// Pagination of the list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub offset: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// `GET /api/recipes?offset=0&limit=10`
pub async fn list<RS, DG, SS, EP, SC>(
    State(state): State<AppState<RS, DG, SS, EP, SC>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RecipeSummary>>, ApiError>
where
    RS: RecipeService + Send + Sync + 'static,
    DG: DeviceGateway + Send + Sync + 'static,
    SS: StateStore + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    SC: Scheduler + 'static,
{
    let recipes = state.engine.get_recipes(query.offset, query.limit).await?;
    Ok(Json(recipes))
}

/// `GET /api/recipes/{id}`
pub async fn get<RS, DG, SS, EP, SC>(
    State(state): State<AppState<RS, DG, SS, EP, SC>>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, ApiError>
where
    RS: RecipeService + Send + Sync + 'static,
    DG: DeviceGateway + Send + Sync + 'static,
    SS: StateStore + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    SC: Scheduler + 'static,
{
    Ok(Json(state.engine.get_recipe(&id).await?))
}
