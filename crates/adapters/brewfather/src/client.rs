//! HTTP client implementing [`RecipeService`].

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use brewhub_app::ports::RecipeService;
use brewhub_domain::error::BrewhubError;
use brewhub_domain::recipe::{
    Batch, BatchStatus, BatchSummary, Brewtracker, Recipe, RecipeSummary, validate_batch_id,
    validate_recipe_id,
};

use crate::config::BrewfatherConfig;
use crate::error::BrewfatherError;

/// Authenticated Brewfather API client.
#[derive(Clone)]
pub struct BrewfatherClient {
    http: Client,
    config: BrewfatherConfig,
}

impl BrewfatherClient {
    /// Build a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`BrewfatherError::Http`] if the TLS backend cannot be initialised.
    pub fn new(config: BrewfatherConfig) -> Result<Self, BrewfatherError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BrewfatherError> {
        let url = format!("{}{path}", self.config.base_url.trim_end_matches('/'));
        tracing::debug!(%path, "brewfather request");

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.user_id, Some(&self.config.api_key))
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BrewfatherError::Status {
                status: status.as_u16(),
                path: path.to_string(),
                body: body.chars().take(200).collect(),
            });
        }

        Ok(response.json().await?)
    }
}

impl RecipeService for BrewfatherClient {
    fn get_batches(
        &self,
        status: Option<BatchStatus>,
    ) -> impl Future<Output = Result<Vec<BatchSummary>, BrewhubError>> + Send {
        async move {
            let query: Vec<(&str, String)> = status
                .map(|status| ("status", status.to_string()))
                .into_iter()
                .collect();
            Ok(self.get("/batches", &query).await?)
        }
    }

    fn get_batch(&self, batch_id: &str) -> impl Future<Output = Result<Batch, BrewhubError>> + Send {
        let batch_id = batch_id.to_string();
        async move {
            let batch_id = validate_batch_id(&batch_id)?;
            Ok(self.get(&format!("/batches/{batch_id}"), &[]).await?)
        }
    }

    fn get_brewtracker(
        &self,
        batch_id: &str,
    ) -> impl Future<Output = Result<Brewtracker, BrewhubError>> + Send {
        let batch_id = batch_id.to_string();
        async move {
            let batch_id = validate_batch_id(&batch_id)?;
            Ok(self
                .get(&format!("/batches/{batch_id}/brewtracker"), &[])
                .await?)
        }
    }

    fn get_recipes(
        &self,
        offset: u32,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<RecipeSummary>, BrewhubError>> + Send {
        async move {
            let query = [("offset", offset.to_string()), ("limit", limit.to_string())];
            Ok(self.get("/recipes", &query).await?)
        }
    }

    fn get_recipe(&self, recipe_id: &str) -> impl Future<Output = Result<Recipe, BrewhubError>> + Send {
        let recipe_id = recipe_id.to_string();
        async move {
            let recipe_id = validate_recipe_id(&recipe_id)?;
            Ok(self.get(&format!("/recipes/{recipe_id}"), &[]).await?)
        }
    }
}
