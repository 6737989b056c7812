//! Recipe service port: read-only access to batches and recipes.

use std::future::Future;

use brewhub_domain::error::BrewhubError;
use brewhub_domain::recipe::{
    Batch, BatchStatus, BatchSummary, Brewtracker, Recipe, RecipeSummary,
};

/// External brewing-recipe service.
pub trait RecipeService {
    /// List batches, optionally restricted to one status.
    fn get_batches(
        &self,
        status: Option<BatchStatus>,
    ) -> impl Future<Output = Result<Vec<BatchSummary>, BrewhubError>> + Send;

    /// Fetch a single batch.
    fn get_batch(
        &self,
        batch_id: &str,
    ) -> impl Future<Output = Result<Batch, BrewhubError>> + Send;

    /// Fetch the staged step sequence of a batch.
    fn get_brewtracker(
        &self,
        batch_id: &str,
    ) -> impl Future<Output = Result<Brewtracker, BrewhubError>> + Send;

    /// List recipes, paginated.
    fn get_recipes(
        &self,
        offset: u32,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<RecipeSummary>, BrewhubError>> + Send;

    /// Fetch a single recipe.
    fn get_recipe(
        &self,
        recipe_id: &str,
    ) -> impl Future<Output = Result<Recipe, BrewhubError>> + Send;
}
