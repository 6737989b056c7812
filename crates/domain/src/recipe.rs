//! Recipe service data: batches, recipe summaries and brewtrackers.
//!
//! Only the fields the automation consumes are modelled; everything else in
//! the upstream payloads is ignored during deserialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::step::Step;

/// Batch lifecycle states the automation is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Planning,
    Brewing,
    Fermenting,
}

impl BatchStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::Brewing => "Brewing",
            Self::Fermenting => "Fermenting",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Planning" => Ok(Self::Planning),
            "Brewing" => Ok(Self::Brewing),
            "Fermenting" => Ok(Self::Fermenting),
            other => Err(ValidationError::InvalidBatchStatus(other.to_string())),
        }
    }
}

/// Reject blank batch identifiers before they reach the network.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyBatchId`] when `batch_id` is empty or
/// whitespace only.
pub fn validate_batch_id(batch_id: &str) -> Result<&str, ValidationError> {
    let trimmed = batch_id.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyBatchId);
    }
    Ok(trimmed)
}

/// Trim a recipe id, rejecting blank ones.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyRecipeId`] when nothing is left after trimming.
pub fn validate_recipe_id(recipe_id: &str) -> Result<&str, ValidationError> {
    let trimmed = recipe_id.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyRecipeId);
    }
    Ok(trimmed)
}

/// Entry of the batch listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub batch_no: Option<u32>,
    /// Upstream may report statuses outside [`BatchStatus`] (e.g. `Completed`).
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub brewer: Option<String>,
}

/// Recipe reference embedded in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecipe {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

/// A single batch, as returned by the recipe service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub batch_no: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    pub recipe: BatchRecipe,
}

/// Entry of the recipe listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSummary {
    #[serde(rename(deserialize = "_id"))]
    pub id: String,
    pub name: String,
}

/// A full recipe document.
///
/// Only the id and name are typed. Everything else the service returns
/// (fermentables, hops, mash profile...) is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename(deserialize = "_id"))]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// An ordered list of steps belonging to one coarse phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSteps {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// The step sequence of a batch, grouped by stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brewtracker {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stages: Vec<StageSteps>,
}

impl Brewtracker {
    /// Ensure there is at least one stage and every stage has steps.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyRecipe`] naming the first empty stage.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stages.is_empty() {
            return Err(ValidationError::EmptyRecipe {
                stage: String::new(),
            });
        }
        if let Some(stage) = self.stages.iter().find(|stage| stage.steps.is_empty()) {
            return Err(ValidationError::EmptyRecipe {
                stage: stage.name.clone(),
            });
        }
        Ok(())
    }
}
