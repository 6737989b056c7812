//! # brewhub-adapter-brewfather
//!
//! Read-only client for the Brewfather REST API.
//!
//! ## Responsibilities
//! - Implement the `RecipeService` port defined in `brewhub-app::ports`
//! - Authenticate every request with HTTP basic auth (user id + API key)
//! - Map upstream failures into the shared error taxonomy
//!
//! ## Dependency rule
//! Depends on `brewhub-app` (for port traits) and `brewhub-domain` (for domain types).

pub mod client;
pub mod config;
pub mod error;

pub use client::BrewfatherClient;
pub use config::BrewfatherConfig;
pub use error::BrewfatherError;
