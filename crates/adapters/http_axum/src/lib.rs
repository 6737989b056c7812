//! # brewhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Expose the mash engine operations as a small JSON API
//!   (`/api/batches`, `/api/mash/*`, `/api/state`, `/api/settings`)
//! - Map HTTP requests into engine calls (driving adapter)
//! - Map [`BrewhubError`](brewhub_domain::error::BrewhubError) into status codes
//!
//! ## Dependency rule
//! Depends on `brewhub-app` (for the engine and port traits) and
//! `brewhub-domain` (for request/response types). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

pub use router::build;
pub use state::AppState;
