//! Shared application state for axum handlers.

use std::sync::Arc;

use brewhub_app::mash_engine::MashEngine;
use brewhub_app::ports::Scheduler;

/// Application state shared across all axum handlers.
///
/// Generic over the engine's collaborators to avoid dynamic dispatch.
/// `Clone` is implemented manually so the collaborators need not be `Clone`.
pub struct AppState<RS, DG, SS, EP, SC: Scheduler> {
    pub engine: Arc<MashEngine<RS, DG, SS, EP, SC>>,
}

impl<RS, DG, SS, EP, SC: Scheduler> Clone for AppState<RS, DG, SS, EP, SC> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<RS, DG, SS, EP, SC: Scheduler> AppState<RS, DG, SS, EP, SC> {
    /// Wrap an engine that is already shared with background tasks.
    pub fn new(engine: Arc<MashEngine<RS, DG, SS, EP, SC>>) -> Self {
        Self { engine }
    }
}
