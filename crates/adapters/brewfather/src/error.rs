//! Brewfather adapter error types.

use brewhub_domain::error::{BrewhubError, NotFoundError};

/// Errors talking to the Brewfather API.
#[derive(Debug, thiserror::Error)]
pub enum BrewfatherError {
    /// The HTTP client could not be built or the request failed in transit.
    #[error("brewfather request failed")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("brewfather returned {status} for {path}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },
}

impl From<BrewfatherError> for BrewhubError {
    fn from(err: BrewfatherError) -> Self {
        match err {
            BrewfatherError::Status {
                status: 404, path, ..
            } => Self::NotFound(NotFoundError {
                entity: "brewfather resource",
                id: path,
            }),
            other => Self::Upstream(Box::new(other)),
        }
    }
}
