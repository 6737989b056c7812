//! Spark adapter error types.

use brewhub_domain::error::{BrewhubError, DeviceError, NotFoundError};

/// Errors talking to a Spark service.
#[derive(Debug, thiserror::Error)]
pub enum SparkError {
    #[error("spark request failed")]
    Http(#[from] reqwest::Error),

    #[error("spark returned {status} for block {block_id:?}: {body}")]
    Status {
        status: u16,
        block_id: String,
        body: String,
    },
}

impl From<SparkError> for BrewhubError {
    fn from(err: SparkError) -> Self {
        match err {
            SparkError::Http(err) if err.is_connect() => {
                tracing::debug!(error = %err, "spark unreachable");
                Self::Device(DeviceError::Unavailable)
            }
            SparkError::Status {
                status: 404,
                block_id,
                ..
            } => Self::NotFound(NotFoundError {
                entity: "block",
                id: block_id,
            }),
            other => Self::Upstream(Box::new(other)),
        }
    }
}
