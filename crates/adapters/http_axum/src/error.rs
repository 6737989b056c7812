//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use brewhub_domain::error::{BrewhubError, DeviceError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`BrewhubError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(BrewhubError);

impl From<BrewhubError> for ApiError {
    fn from(err: BrewhubError) -> Self {
        Self(err)
    }
}

fn detail(err: &BrewhubError) -> String {
    match err {
        BrewhubError::Validation(inner) => inner.to_string(),
        BrewhubError::NotFound(inner) => inner.to_string(),
        BrewhubError::Automation(inner) => inner.to_string(),
        BrewhubError::Device(inner) => inner.to_string(),
        BrewhubError::Upstream(inner) => format!("upstream service error: {inner}"),
        BrewhubError::Serialization(_) | BrewhubError::Storage(_) => {
            "internal server error".to_string()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BrewhubError::Validation(_) => StatusCode::BAD_REQUEST,
            BrewhubError::NotFound(_) => StatusCode::NOT_FOUND,
            BrewhubError::Automation(_) => StatusCode::CONFLICT,
            BrewhubError::Device(DeviceError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            BrewhubError::Device(DeviceError::MissingSetting { .. } | DeviceError::Unavailable)
            | BrewhubError::Upstream(_) => {
                tracing::warn!(error = ?self.0, "upstream failure");
                StatusCode::BAD_GATEWAY
            }
            BrewhubError::Serialization(_) | BrewhubError::Storage(_) => {
                tracing::error!(error = ?self.0, "storage error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorBody {
            error: detail(&self.0),
        };
        (status, Json(body)).into_response()
    }
}
