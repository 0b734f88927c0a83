//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use relayhub_domain::error::RelayHubError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    ok: bool,
    error: String,
}

/// Maps [`RelayHubError`] and body rejections to an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    Domain(RelayHubError),
    /// The request body was missing, not JSON, or had ill-typed fields.
    Body(JsonRejection),
}

impl From<RelayHubError> for ApiError {
    fn from(err: RelayHubError) -> Self {
        Self::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        Self::Body(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Domain(RelayHubError::InvalidInput(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Domain(RelayHubError::DeviceBusy(err)) => (StatusCode::CONFLICT, err.to_string()),
            Self::Domain(RelayHubError::NotRunning(err)) => (StatusCode::CONFLICT, err.to_string()),
            Self::Body(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
        };
        tracing::debug!(%status, error = %message, "request rejected");

        (
            status,
            Json(ErrorBody {
                ok: false,
                error: message,
            }),
        )
            .into_response()
    }
}
