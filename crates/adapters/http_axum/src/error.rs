//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use slingwatch_domain::error::SlingError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`SlingError`] to an HTTP response with appropriate status code.
pub struct ApiError(SlingError);

impl From<SlingError> for ApiError {
    fn from(err: SlingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            SlingError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            SlingError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            err @ (SlingError::Invariant(_) | SlingError::Snapshot(_) | SlingError::Storage(_)) => {
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
