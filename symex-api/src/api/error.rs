//! Error-to-response mapping.
//!
//! Every handler failure becomes a JSON body of the shape
//! `{"error": "<message>"}` with the status the error class calls for:
//! invalid input 400, missing resource 404, everything else 500.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use symex_common::Error;
use tracing::error;

/// Wrapper turning [`symex_common::Error`] into an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError(Error::InvalidInput(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError(Error::NotFound(message.into()))
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError(Error::Database(err))
    }
}

/// Malformed or undeserializable request bodies map to 400, keeping the
/// error body shape uniform instead of axum's default rejection format.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self.0);
        }

        let body = Json(json!({
            "error": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}
