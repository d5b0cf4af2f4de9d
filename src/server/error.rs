//! Mapping of core errors onto HTTP responses

use crate::error::ViewerError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::any::Any;
use tracing::error;

/// Error returned by HTTP handlers
#[derive(Debug)]
pub enum ApiError {
    /// Failure inside the registry or server
    Viewer(ViewerError),

    /// Request body could not be read as JSON
    Body(JsonRejection),
}

impl From<ViewerError> for ApiError {
    fn from(err: ViewerError) -> Self {
        Self::Viewer(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Viewer(err) if err.is_client_error() => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Viewer(err) => {
                error!(error = ?err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Body(rejection) => (rejection.status(), rejection.body_text()),
        };

        error_response(status, message)
    }
}

/// `{error, status:"error"}` body shared by every failure path
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Json(json!({
        "error": message.into(),
        "status": "error",
    }));

    (status, body).into_response()
}

/// Turn a handler panic into a logged 500
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    error!(panic = detail, "Handler panicked");

    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
