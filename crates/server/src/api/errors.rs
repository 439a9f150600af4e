//! API error types mapped to HTTP status codes.
//!
//! Each [`ApiError`] variant maps to a status code and produces a JSON body
//! `{"error": "message"}`. Core errors convert via `From`: `NotFound` → 404,
//! `InvalidArgument` → 400, everything else → 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shardvec_core::error::Error;

/// Application-level error type that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found (404).
    NotFound(String),
    /// Invalid request parameters or payload (400).
    BadRequest(String),
    /// Unexpected server error (500).
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        let body = axum::Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(_) => ApiError::NotFound(err.to_string()),
            Error::InvalidArgument(_) => ApiError::BadRequest(err.to_string()),
            Error::DimensionMismatch(_) | Error::Storage(_) | Error::Serialization(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}
