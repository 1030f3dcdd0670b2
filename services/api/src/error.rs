//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use media::{UploadError, ValidationError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Failure inside the upload pipeline
    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(AuthError::Configuration(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upload(err) => match err {
                UploadError::Validation(ValidationError::PayloadTooLarge { .. }) => {
                    StatusCode::PAYLOAD_TOO_LARGE
                }
                UploadError::Validation(_) => StatusCode::BAD_REQUEST,
                UploadError::Forbidden(_) => StatusCode::FORBIDDEN,
                UploadError::NotFound(_) => StatusCode::NOT_FOUND,
                UploadError::Storage(_) | UploadError::Persistence(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side details stay in the logs
        let error_message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
