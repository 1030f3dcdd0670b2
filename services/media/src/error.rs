//! Error types for the upload pipeline
//!
//! Every failure is classified so the HTTP layer can pick a status category
//! without inspecting messages.

use thiserror::Error;
use uuid::Uuid;

/// Malformed or disallowed input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing Content-Type header")]
    MissingContentType,

    #[error("Malformed Content-Type header: {0}")]
    MalformedContentType(String),

    #[error("Unsupported media type {found}, expected {expected}")]
    UnsupportedMediaType { found: String, expected: &'static str },

    #[error("Upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: u64 },

    #[error("Upload body is empty")]
    EmptyPayload,

    #[error("Upload stream interrupted: {0}")]
    Interrupted(String),
}

/// Staging or backend commit failure
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Staging failed: {0}")]
    Staging(#[source] std::io::Error),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Entropy source unavailable: {0}")]
    Entropy(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Metadata store failure
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Video {0} not found")]
    NotFound(Uuid),

    #[error("Metadata backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Any failure of an upload request
#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("User is not the owner of video {0}")]
    Forbidden(Uuid),

    #[error("Video {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to persist video metadata: {0}")]
    Persistence(String),
}

impl From<StoreError> for UploadError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => UploadError::NotFound(id),
            StoreError::Backend(msg) => UploadError::Persistence(msg),
        }
    }
}

/// Result type for pipeline operations
pub type UploadResult<T> = Result<T, UploadError>;
