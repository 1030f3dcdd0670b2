//! Storage backends
//!
//! A backend takes a fully staged upload and publishes it under a storage key,
//! returning the locator clients use to fetch it. Commits are all-or-nothing
//! from the caller's point of view: on error, nothing is visible at the key.

use std::sync::Arc;

use async_trait::async_trait;
use common::settings::{ServerSettings, StorageBackendKind, StorageSettings};
use tracing::info;

use crate::error::{StorageError, StorageResult};
use crate::models::MediaType;
use crate::staging::StagedUpload;

pub mod local;
pub mod s3;

pub use local::LocalStorage;
pub use s3::S3Storage;

/// Storage abstraction over the local filesystem and S3-compatible stores
#[async_trait]
pub trait AssetStorage: Send + Sync {
    /// Publish the staged bytes under `key` and return the retrieval locator
    async fn commit(
        &self,
        key: &str,
        media_type: &MediaType,
        staged: &mut StagedUpload,
    ) -> StorageResult<String>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}

/// Build the backend selected in the settings
pub async fn create_storage(
    storage: &StorageSettings,
    server: &ServerSettings,
) -> StorageResult<Arc<dyn AssetStorage>> {
    let backend: Arc<dyn AssetStorage> = match storage.backend {
        StorageBackendKind::Local => Arc::new(
            LocalStorage::new(&storage.assets_root, &server.public_host, server.port).await?,
        ),
        StorageBackendKind::S3 => {
            let bucket = storage
                .bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("bucket is not set".to_string()))?;
            let region = storage
                .region
                .clone()
                .ok_or_else(|| StorageError::ConfigError("region is not set".to_string()))?;
            Arc::new(S3Storage::new(bucket, region, storage.endpoint.clone()).await)
        }
    };

    info!("Storage backend initialized: {}", backend.backend_name());
    Ok(backend)
}
