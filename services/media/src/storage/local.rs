use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use super::AssetStorage;
use crate::error::{StorageError, StorageResult};
use crate::models::MediaType;
use crate::staging::StagedUpload;

#[cfg(unix)]
const ASSET_MODE: u32 = 0o644;

/// Local filesystem storage served under `/assets`
#[derive(Debug, Clone)]
pub struct LocalStorage {
    assets_root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create the assets root if needed
    ///
    /// # Arguments
    /// * `assets_root` - Directory holding committed assets
    /// * `public_host` / `port` - Where clients reach this service
    pub async fn new(
        assets_root: impl Into<PathBuf>,
        public_host: &str,
        port: u16,
    ) -> StorageResult<Self> {
        let assets_root = assets_root.into();

        fs::create_dir_all(&assets_root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create assets directory {}: {}",
                assets_root.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            assets_root,
            base_url: format!("http://{}:{}/assets", public_host, port),
        })
    }

    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    /// Public URL for an asset key
    pub fn locator(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    /// Keys are flat file names inside the assets root
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty()
            || key.starts_with('.')
            || key.contains("..")
            || key.contains('/')
            || key.contains('\\')
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.assets_root.join(key))
    }
}

#[async_trait]
impl AssetStorage for LocalStorage {
    async fn commit(
        &self,
        key: &str,
        _media_type: &MediaType,
        staged: &mut StagedUpload,
    ) -> StorageResult<String> {
        let path = self.key_to_path(key)?;
        let start = Instant::now();

        // Written beside the destination so the final rename stays on one filesystem
        let (std_file, temp_path) = tempfile::Builder::new()
            .prefix(".tubely-")
            .suffix(".tmp")
            .tempfile_in(&self.assets_root)
            .map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create temp file in {}: {}",
                    self.assets_root.display(),
                    e
                ))
            })?
            .into_parts();
        let mut dest = File::from_std(std_file);

        let source = staged.reader().await?;
        let written = tokio::io::copy(source, &mut dest).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write {}: {}", path.display(), e))
        })?;

        dest.flush().await?;
        dest.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync {}: {}", path.display(), e))
        })?;
        drop(dest);

        // tempfile creates files as 0600
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(ASSET_MODE))
                .await
                .map_err(|e| {
                    StorageError::UploadFailed(format!(
                        "Failed to set permissions on {}: {}",
                        path.display(),
                        e
                    ))
                })?;
        }

        temp_path.persist(&path).map_err(|e| {
            StorageError::UploadFailed(format!("Failed to publish {}: {}", path.display(), e.error))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage commit successful"
        );

        Ok(self.locator(key))
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
