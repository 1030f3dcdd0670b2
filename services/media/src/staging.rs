//! Request-scoped staging of upload bytes
//!
//! The inbound stream is copied into a private, uniquely named temporary file
//! before anything is committed. The file is deleted when the
//! [`StagedUpload`] is dropped, which covers success, every error path and a
//! dropped (cancelled) request future.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

use crate::error::{StorageError, UploadResult, ValidationError};

const CHUNK_SIZE: usize = 64 * 1024;

/// Writes inbound streams to the staging directory
#[derive(Debug, Clone)]
pub struct StagedWriter {
    staging_dir: PathBuf,
}

impl StagedWriter {
    /// Stage into `staging_dir`, or the OS temp directory when `None`
    pub fn new(staging_dir: Option<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.unwrap_or_else(std::env::temp_dir),
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Copy `reader` into a fresh staging file, refusing more than `ceiling` bytes
    ///
    /// On return the staged file is synced and positioned at offset zero.
    pub async fn stage<R>(&self, reader: &mut R, ceiling: u64) -> UploadResult<StagedUpload>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let named = tempfile::Builder::new()
            .prefix("tubely-upload-")
            .suffix(".part")
            .tempfile_in(&self.staging_dir)
            .map_err(StorageError::Staging)?;
        let (std_file, path) = named.into_parts();
        let mut file = File::from_std(std_file);

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut len: u64 = 0;

        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(|e| ValidationError::Interrupted(e.to_string()))?;
            if n == 0 {
                break;
            }

            len += n as u64;
            if len > ceiling {
                return Err(ValidationError::PayloadTooLarge { limit: ceiling }.into());
            }

            file.write_all(&buf[..n])
                .await
                .map_err(StorageError::Staging)?;
        }

        if len == 0 {
            return Err(ValidationError::EmptyPayload.into());
        }

        file.flush().await.map_err(StorageError::Staging)?;
        file.sync_all().await.map_err(StorageError::Staging)?;
        file.seek(SeekFrom::Start(0))
            .await
            .map_err(StorageError::Staging)?;

        debug!(path = %path.display(), size_bytes = len, "Upload staged");

        Ok(StagedUpload { file, path, len })
    }
}

/// A fully received upload, readable from the start
#[derive(Debug)]
pub struct StagedUpload {
    file: File,
    path: TempPath,
    len: u64,
}

impl StagedUpload {
    /// Total staged bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Location of the staging file, valid until this value is dropped
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The staged bytes, positioned at offset zero
    pub async fn reader(&mut self) -> std::io::Result<&mut File> {
        self.file.seek(SeekFrom::Start(0)).await?;
        Ok(&mut self.file)
    }
}
