//! Upload pipeline
//!
//! One upload runs `Received → Validated → Staged → Committed → Synchronized`.
//! Each step starts only after the previous one succeeded; a failure at any
//! step ends the request. A committed asset is never rolled back: when the
//! final metadata write fails the asset stays in storage and the request
//! reports a persistence error.

use std::sync::Arc;

use common::settings::LimitSettings;
use tokio::io::AsyncRead;
use tracing::{error, info};
use uuid::Uuid;

use crate::content_type::negotiate;
use crate::error::UploadResult;
use crate::keys::storage_key;
use crate::models::{AssetKind, AssetReference, VideoRecord};
use crate::staging::StagedWriter;
use crate::storage::AssetStorage;
use crate::store::VideoStore;
use crate::sync::MetadataSynchronizer;

/// Entry point for thumbnail and video uploads
#[derive(Clone)]
pub struct UploadPipeline {
    writer: StagedWriter,
    storage: Arc<dyn AssetStorage>,
    sync: MetadataSynchronizer,
    limits: LimitSettings,
}

impl UploadPipeline {
    pub fn new(
        writer: StagedWriter,
        storage: Arc<dyn AssetStorage>,
        store: Arc<dyn VideoStore>,
        limits: LimitSettings,
    ) -> Self {
        Self {
            writer,
            storage,
            sync: MetadataSynchronizer::new(store),
            limits,
        }
    }

    /// Replace the video's thumbnail with an `image/*` upload
    pub async fn upload_thumbnail<R>(
        &self,
        video_id: Uuid,
        requester_id: Uuid,
        content_type: Option<&str>,
        reader: &mut R,
    ) -> UploadResult<VideoRecord>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        self.upload(AssetKind::Thumbnail, video_id, requester_id, content_type, reader)
            .await
    }

    /// Attach a new `video/mp4` file to the video
    pub async fn upload_video<R>(
        &self,
        video_id: Uuid,
        requester_id: Uuid,
        content_type: Option<&str>,
        reader: &mut R,
    ) -> UploadResult<VideoRecord>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        self.upload(AssetKind::Video, video_id, requester_id, content_type, reader)
            .await
    }

    /// Read-only access to a record for its owner
    pub async fn video(&self, video_id: Uuid, requester_id: Uuid) -> UploadResult<VideoRecord> {
        self.sync.authorize(video_id, requester_id).await
    }

    fn ceiling(&self, kind: AssetKind) -> u64 {
        match kind {
            AssetKind::Thumbnail => self.limits.max_thumbnail_bytes,
            AssetKind::Video => self.limits.max_video_bytes,
        }
    }

    #[tracing::instrument(
        skip(self, content_type, reader),
        fields(kind = %kind, video_id = %video_id, requester_id = %requester_id)
    )]
    async fn upload<R>(
        &self,
        kind: AssetKind,
        video_id: Uuid,
        requester_id: Uuid,
        content_type: Option<&str>,
        reader: &mut R,
    ) -> UploadResult<VideoRecord>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        self.sync.authorize(video_id, requester_id).await?;
        let media_type = negotiate(kind, content_type)?;
        let key = storage_key(kind, video_id, &media_type)?;

        let mut staged = self.writer.stage(reader, self.ceiling(kind)).await?;
        let size = staged.len();

        let locator = self
            .storage
            .commit(&key, &media_type, &mut staged)
            .await?;
        drop(staged);

        info!(
            key = %key,
            size_bytes = size,
            backend = self.storage.backend_name(),
            "Asset committed"
        );

        let asset = AssetReference {
            storage_key: key.clone(),
            media_type,
            retrieval_locator: locator,
        };

        self.sync
            .attach(video_id, requester_id, kind, asset)
            .await
            .inspect_err(|e| {
                error!(
                    key = %key,
                    error = %e,
                    "Asset left in storage without a metadata reference"
                );
            })
    }
}
