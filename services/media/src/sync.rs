//! Metadata synchronization
//!
//! Merges a freshly committed asset into its video record. The fetch, owner
//! check and write are not isolated from other requests; uploads for the same
//! video must be serialized by the caller when lost updates matter.

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{UploadError, UploadResult};
use crate::models::{AssetKind, AssetReference, VideoRecord};
use crate::store::VideoStore;

/// Applies committed assets to video records under an ownership check
#[derive(Clone)]
pub struct MetadataSynchronizer {
    store: Arc<dyn VideoStore>,
}

impl MetadataSynchronizer {
    pub fn new(store: Arc<dyn VideoStore>) -> Self {
        Self { store }
    }

    /// Fetch the record and confirm `requester_id` owns it
    pub async fn authorize(&self, video_id: Uuid, requester_id: Uuid) -> UploadResult<VideoRecord> {
        let record = self.store.get(video_id).await?;

        if record.owner_id != requester_id {
            warn!(
                video_id = %video_id,
                requester_id = %requester_id,
                "Rejected upload from non-owner"
            );
            return Err(UploadError::Forbidden(video_id));
        }

        Ok(record)
    }

    /// Point the record's `kind` reference at `asset` and persist it
    pub async fn attach(
        &self,
        video_id: Uuid,
        requester_id: Uuid,
        kind: AssetKind,
        asset: AssetReference,
    ) -> UploadResult<VideoRecord> {
        let current = self.authorize(video_id, requester_id).await?;
        let updated = with_asset(current, kind, asset);

        // Past this point the asset is committed
        self.store.put(&updated).await.map_err(|e| {
            warn!(
                video_id = %video_id,
                kind = %kind,
                error = %e,
                "Failed to persist video record"
            );
            UploadError::Persistence(e.to_string())
        })?;

        info!(video_id = %video_id, kind = %kind, "Video record updated");
        Ok(updated)
    }
}

/// Copy of `record` with one reference replaced and `updated_at` advanced
pub fn with_asset(record: VideoRecord, kind: AssetKind, asset: AssetReference) -> VideoRecord {
    let updated_at = next_timestamp(record.updated_at, Utc::now());
    let (thumbnail_ref, video_ref) = match kind {
        AssetKind::Thumbnail => (Some(asset), record.video_ref),
        AssetKind::Video => (record.thumbnail_ref, Some(asset)),
    };

    VideoRecord {
        updated_at,
        thumbnail_ref,
        video_ref,
        ..record
    }
}

/// Microsecond-precision timestamp strictly after `previous`
fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = now.trunc_subsecs(6);
    if now > previous {
        now
    } else {
        previous.trunc_subsecs(6) + Duration::microseconds(1)
    }
}
