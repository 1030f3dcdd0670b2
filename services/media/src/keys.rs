//! Storage key derivation
//!
//! Thumbnails live at `{video_id}.{sub_type}`, so a new thumbnail replaces the
//! previous one in place. Video files get a fresh random 256-bit stem so
//! earlier uploads are never overwritten.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::models::{AssetKind, MediaType};

const RANDOM_KEY_BYTES: usize = 32;

/// Derive the storage key for an accepted upload
pub fn storage_key(kind: AssetKind, video_id: Uuid, media_type: &MediaType) -> StorageResult<String> {
    match kind {
        AssetKind::Thumbnail => Ok(thumbnail_key(video_id, media_type)),
        AssetKind::Video => random_key(media_type),
    }
}

fn thumbnail_key(video_id: Uuid, media_type: &MediaType) -> String {
    format!("{}.{}", video_id, media_type.sub_type())
}

fn random_key(media_type: &MediaType) -> StorageResult<String> {
    let mut bytes = [0u8; RANDOM_KEY_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| StorageError::Entropy(e.to_string()))?;

    Ok(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(bytes),
        media_type.sub_type()
    ))
}
