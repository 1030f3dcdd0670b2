//! End-to-end tests for the upload pipeline
//!
//! Every test runs against the in-memory metadata store and local storage
//! rooted in a scratch directory, with a separate scratch staging directory.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use common::settings::LimitSettings;
use media::{
    InMemoryVideoStore, LocalStorage, StagedWriter, StoreError, UploadError, UploadPipeline,
    ValidationError, VideoRecord, VideoStore,
};
use regex::Regex;
use tempfile::TempDir;
use uuid::Uuid;

struct Harness {
    pipeline: UploadPipeline,
    store: Arc<InMemoryVideoStore>,
    assets: TempDir,
    staging: TempDir,
}

impl Harness {
    async fn new(limits: LimitSettings) -> Self {
        Self::with_store(limits, |store| store as Arc<dyn VideoStore>).await
    }

    async fn with_store<F>(limits: LimitSettings, wrap: F) -> Self
    where
        F: FnOnce(Arc<InMemoryVideoStore>) -> Arc<dyn VideoStore>,
    {
        let assets = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryVideoStore::new());
        let storage = Arc::new(
            LocalStorage::new(assets.path(), "localhost", 8091)
                .await
                .unwrap(),
        );

        let pipeline = UploadPipeline::new(
            StagedWriter::new(Some(staging.path().to_path_buf())),
            storage,
            wrap(store.clone()),
            limits,
        );

        Self {
            pipeline,
            store,
            assets,
            staging,
        }
    }

    async fn seed(&self, owner: Uuid) -> VideoRecord {
        let record = VideoRecord::new(Uuid::new_v4(), owner, "Boots demo", "A short clip");
        self.store.insert(record.clone()).await;
        record
    }

    fn asset_names(&self) -> Vec<String> {
        list(self.assets.path())
    }

    fn staging_is_empty(&self) -> bool {
        list(self.staging.path()).is_empty()
    }
}

fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_owner_uploads_png_thumbnail() {
    let h = Harness::new(LimitSettings::default()).await;
    let owner = Uuid::new_v4();
    let video = h.seed(owner).await;

    let mut body: &[u8] = b"0123456789";
    let record = h
        .pipeline
        .upload_thumbnail(video.id, owner, Some("image/png"), &mut body)
        .await
        .unwrap();

    let thumbnail = record.thumbnail_ref.as_ref().expect("thumbnail set");
    let expected_key = format!("{}.png", video.id);
    assert_eq!(thumbnail.storage_key, expected_key);
    assert_eq!(thumbnail.media_type.essence(), "image/png");
    assert!(thumbnail.retrieval_locator.contains(&expected_key));
    assert_eq!(
        thumbnail.retrieval_locator,
        format!("http://localhost:8091/assets/{expected_key}")
    );

    // Everything except the thumbnail and timestamp is untouched
    assert_eq!(record.title, video.title);
    assert_eq!(record.description, video.description);
    assert_eq!(record.owner_id, video.owner_id);
    assert_eq!(record.created_at, video.created_at);
    assert_eq!(record.video_ref, None);
    assert!(record.updated_at > video.updated_at);

    assert_eq!(h.store.get(video.id).await.unwrap(), record);
    assert_eq!(h.asset_names(), vec![expected_key.clone()]);
    assert_eq!(
        std::fs::read(h.assets.path().join(&expected_key)).unwrap(),
        b"0123456789"
    );
    assert!(h.staging_is_empty());
}

#[tokio::test]
async fn test_any_image_subtype_is_accepted_for_thumbnails() {
    let h = Harness::new(LimitSettings::default()).await;
    let owner = Uuid::new_v4();

    for sub in ["jpeg", "webp", "gif", "svg+xml"] {
        let video = h.seed(owner).await;
        let header = format!("image/{sub}");
        let mut body: &[u8] = b"image";
        let record = h
            .pipeline
            .upload_thumbnail(video.id, owner, Some(header.as_str()), &mut body)
            .await
            .unwrap();

        assert_eq!(
            record.thumbnail_ref.unwrap().storage_key,
            format!("{}.{}", video.id, sub)
        );
    }
}

#[tokio::test]
async fn test_repeated_thumbnail_reuses_key_and_advances_timestamp() {
    let h = Harness::new(LimitSettings::default()).await;
    let owner = Uuid::new_v4();
    let video = h.seed(owner).await;

    let mut first_body: &[u8] = b"same bytes";
    let first = h
        .pipeline
        .upload_thumbnail(video.id, owner, Some("image/jpeg"), &mut first_body)
        .await
        .unwrap();

    let mut second_body: &[u8] = b"same bytes";
    let second = h
        .pipeline
        .upload_thumbnail(video.id, owner, Some("image/jpeg"), &mut second_body)
        .await
        .unwrap();

    assert_eq!(
        first.thumbnail_ref.as_ref().unwrap().storage_key,
        second.thumbnail_ref.as_ref().unwrap().storage_key
    );
    assert!(second.updated_at > first.updated_at);
    assert_eq!(h.asset_names().len(), 1);
}

#[tokio::test]
async fn test_video_upload_gets_random_key() {
    let h = Harness::new(LimitSettings::default()).await;
    let owner = Uuid::new_v4();
    let video = h.seed(owner).await;
    let pattern = Regex::new(r"^[A-Za-z0-9_-]{43}\.mp4$").unwrap();

    let mut first_body: &[u8] = b"\x00\x00\x00\x18ftypmp42";
    let first = h
        .pipeline
        .upload_video(video.id, owner, Some("video/mp4"), &mut first_body)
        .await
        .unwrap();

    let mut second_body: &[u8] = b"\x00\x00\x00\x18ftypmp42";
    let second = h
        .pipeline
        .upload_video(video.id, owner, Some("video/mp4"), &mut second_body)
        .await
        .unwrap();

    let first_key = &first.video_ref.as_ref().unwrap().storage_key;
    let second_key = &second.video_ref.as_ref().unwrap().storage_key;
    assert!(pattern.is_match(first_key), "unexpected key {first_key}");
    assert!(pattern.is_match(second_key), "unexpected key {second_key}");
    assert_ne!(first_key, second_key);

    // The earlier upload is still in storage
    assert_eq!(h.asset_names().len(), 2);
    assert_eq!(second.thumbnail_ref, None);
}

#[tokio::test]
async fn test_video_upload_keeps_existing_thumbnail() {
    let h = Harness::new(LimitSettings::default()).await;
    let owner = Uuid::new_v4();
    let video = h.seed(owner).await;

    let mut thumb: &[u8] = b"thumb";
    let with_thumb = h
        .pipeline
        .upload_thumbnail(video.id, owner, Some("image/png"), &mut thumb)
        .await
        .unwrap();

    let mut clip: &[u8] = b"clip";
    let with_video = h
        .pipeline
        .upload_video(video.id, owner, Some("video/mp4"), &mut clip)
        .await
        .unwrap();

    assert_eq!(with_video.thumbnail_ref, with_thumb.thumbnail_ref);
    assert!(with_video.video_ref.is_some());
}

#[tokio::test]
async fn test_non_mp4_video_is_rejected() {
    let h = Harness::new(LimitSettings::default()).await;
    let owner = Uuid::new_v4();
    let video = h.seed(owner).await;

    for header in ["video/webm", "image/png", "video/quicktime", "application/mp4"] {
        let mut body: &[u8] = b"not an mp4";
        let err = h
            .pipeline
            .upload_video(video.id, owner, Some(header), &mut body)
            .await
            .unwrap_err();
        assert!(
            matches!(err, UploadError::Validation(ValidationError::UnsupportedMediaType { .. })),
            "{header}: {err}"
        );
    }

    assert!(h.asset_names().is_empty());
    assert!(h.staging_is_empty());
    assert_eq!(h.store.get(video.id).await.unwrap(), video);
}

#[tokio::test]
async fn test_non_owner_is_forbidden_and_nothing_changes() {
    let h = Harness::new(LimitSettings::default()).await;
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let video = h.seed(owner).await;

    let mut body: &[u8] = b"0123456789";
    let err = h
        .pipeline
        .upload_thumbnail(video.id, intruder, Some("image/png"), &mut body)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Forbidden(id) if id == video.id));
    assert_eq!(h.store.get(video.id).await.unwrap(), video);
    assert!(h.asset_names().is_empty());
    assert!(h.staging_is_empty());
}

#[tokio::test]
async fn test_unknown_video_is_not_found() {
    let h = Harness::new(LimitSettings::default()).await;
    let missing = Uuid::new_v4();

    let mut body: &[u8] = b"clip";
    let err = h
        .pipeline
        .upload_video(missing, Uuid::new_v4(), Some("video/mp4"), &mut body)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::NotFound(id) if id == missing));
    assert!(h.asset_names().is_empty());
}

#[tokio::test]
async fn test_oversized_upload_is_rejected_before_storage() {
    let limits = LimitSettings {
        max_thumbnail_bytes: 1024,
        max_video_bytes: 4096,
    };
    let h = Harness::new(limits).await;
    let owner = Uuid::new_v4();
    let video = h.seed(owner).await;

    let big = vec![0xAB_u8; 5000];

    let mut body: &[u8] = &big;
    let err = h
        .pipeline
        .upload_video(video.id, owner, Some("video/mp4"), &mut body)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        UploadError::Validation(ValidationError::PayloadTooLarge { limit: 4096 })
    ));

    let mut body: &[u8] = &big[..2048];
    let err = h
        .pipeline
        .upload_thumbnail(video.id, owner, Some("image/png"), &mut body)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        UploadError::Validation(ValidationError::PayloadTooLarge { limit: 1024 })
    ));

    assert!(h.asset_names().is_empty());
    assert!(h.staging_is_empty());
    assert_eq!(h.store.get(video.id).await.unwrap(), video);
}

#[tokio::test]
async fn test_missing_content_type_is_rejected() {
    let h = Harness::new(LimitSettings::default()).await;
    let owner = Uuid::new_v4();
    let video = h.seed(owner).await;

    let mut body: &[u8] = b"bytes";
    let err = h
        .pipeline
        .upload_thumbnail(video.id, owner, None, &mut body)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UploadError::Validation(ValidationError::MissingContentType)
    ));
}

/// Store whose writes always fail, to exercise the committed-but-unsynced path
struct ReadOnlyStore(Arc<InMemoryVideoStore>);

#[async_trait]
impl VideoStore for ReadOnlyStore {
    async fn get(&self, video_id: Uuid) -> Result<VideoRecord, StoreError> {
        self.0.get(video_id).await
    }

    async fn put(&self, _record: &VideoRecord) -> Result<(), StoreError> {
        Err(StoreError::Backend("database is read-only".to_string()))
    }
}

#[tokio::test]
async fn test_persistence_failure_leaves_committed_asset() {
    let h = Harness::with_store(LimitSettings::default(), |store| {
        Arc::new(ReadOnlyStore(store)) as Arc<dyn VideoStore>
    })
    .await;
    let owner = Uuid::new_v4();
    let video = h.seed(owner).await;

    let mut body: &[u8] = b"0123456789";
    let err = h
        .pipeline
        .upload_thumbnail(video.id, owner, Some("image/png"), &mut body)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Persistence(_)));
    // No rollback: the asset stays, the record does not reference it
    assert_eq!(h.asset_names(), vec![format!("{}.png", video.id)]);
    assert_eq!(h.store.get(video.id).await.unwrap().thumbnail_ref, None);
    assert!(h.staging_is_empty());
}

#[tokio::test]
async fn test_owner_can_read_record() {
    let h = Harness::new(LimitSettings::default()).await;
    let owner = Uuid::new_v4();
    let video = h.seed(owner).await;

    assert_eq!(h.pipeline.video(video.id, owner).await.unwrap(), video);
    assert!(matches!(
        h.pipeline.video(video.id, Uuid::new_v4()).await,
        Err(UploadError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_subtypes_unusable_as_keys_are_validation_errors() {
    let h = Harness::new(LimitSettings::default()).await;
    let owner = Uuid::new_v4();
    let video = h.seed(owner).await;

    for header in ["image/a..b", "image/png#x", "image/png?x", "image/.png"] {
        let mut body: &[u8] = b"0123456789";
        let err = h
            .pipeline
            .upload_thumbnail(video.id, owner, Some(header), &mut body)
            .await
            .unwrap_err();

        assert!(
            matches!(
                err,
                UploadError::Validation(ValidationError::MalformedContentType(_))
            ),
            "{header}: {err:?}"
        );
    }

    assert!(h.asset_names().is_empty());
    assert!(h.staging_is_empty());
    assert_eq!(h.store.get(video.id).await.unwrap(), video);
}

#[tokio::test]
async fn test_locator_path_resolves_to_committed_file() {
    let h = Harness::new(LimitSettings::default()).await;
    let owner = Uuid::new_v4();
    let video = h.seed(owner).await;

    let mut body: &[u8] = b"image bytes";
    let record = h
        .pipeline
        .upload_thumbnail(video.id, owner, Some("image/svg+xml"), &mut body)
        .await
        .unwrap();

    let locator = record.thumbnail_ref.unwrap().retrieval_locator;
    let relative = locator
        .strip_prefix("http://localhost:8091/assets/")
        .expect("local locator");
    assert!(!relative.contains(['#', '?', '%', '/']), "{locator}");
    assert_eq!(
        std::fs::read(h.assets.path().join(relative)).unwrap(),
        b"image bytes"
    );
}

/// Loses the record after the ownership check has read it
struct VanishingStore(Arc<InMemoryVideoStore>);

#[async_trait]
impl VideoStore for VanishingStore {
    async fn get(&self, video_id: Uuid) -> Result<VideoRecord, StoreError> {
        self.0.get(video_id).await
    }

    async fn put(&self, record: &VideoRecord) -> Result<(), StoreError> {
        Err(StoreError::NotFound(record.id))
    }
}

#[tokio::test]
async fn test_record_removed_after_commit_is_persistence_error() {
    let h = Harness::with_store(LimitSettings::default(), |store| {
        Arc::new(VanishingStore(store)) as Arc<dyn VideoStore>
    })
    .await;
    let owner = Uuid::new_v4();
    let video = h.seed(owner).await;

    let mut body: &[u8] = b"\x00\x00\x00\x18ftypmp42";
    let err = h
        .pipeline
        .upload_video(video.id, owner, Some("video/mp4"), &mut body)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Persistence(_)), "{err:?}");
    assert_eq!(h.asset_names().len(), 1);
    assert!(h.staging_is_empty());
}
