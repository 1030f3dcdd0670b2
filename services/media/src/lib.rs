//! Media upload pipeline for the Tubely service
//!
//! This crate accepts thumbnail and video uploads for existing videos,
//! stages the bytes, commits them to a storage backend and records the
//! resulting asset reference on the video's metadata record.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use media::{InMemoryVideoStore, LocalStorage, StagedWriter, UploadPipeline};
//! use common::settings::LimitSettings;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = Arc::new(LocalStorage::new("assets", "localhost", 8091).await?);
//! let store = Arc::new(InMemoryVideoStore::new());
//! let pipeline = UploadPipeline::new(
//!     StagedWriter::new(None),
//!     storage,
//!     store,
//!     LimitSettings::default(),
//! );
//!
//! let mut body: &[u8] = b"\x89PNG...";
//! let record = pipeline
//!     .upload_thumbnail(uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), Some("image/png"), &mut body)
//!     .await?;
//! println!("{:?}", record.thumbnail_ref);
//! # Ok(())
//! # }
//! ```

pub mod content_type;
pub mod error;
pub mod keys;
pub mod models;
pub mod pipeline;
pub mod staging;
pub mod storage;
pub mod store;
pub mod sync;

pub use error::{StorageError, StoreError, UploadError, UploadResult, ValidationError};
pub use models::{AssetKind, AssetReference, MediaType, VideoRecord};
pub use pipeline::UploadPipeline;
pub use staging::{StagedUpload, StagedWriter};
pub use storage::{AssetStorage, LocalStorage, S3Storage, create_storage};
pub use store::{InMemoryVideoStore, PgVideoStore, VideoStore};
pub use sync::MetadataSynchronizer;
