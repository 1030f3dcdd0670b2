//! Video metadata stores
//!
//! The pipeline only needs keyed reads and whole-record writes. There is no
//! compare-and-swap: two writers racing on one video id can lose an update.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::VideoRecord;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryVideoStore;
pub use postgres::PgVideoStore;

/// Key-value store of video records
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Fetch a record, failing with [`StoreError::NotFound`] when absent
    async fn get(&self, video_id: Uuid) -> Result<VideoRecord, StoreError>;

    /// Replace the stored record with the same id
    async fn put(&self, record: &VideoRecord) -> Result<(), StoreError>;
}
