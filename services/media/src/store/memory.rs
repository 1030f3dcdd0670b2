use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::VideoStore;
use crate::error::StoreError;
use crate::models::VideoRecord;

/// Process-local store for development and tests
#[derive(Debug, Default)]
pub struct InMemoryVideoStore {
    records: RwLock<HashMap<Uuid, VideoRecord>>,
}

impl InMemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, replacing any with the same id
    pub async fn insert(&self, record: VideoRecord) {
        self.records.write().await.insert(record.id, record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl VideoStore for InMemoryVideoStore {
    async fn get(&self, video_id: Uuid) -> Result<VideoRecord, StoreError> {
        self.records
            .read()
            .await
            .get(&video_id)
            .cloned()
            .ok_or(StoreError::NotFound(video_id))
    }

    async fn put(&self, record: &VideoRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(record.id)),
        }
    }
}
