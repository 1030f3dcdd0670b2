use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::types::Json;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::VideoStore;
use crate::error::StoreError;
use crate::models::{AssetReference, VideoRecord};

/// Video records in the `videos` table
#[derive(Clone)]
pub struct PgVideoStore {
    pool: PgPool,
}

impl PgVideoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> DatabaseResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))
    }

    /// Insert a new record
    pub async fn create(&self, record: &VideoRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO videos (id, title, description, user_id, created_at, updated_at, thumbnail_ref, video_ref)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.owner_id)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.thumbnail_ref.as_ref().map(Json))
        .bind(record.video_ref.as_ref().map(Json))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn from_row(row: PgRow) -> Result<VideoRecord, StoreError> {
        let thumbnail_ref: Option<Json<AssetReference>> = row.try_get("thumbnail_ref")?;
        let video_ref: Option<Json<AssetReference>> = row.try_get("video_ref")?;

        Ok(VideoRecord {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            owner_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            thumbnail_ref: thumbnail_ref.map(|Json(asset)| asset),
            video_ref: video_ref.map(|Json(asset)| asset),
        })
    }
}

#[async_trait]
impl VideoStore for PgVideoStore {
    async fn get(&self, video_id: Uuid) -> Result<VideoRecord, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, user_id, created_at, updated_at, thumbnail_ref, video_ref
            FROM videos
            WHERE id = $1
            "#,
        )
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::from_row(row),
            None => Err(StoreError::NotFound(video_id)),
        }
    }

    async fn put(&self, record: &VideoRecord) -> Result<(), StoreError> {
        // id, user_id and created_at are never rewritten
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET title = $2,
                description = $3,
                updated_at = $4,
                thumbnail_ref = $5,
                video_ref = $6
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.updated_at)
        .bind(record.thumbnail_ref.as_ref().map(Json))
        .bind(record.video_ref.as_ref().map(Json))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(record.id));
        }

        Ok(())
    }
}
