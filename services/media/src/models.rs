use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted metadata for one video
///
/// `id`, `owner_id` and `created_at` never change once the record exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub thumbnail_ref: Option<AssetReference>,
    pub video_ref: Option<AssetReference>,
}

impl VideoRecord {
    /// A fresh record with no assets attached
    pub fn new(
        id: Uuid,
        owner_id: Uuid,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now().trunc_subsecs(6);
        Self {
            id,
            title: title.into(),
            description: description.into(),
            owner_id,
            created_at: now,
            updated_at: now,
            thumbnail_ref: None,
            video_ref: None,
        }
    }

    /// The reference currently held for `kind`
    pub fn asset(&self, kind: AssetKind) -> Option<&AssetReference> {
        match kind {
            AssetKind::Thumbnail => self.thumbnail_ref.as_ref(),
            AssetKind::Video => self.video_ref.as_ref(),
        }
    }
}

/// Locator for a committed asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReference {
    pub storage_key: String,
    pub media_type: MediaType,
    pub retrieval_locator: String,
}

/// A validated `main/sub` media type pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct MediaType {
    main: String,
    sub: String,
}

impl MediaType {
    pub(crate) fn new(main: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            main: main.into(),
            sub: sub.into(),
        }
    }

    pub fn main_type(&self) -> &str {
        &self.main
    }

    pub fn sub_type(&self) -> &str {
        &self.sub
    }

    /// `main/sub`, as sent in a `Content-Type` header
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main, self.sub)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main, self.sub)
    }
}

impl From<MediaType> for String {
    fn from(value: MediaType) -> Self {
        value.essence()
    }
}

impl TryFrom<String> for MediaType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.split_once('/') {
            Some((main, sub)) if !main.is_empty() && !sub.is_empty() && !sub.contains('/') => {
                Ok(Self::new(main, sub))
            }
            _ => Err(format!("malformed media type: {}", value)),
        }
    }
}

/// The two kinds of asset a video carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Thumbnail,
    Video,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Thumbnail => "thumbnail",
            AssetKind::Video => "video",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
