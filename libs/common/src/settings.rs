//! Service settings
//!
//! Settings are assembled once at startup from layered sources and then handed
//! to each component by value. Nothing reads the environment after startup.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `config/local.toml` (optional)
//! 4. `TUBELY_*` environment variables, `__` separating nested keys
//!    (e.g. `TUBELY_SERVER__PORT=8091`, `TUBELY_STORAGE__BACKEND=s3`)

use std::path::PathBuf;

use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;

use crate::database::DatabaseConfig;
use crate::error::{SettingsError, SettingsResult};

/// Maximum accepted thumbnail size (10 MiB)
pub const DEFAULT_MAX_THUMBNAIL_BYTES: u64 = 10 << 20;
/// Maximum accepted video size (1 GiB)
pub const DEFAULT_MAX_VIDEO_BYTES: u64 = 1 << 30;

/// Top-level settings for the upload service
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub limits: LimitSettings,
    pub database: DatabaseConfig,
    pub metadata: MetadataSettings,
    pub auth: AuthSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind
    pub host: String,
    /// Port to bind; also used in locally served asset URLs
    pub port: u16,
    /// Host name clients use to reach this service
    pub public_host: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8091,
            public_host: "localhost".to_string(),
        }
    }
}

/// Which storage backend receives committed assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    Local,
    S3,
}

/// Storage backend settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackendKind,
    /// Root directory for the local backend
    pub assets_root: PathBuf,
    /// Directory for request-scoped staging files; the OS temp dir when unset
    pub staging_dir: Option<PathBuf>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, Spaces, ...)
    pub endpoint: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::Local,
            assets_root: PathBuf::from("assets"),
            staging_dir: None,
            bucket: None,
            region: None,
            endpoint: None,
        }
    }
}

/// Upload size ceilings in bytes
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    pub max_thumbnail_bytes: u64,
    pub max_video_bytes: u64,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_thumbnail_bytes: DEFAULT_MAX_THUMBNAIL_BYTES,
            max_video_bytes: DEFAULT_MAX_VIDEO_BYTES,
        }
    }
}

/// Which metadata store holds video records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataBackendKind {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetadataSettings {
    pub backend: MetadataBackendKind,
    /// JSON array of video records loaded into the memory backend at startup
    pub seed_file: Option<PathBuf>,
}

/// Bearer token verification settings
///
/// Exactly one of `jwt_secret` (HS256) or `jwt_public_key` (RS256, PEM text or
/// a path to a PEM file) must be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: Option<String>,
    pub jwt_public_key: Option<String>,
}

impl Settings {
    /// Layered configuration sources, before building
    pub fn sources() -> ConfigBuilder<DefaultState> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("TUBELY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
    }

    /// Load and validate settings from every source
    pub fn load() -> SettingsResult<Self> {
        let config = Self::sources().build()?;
        Self::from_config(config)
    }

    /// Deserialize and validate settings from an already built configuration
    pub fn from_config(config: Config) -> SettingsResult<Self> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> SettingsResult<()> {
        if self.storage.backend == StorageBackendKind::S3 {
            if self.storage.bucket.as_deref().is_none_or(str::is_empty) {
                return Err(SettingsError::Invalid(
                    "storage.bucket is required for the s3 backend".to_string(),
                ));
            }
            if self.storage.region.as_deref().is_none_or(str::is_empty) {
                return Err(SettingsError::Invalid(
                    "storage.region is required for the s3 backend".to_string(),
                ));
            }
        }

        if self.limits.max_thumbnail_bytes == 0 || self.limits.max_video_bytes == 0 {
            return Err(SettingsError::Invalid(
                "upload size ceilings must be greater than zero".to_string(),
            ));
        }

        match (&self.auth.jwt_secret, &self.auth.jwt_public_key) {
            (Some(_), Some(_)) => Err(SettingsError::Invalid(
                "set only one of auth.jwt_secret and auth.jwt_public_key".to_string(),
            )),
            (None, None) => Err(SettingsError::Invalid(
                "one of auth.jwt_secret or auth.jwt_public_key is required".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
