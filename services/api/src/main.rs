use std::sync::Arc;

use anyhow::{Context, Result};
use common::{
    database::{health_check, init_pool},
    settings::{MetadataBackendKind, MetadataSettings, Settings, StorageBackendKind},
};
use media::{
    InMemoryVideoStore, PgVideoStore, StagedWriter, UploadPipeline, VideoRecord, VideoStore,
    create_storage,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod auth;
mod error;
mod middleware;
mod routes;
mod state;

use crate::{auth::JwtAuthenticator, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting upload service");

    let settings = Settings::load().context("Failed to load settings")?;

    let store = open_store(&settings).await?;
    let storage = create_storage(&settings.storage, &settings.server).await?;
    let writer = StagedWriter::new(settings.storage.staging_dir.clone());
    info!(staging_dir = %writer.staging_dir().display(), "Staging directory configured");

    let pipeline = UploadPipeline::new(writer, storage, store, settings.limits);
    let authenticator = JwtAuthenticator::from_settings(&settings.auth)?;

    let assets_root = match settings.storage.backend {
        StorageBackendKind::Local => Some(settings.storage.assets_root.clone()),
        StorageBackendKind::S3 => None,
    };

    let app_state = AppState {
        pipeline,
        authenticator: Arc::new(authenticator),
        assets_root,
    };

    let app = routes::create_router(app_state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Upload service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn open_store(settings: &Settings) -> Result<Arc<dyn VideoStore>> {
    match settings.metadata.backend {
        MetadataBackendKind::Postgres => {
            let pool = init_pool(&settings.database).await?;

            // Check database connectivity
            if health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            let store = PgVideoStore::new(pool);
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        MetadataBackendKind::Memory => {
            warn!("Using the in-memory metadata store; records are lost on restart");
            let store = InMemoryVideoStore::new();
            seed(&store, &settings.metadata).await?;
            Ok(Arc::new(store))
        }
    }
}

async fn seed(store: &InMemoryVideoStore, metadata: &MetadataSettings) -> Result<()> {
    let Some(path) = &metadata.seed_file else {
        return Ok(());
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    let records: Vec<VideoRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse seed file {}", path.display()))?;

    let count = records.len();
    for record in records {
        store.insert(record).await;
    }
    info!(count, "Seeded in-memory metadata store");

    Ok(())
}
