//! Application state shared across handlers

use std::path::PathBuf;
use std::sync::Arc;

use media::UploadPipeline;

use crate::auth::Authenticator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: UploadPipeline,
    pub authenticator: Arc<dyn Authenticator>,
    /// Served under `/assets` when the local storage backend is active
    pub assets_root: Option<PathBuf>,
}
