//! API service routes

use std::io;

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use futures::TryStreamExt;
use media::{AssetKind, VideoRecord};
use serde_json::json;
use tokio_util::io::StreamReader;
use tower_http::{services::ServeDir, trace::TraceLayer};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware},
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    // Size ceilings are enforced while staging, per asset kind
    let protected_routes = Router::new()
        .route("/api/thumbnail_upload/:video_id", post(upload_thumbnail))
        .route("/api/video_upload/:video_id", post(upload_video))
        .route("/api/videos/:video_id", get(get_video))
        .layer(DefaultBodyLimit::disable())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let mut router = Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes);

    if let Some(assets_root) = &state.assets_root {
        router = router.nest_service("/assets", ServeDir::new(assets_root));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "tubely-media"
    }))
}

/// Replace a video's thumbnail from the `thumbnail` multipart field
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<VideoRecord>> {
    let video_id = parse_id(&video_id)?;
    let record = receive(&state, AssetKind::Thumbnail, video_id, user, multipart).await?;
    Ok(Json(record))
}

/// Attach an mp4 file from the `video` multipart field
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<VideoRecord>> {
    let video_id = parse_id(&video_id)?;
    let record = receive(&state, AssetKind::Video, video_id, user, multipart).await?;
    Ok(Json(record))
}

/// Fetch a video record owned by the caller
pub async fn get_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoRecord>> {
    let video_id = parse_id(&video_id)?;
    let record = state.pipeline.video(video_id, user.id).await?;
    Ok(Json(record))
}

fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid ID".to_string()))
}

/// Stream the multipart field named after `kind` into the upload pipeline
async fn receive(
    state: &AppState,
    kind: AssetKind,
    video_id: Uuid,
    user: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<VideoRecord> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(kind.as_str()) {
            continue;
        }

        let content_type = field.content_type().map(str::to_owned);
        let reader = StreamReader::new(field.map_err(io::Error::other));
        tokio::pin!(reader);

        let record = match kind {
            AssetKind::Thumbnail => {
                state
                    .pipeline
                    .upload_thumbnail(video_id, user.id, content_type.as_deref(), &mut reader)
                    .await?
            }
            AssetKind::Video => {
                state
                    .pipeline
                    .upload_video(video_id, user.id, content_type.as_deref(), &mut reader)
                    .await?
            }
        };

        return Ok(record);
    }

    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{}'",
        kind
    )))
}
