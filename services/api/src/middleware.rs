//! Authentication middleware for bearer token validation

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::debug;
use uuid::Uuid;

use crate::{auth::AuthError, error::ApiError, state::AppState};

/// Authenticated user information
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Verify the bearer token and expose the caller as an [`AuthUser`] extension
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AuthError::MissingToken)?;

    let user_id = state.authenticator.verify(bearer.token()).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        e
    })?;

    req.extensions_mut().insert(AuthUser { id: user_id });

    Ok(next.run(req).await)
}
