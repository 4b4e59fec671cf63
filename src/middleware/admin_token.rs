use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::error::ApiError;
use crate::middleware::context::with_context;
use crate::state::AppState;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Static shared-secret check for the admin dashboard group
pub async fn require_admin_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.security.admin_token.as_deref() else {
        tracing::error!("Admin token is not configured; rejecting request");
        return Err(ApiError::unauthorized("Unauthorized access"));
    };

    let provided = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided.is_empty() || !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        tracing::warn!(path = %request.uri().path(), "Rejected admin token");
        return Err(ApiError::unauthorized("Unauthorized access"));
    }

    with_context(&mut request, |ctx| ctx.mark_admin())?;

    Ok(next.run(request).await)
}
