// handlers/health.rs - GET /health and the unknown-route fallback

use crate::database::dynamic::DynamicValue;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /health - liveness probe, outside every auth group
pub async fn health() -> ApiResult<DynamicValue> {
    Ok(ApiResponse::success(DynamicValue::map().with("status", "ok")))
}

/// Fallback for routes nothing else matched
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
