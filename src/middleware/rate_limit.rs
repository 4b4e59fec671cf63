//! Per-client fixed-window rate limiting stage

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub enabled: bool,
    pub limit: u32,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

pub async fn enforce_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let policy = state.rate_limit;
    if !policy.enabled {
        return Ok(next.run(request).await);
    }

    let key = client_key(&request);
    let now = Utc::now();
    let decision = state.rate_limits.check_at(&key, policy.limit, policy.window, now);

    if !decision.allowed {
        warn!(client = %key, limit = policy.limit, "Rate limit exceeded");
        return Err(ApiError::too_many_requests(
            decision.limit,
            decision.reset_at.timestamp(),
            decision.retry_after_secs(now),
        ));
    }

    debug!(client = %key, remaining = decision.remaining, "Rate limit check passed");

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("rate-limit-limit", HeaderValue::from(decision.limit));
    headers.insert("rate-limit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("rate-limit-reset", HeaderValue::from(decision.reset_at.timestamp()));

    Ok(response)
}

/// Client identity for limiting: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the peer address, else `"unknown"`
pub fn client_key(request: &Request) -> String {
    if let Some(ip) = forwarded_ip(request.headers()) {
        return ip;
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header_value("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return Some(first.to_string());
    }

    header_value("x-real-ip").map(str::to_string)
}
