use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use percent_encoding::percent_decode_str;

use crate::error::ApiError;
use crate::middleware::context::SecurityContext;
use crate::state::AppState;

/// Substrings that mark a request as hostile, matched against the lowercased,
/// percent-decoded path and query
const SUSPICIOUS_PATTERNS: &[&str] = &[
    "<script",
    "javascript:",
    "onerror=",
    "onload=",
    "union select",
    "drop table",
    "insert into",
];

const CONTENT_SECURITY_POLICY: &str = "default-src 'none'; frame-ancestors 'none'";
const STRICT_TRANSPORT_SECURITY: &str = "max-age=31536000; includeSubDomains";

/// Outermost application stage: HTTPS enforcement, pattern screening, context
/// creation, and security headers on every response leaving the service.
pub async fn sanitize_request(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let require_https = state.security.require_https;

    let mut response = match screen(&request, require_https) {
        Ok(()) => {
            request.extensions_mut().insert(SecurityContext::default());
            next.run(request).await
        }
        Err(err) => err.into_response(),
    };

    apply_security_headers(response.headers_mut(), require_https);
    response
}

fn screen(request: &Request, require_https: bool) -> Result<(), ApiError> {
    if require_https && !is_https(request) {
        tracing::warn!(path = %request.uri().path(), "Rejected plain HTTP request");
        return Err(ApiError::forbidden("HTTPS is required"));
    }

    let target = decoded_target(request.uri());
    if let Some(pattern) = SUSPICIOUS_PATTERNS.iter().find(|p| target.contains(*p)) {
        tracing::warn!(pattern, path = %request.uri().path(), "Suspicious request blocked");
        return Err(ApiError::bad_request("Invalid request detected"));
    }

    Ok(())
}

fn is_https(request: &Request) -> bool {
    if request.uri().scheme_str() == Some("https") {
        return true;
    }
    request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|proto| proto.split(',').next().unwrap_or("").trim().eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

/// Path and query, percent-decoded (`+` read as a space) and lowercased.
/// Separators stay in place so `onerror=` still matches an empty value.
pub fn decoded_target(uri: &Uri) -> String {
    let raw = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or_else(|| uri.path());
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().to_lowercase()
}

pub fn apply_security_headers(headers: &mut HeaderMap, require_https: bool) {
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    if require_https {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(STRICT_TRANSPORT_SECURITY),
        );
    }
}
