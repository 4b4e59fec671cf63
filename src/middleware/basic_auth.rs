use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use subtle::ConstantTimeEq;

use crate::config::BasicCredentials;
use crate::error::ApiError;
use crate::middleware::context::{with_context, BasicIdentity, BasicRole};
use crate::state::AppState;

/// Required Basic authentication against the generic credential pair.
///
/// A missing header gets a 401 carrying the `WWW-Authenticate` challenge; a
/// malformed header or a mismatch gets a plain 401.
pub async fn require_generic_basic(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let realm = state.security.realm.as_str();

    let Some(expected) = state.security.basic.as_ref() else {
        tracing::error!("Basic credentials are not configured; rejecting request");
        return Err(ApiError::basic_challenge("Authentication required", realm));
    };

    let (username, password) = match extract_basic_from_headers(request.headers()) {
        Ok(Some(pair)) => pair,
        Ok(None) => return Err(ApiError::basic_challenge("Authentication required", realm)),
        Err(msg) => {
            tracing::warn!("Rejected Basic header: {}", msg);
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    };

    if !credentials_match(expected, &username, &password) {
        tracing::warn!(username = %username, "Invalid Basic credentials");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    with_context(&mut request, |ctx| {
        ctx.set_basic(BasicIdentity {
            username,
            role: BasicRole::Generic,
        })
    })?;

    Ok(next.run(request).await)
}

/// Advisory Basic authentication against the admin pair. A match is recorded
/// in the security context; anything else passes through unauthenticated.
pub async fn advisory_admin_basic(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.security.admin_basic.as_ref() {
        match extract_basic_from_headers(request.headers()) {
            Ok(Some((username, password))) if credentials_match(expected, &username, &password) => {
                tracing::debug!(username = %username, "Admin Basic credentials accepted");
                with_context(&mut request, |ctx| {
                    ctx.set_basic(BasicIdentity {
                        username,
                        role: BasicRole::Admin,
                    })
                })?;
            }
            Ok(Some((username, _))) => {
                tracing::debug!(username = %username, "Admin Basic credentials did not match");
            }
            Ok(None) => {}
            Err(msg) => tracing::debug!("Ignoring Basic header: {}", msg),
        }
    }

    Ok(next.run(request).await)
}

/// Extract a Basic credential pair; `Ok(None)` when no Basic header is present
pub fn extract_basic_from_headers(headers: &HeaderMap) -> Result<Option<(String, String)>, String> {
    let Some(auth_header) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    let Some(encoded) = auth_str
        .strip_prefix("Basic ")
        .or_else(|| auth_str.strip_prefix("basic "))
    else {
        // some other scheme, e.g. Bearer
        return Ok(None);
    };

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| "Basic credentials are not valid base64".to_string())?;
    let decoded = String::from_utf8(decoded).map_err(|_| "Basic credentials are not UTF-8".to_string())?;

    match decoded.split_once(':') {
        Some((user, pass)) => Ok(Some((user.to_string(), pass.to_string()))),
        None => Err("Basic credentials must be username:password".to_string()),
    }
}

/// Constant-time comparison of both halves
pub fn credentials_match(expected: &BasicCredentials, username: &str, password: &str) -> bool {
    let user_ok = expected.username.as_bytes().ct_eq(username.as_bytes());
    let pass_ok = expected.password.as_bytes().ct_eq(password.as_bytes());
    (user_ok & pass_ok).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn parses_well_formed_header() {
        let encoded = STANDARD.encode("desk:s3cret:with:colons");
        let pair = extract_basic_from_headers(&headers_with(&format!("Basic {}", encoded)))
            .unwrap()
            .unwrap();
        assert_eq!(pair, ("desk".to_string(), "s3cret:with:colons".to_string()));
    }

    #[test]
    fn absent_and_foreign_schemes_read_as_none() {
        assert_eq!(extract_basic_from_headers(&HeaderMap::new()).unwrap(), None);
        assert_eq!(extract_basic_from_headers(&headers_with("Bearer abc")).unwrap(), None);
    }

    #[test]
    fn malformed_header_is_an_error() {
        assert!(extract_basic_from_headers(&headers_with("Basic !!!")).is_err());
        let no_colon = format!("Basic {}", STANDARD.encode("desk"));
        assert!(extract_basic_from_headers(&headers_with(&no_colon)).is_err());
    }

    #[test]
    fn credentials_compare_both_halves() {
        let expected = BasicCredentials::new("desk", "s3cret");
        assert!(credentials_match(&expected, "desk", "s3cret"));
        assert!(!credentials_match(&expected, "desk", "s3cre"));
        assert!(!credentials_match(&expected, "Desk", "s3cret"));
    }
}
