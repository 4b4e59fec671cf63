use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use url::form_urlencoded;

use crate::database::dynamic::DynamicValue;
use crate::error::ApiError;
use crate::middleware::context::with_context;
use crate::state::AppState;

/// Field carrying ciphertext in queries, forms and JSON bodies
pub const DATA_FIELD: &str = "data";

/// Pull the `data` ciphertext out of the request, decrypt it, and store the
/// plaintext in the security context. GET reads the query string; every
/// other method reads a form-encoded or JSON body.
pub async fn decrypt_payload(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();

    let (ciphertext, body) = if parts.method == Method::GET {
        (query_data(parts.uri.query()), body)
    } else {
        let bytes = to_bytes(body, state.security.max_body_bytes)
            .await
            .map_err(|_| ApiError::payload_too_large("Request body too large"))?;
        (body_data(&parts.headers, &bytes)?, Body::from(bytes))
    };

    let ciphertext = ciphertext.ok_or_else(|| ApiError::bad_request("Data should be encrypted"))?;
    let plaintext = state.cipher.decrypt(&ciphertext)?;
    tracing::debug!(path = %parts.uri.path(), bytes = plaintext.len(), "Decrypted request payload");

    let mut request = Request::from_parts(parts, body);
    with_context(&mut request, |ctx| ctx.set_decrypted_body(Bytes::from(plaintext)))?;

    Ok(next.run(request).await)
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

/// `data` from a query string
pub fn query_data(query: Option<&str>) -> Option<String> {
    let query = query?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == DATA_FIELD)
        .map(|(_, value)| value.into_owned())
        .and_then(non_empty)
}

/// `data` from a form-encoded or JSON body; `Ok(None)` for any other
/// content type or when the field is absent
pub fn body_data(headers: &HeaderMap, body: &[u8]) -> Result<Option<String>, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase())
        .unwrap_or_default();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        return Ok(form_urlencoded::parse(body)
            .find(|(key, _)| key == DATA_FIELD)
            .map(|(_, value)| value.into_owned())
            .and_then(non_empty));
    }

    if content_type.starts_with("application/json") || content_type.contains("+json") {
        if body.is_empty() {
            return Ok(None);
        }
        let value = DynamicValue::from_slice(body)?;
        return Ok(value[DATA_FIELD].as_str().map(str::to_string).and_then(non_empty));
    }

    Ok(None)
}
