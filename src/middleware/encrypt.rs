use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::crypto::EncryptedPayload;
use crate::error::{ApiError, ErrorEnvelope};
use crate::state::AppState;

/// Decides per request whether the response body gets encrypted
#[derive(Clone)]
pub struct EncryptionPolicy {
    predicate: Arc<dyn Fn(&Request) -> bool + Send + Sync>,
}

impl EncryptionPolicy {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    pub fn always() -> Self {
        Self::new(|_| true)
    }

    pub fn never() -> Self {
        Self::new(|_| false)
    }

    pub fn applies(&self, request: &Request) -> bool {
        (self.predicate)(request)
    }
}

impl Default for EncryptionPolicy {
    fn default() -> Self {
        Self::always()
    }
}

impl std::fmt::Debug for EncryptionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionPolicy")
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let v = v.to_ascii_lowercase();
            v.starts_with("application/json") || v.contains("+json")
        })
        .unwrap_or(false)
}

/// Replace a JSON handler response with `{"data": <ciphertext>}`, keeping
/// status and headers. Error envelopes and non-JSON bodies pass untouched.
pub async fn encrypt_response(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let wanted = state.encryption.applies(&request);
    let response = next.run(request).await;

    if !wanted || response.extensions().get::<ErrorEnvelope>().is_some() || !is_json(response.headers()) {
        return Ok(response);
    }

    let (mut parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.map_err(|e| {
        tracing::error!("Failed to buffer response body: {}", e);
        ApiError::internal_server_error("Failed to format response")
    })?;

    let wrapped = EncryptedPayload {
        data: state.cipher.encrypt_bytes(&bytes)?,
    };
    let encoded = serde_json::to_vec(&wrapped).map_err(|e| {
        tracing::error!("Failed to encode encrypted response: {}", e);
        ApiError::internal_server_error("Failed to format response")
    })?;

    parts.headers.remove(header::CONTENT_LENGTH);
    Ok(Response::from_parts(parts, Body::from(encoded)))
}
