//! Outer error normalizer.
//!
//! Handlers and stages already return [`ApiError`] envelopes. This stage
//! catches what the framework produces on its own (extractor rejections,
//! unknown methods, panics) and rewrites it into the same envelope.

use std::any::Any;

use axum::{
    body::to_bytes,
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, ErrorEnvelope};

/// Longest plain-text rejection body reused as the envelope message
const MAX_MESSAGE_BYTES: usize = 512;

pub async fn normalize_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error())
        || response.extensions().get::<ErrorEnvelope>().is_some()
    {
        return response;
    }

    let (parts, body) = response.into_parts();

    let message = if status.is_server_error() {
        "Internal server error".to_string()
    } else {
        to_bytes(body, MAX_MESSAGE_BYTES)
            .await
            .ok()
            .and_then(|bytes| String::from_utf8(bytes.to_vec()).ok())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string())
    };

    tracing::debug!(status = status.as_u16(), "Normalizing framework error: {}", message);

    let mut normalized = ApiError::from_status(status, message).into_response();

    // keep headers such as `Allow`, drop the old body framing
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            normalized.headers_mut().insert(name.clone(), value.clone());
        }
    }

    normalized
}

/// Response for a panicking handler, used with `CatchPanicLayer::custom`
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", detail);

    ApiError::internal_server_error("Internal server error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware::from_fn, routing::get, Router};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn router() -> Router {
        Router::new()
            .route("/plain", get(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "bad query") }))
            .route("/typed", get(|| async { ApiError::conflict("Username already exists") }))
            .route("/boom", get(|| async { StatusCode::BAD_GATEWAY }))
            .layer(from_fn(normalize_errors))
    }

    #[tokio::test]
    async fn plain_text_rejections_become_envelopes() {
        let response = router()
            .oneshot(Request::builder().uri("/plain").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "bad query");
        assert_eq!(body["code"], 422);
    }

    #[tokio::test]
    async fn typed_errors_pass_through() {
        let response = router()
            .oneshot(Request::builder().uri("/typed").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["message"], "Username already exists");
    }

    #[tokio::test]
    async fn server_errors_hide_their_body() {
        let response = router()
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["code"], 500);
    }

    #[tokio::test]
    async fn method_not_allowed_keeps_allow_header() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/plain")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().get(header::ALLOW).is_some());
        assert_eq!(body_json(response).await["message"], "Method Not Allowed");
    }

    #[test]
    fn panic_payloads_are_not_leaked() {
        let response = panic_response(Box::new("secret detail".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
