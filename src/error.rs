// HTTP API Error Types
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::auth::TokenError;
use crate::config::ConfigError;
use crate::crypto::CryptoError;
use crate::database::dynamic::ValueError;
use crate::database::repository::RepositoryError;

/// Response extension marking a body as an error envelope.
///
/// The encryption stage leaves marked responses alone and the outer
/// normalizer does not rewrite them a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorEnvelope;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    MalformedPayload(String),
    ValidationFailed(String),

    // 401 Unauthorized, optionally carrying a `WWW-Authenticate` challenge
    Unauthorized {
        message: String,
        challenge: Option<String>,
    },

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 405 Method Not Allowed
    MethodNotAllowed(String),

    // 409 Conflict
    Conflict(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 422 Unprocessable Entity
    UnprocessableEntity(String),

    // 429 Too Many Requests
    TooManyRequests {
        message: String,
        limit: u32,
        reset_at: i64,
        retry_after: u64,
    },

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::MalformedPayload(_) => 400,
            ApiError::ValidationFailed(_) => 400,
            ApiError::Unauthorized { .. } => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::MethodNotAllowed(_) => 405,
            ApiError::Conflict(_) => 409,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::UnprocessableEntity(_) => 422,
            ApiError::TooManyRequests { .. } => 429,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::MalformedPayload(msg) => msg,
            ApiError::ValidationFailed(msg) => msg,
            ApiError::Unauthorized { message, .. } => message,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::MethodNotAllowed(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::PayloadTooLarge(msg) => msg,
            ApiError::UnprocessableEntity(msg) => msg,
            ApiError::TooManyRequests { message, .. } => message,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for logs
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            ApiError::ValidationFailed(_) => "VALIDATION_FAILED",
            ApiError::Unauthorized { .. } => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::UnprocessableEntity(_) => "UNPROCESSABLE_ENTITY",
            ApiError::TooManyRequests { .. } => "RATE_LIMIT_EXCEEDED",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Failure envelope: `{success, message, code, data}`
    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "message": self.message(),
            "code": self.status_code(),
            "data": Value::Null,
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn malformed_payload(message: impl Into<String>) -> Self {
        ApiError::MalformedPayload(message.into())
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        ApiError::ValidationFailed(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            message: message.into(),
            challenge: None,
        }
    }

    /// 401 asking the client for Basic credentials in `realm`
    pub fn basic_challenge(message: impl Into<String>, realm: &str) -> Self {
        ApiError::Unauthorized {
            message: message.into(),
            challenge: Some(format!("Basic realm=\"{}\"", realm)),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        ApiError::MethodNotAllowed(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        ApiError::PayloadTooLarge(message.into())
    }

    pub fn unprocessable_entity(message: impl Into<String>) -> Self {
        ApiError::UnprocessableEntity(message.into())
    }

    pub fn too_many_requests(limit: u32, reset_at: i64, retry_after: u64) -> Self {
        ApiError::TooManyRequests {
            message: "Rate limit exceeded".to_string(),
            limit,
            reset_at,
            retry_after,
        }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    /// Map a bare status from the framework onto the closest variant
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status.as_u16() {
            400 => ApiError::BadRequest(message),
            401 => ApiError::unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            405 => ApiError::MethodNotAllowed(message),
            409 => ApiError::Conflict(message),
            413 => ApiError::PayloadTooLarge(message),
            415 | 422 => ApiError::UnprocessableEntity(message),
            503 => ApiError::ServiceUnavailable(message),
            400..=499 => ApiError::BadRequest(message),
            _ => ApiError::InternalServerError(message),
        }
    }
}

// Convert other error types to ApiError
impl From<ValueError> for ApiError {
    fn from(err: ValueError) -> Self {
        match err {
            ValueError::MalformedPayload(detail) => {
                tracing::debug!("Rejected payload: {}", detail);
                ApiError::malformed_payload("Malformed JSON payload")
            }
            ValueError::NotAMap(kind) => {
                ApiError::malformed_payload(format!("Expected a JSON object, found {}", kind))
            }
            ValueError::Encoding(msg) => {
                tracing::error!("Payload encoding error: {}", msg);
                ApiError::internal_server_error("Failed to format response")
            }
        }
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        if err.is_config_error() {
            // Don't expose key problems to clients
            tracing::error!("Encryption configuration error: {}", err);
            return ApiError::internal_server_error("An error occurred while processing your request");
        }
        tracing::debug!("Rejected ciphertext: {}", err);
        ApiError::malformed_payload("Invalid encrypted data")
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::unauthorized("Token has expired"),
            TokenError::Invalid(detail) => {
                tracing::debug!("Rejected token: {}", detail);
                ApiError::unauthorized("Invalid token")
            }
            TokenError::MissingSecret | TokenError::Generation(_) => {
                tracing::error!("Token service error: {}", err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Unavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            other => {
                // Log the real error but return generic message
                tracing::error!("Store error: {}", other);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        tracing::error!("Configuration error: {}", err);
        ApiError::internal_server_error("An error occurred while processing your request")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        tracing::debug!(code = self.error_code(), status = status.as_u16(), "{}", self.message());

        let mut response = (status, Json(self.to_json())).into_response();
        let headers = response.headers_mut();

        match &self {
            ApiError::Unauthorized {
                challenge: Some(challenge),
                ..
            } => {
                if let Ok(value) = HeaderValue::from_str(challenge) {
                    headers.insert(header::WWW_AUTHENTICATE, value);
                }
            }
            ApiError::TooManyRequests {
                limit,
                reset_at,
                retry_after,
                ..
            } => {
                headers.insert(header::RETRY_AFTER, HeaderValue::from(*retry_after));
                headers.insert("rate-limit-limit", HeaderValue::from(*limit));
                headers.insert("rate-limit-remaining", HeaderValue::from(0u32));
                headers.insert("rate-limit-reset", HeaderValue::from(*reset_at));
            }
            _ => {}
        }

        response.extensions_mut().insert(ErrorEnvelope);
        response
    }
}
