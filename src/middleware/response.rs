use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;

const DEFAULT_MESSAGE: &str = "Success";

/// Wrapper for API responses that automatically adds the success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub message: String,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            message: DEFAULT_MESSAGE.to_string(),
            status_code: None,
        }
    }

    /// Create an API response with custom status code
    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self {
            data: Some(data),
            message: DEFAULT_MESSAGE.to_string(),
            status_code: Some(status_code),
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl ApiResponse<()> {
    /// Message-only success; `data` is null
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: message.into(),
            status_code: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        // Convert data to JSON Value for consistent envelope format
        let data_value = match self.data.as_ref().map(serde_json::to_value).transpose() {
            Ok(value) => value.unwrap_or(Value::Null),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return ApiError::internal_server_error("Failed to serialize response data").into_response();
            }
        };

        let envelope = json!({
            "success": true,
            "message": self.message,
            "code": status.as_u16(),
            "data": data_value,
        });

        (status, Json(envelope)).into_response()
    }
}

// Convenience type aliases
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_envelope_shape() {
        let response = ApiResponse::success(json!({"status": "ok"})).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"success": true, "message": "Success", "code": 200, "data": {"status": "ok"}})
        );
    }

    #[tokio::test]
    async fn created_with_message() {
        let response = ApiResponse::created(json!([1, 2]))
            .with_message("Stored")
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["code"], 201);
        assert_eq!(body["message"], "Stored");
    }

    #[tokio::test]
    async fn message_only_has_null_data() {
        let body = body_json(ApiResponse::message_only("Done").into_response()).await;
        assert_eq!(body["data"], Value::Null);
        assert_eq!(body["success"], true);
    }
}
