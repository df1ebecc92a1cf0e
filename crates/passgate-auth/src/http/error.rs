//! `{"detail": ...}` error bodies for browser-facing endpoints.

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::AuthError;

/// An [`AuthError`] rendered as `{"detail": "..."}` with the matching status.
#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if self.0.is_server_error() {
            tracing::error!(error = %self.0, category = %self.0.category(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, category = %self.0.category(), "Request rejected");
        }
        (status, Json(json!({ "detail": self.0.public_detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_api_error_body() {
        let response = ApiError(AuthError::invalid_redirect_uri("mismatch")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({"detail": "Invalid redirect_uri"}));
    }
}
