//! Token endpoint request, response and error bodies.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Form body of `POST /token`.
///
/// Client credentials may come from this body or from an HTTP Basic
/// `Authorization` header.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TokenRequest {
    /// Must be "authorization_code".
    pub grant_type: String,

    pub code: Option<String>,

    /// Must repeat the redirect URI used at `/authorize`.
    pub redirect_uri: Option<String>,

    pub client_id: Option<String>,

    pub client_secret: Option<String>,
}

/// Successful token response.
///
/// ```json
/// {
///   "access_token": "eyJhbG...",
///   "token_type": "Bearer",
///   "expires_in": 900
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    /// Always "Bearer".
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenResponse {
    #[must_use]
    pub fn bearer(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            scope: None,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        self.scope = (!scope.is_empty()).then_some(scope);
        self
    }
}

/// Error body returned by the token endpoint.
///
/// ```json
/// {
///   "error": "invalid_grant",
///   "detail": "Invalid or expired authorization code"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenError {
    /// OAuth 2.0 error code.
    pub error: String,

    /// Generic human-readable description.
    pub detail: String,
}

impl From<&AuthError> for TokenError {
    fn from(err: &AuthError) -> Self {
        Self {
            error: err.oauth_error_code().to_string(),
            detail: err.public_detail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_response_serialization() {
        let response = TokenResponse::bearer("tok".to_string(), 900).with_scope("");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"access_token": "tok", "token_type": "Bearer", "expires_in": 900})
        );

        let response = TokenResponse::bearer("tok".to_string(), 900).with_scope("openid");
        assert_eq!(response.scope.as_deref(), Some("openid"));
    }

    #[test]
    fn test_token_error_is_generic() {
        let err = AuthError::invalid_grant("issued to app2");
        let body = TokenError::from(&err);
        assert_eq!(body.error, "invalid_grant");
        assert_eq!(body.detail, "Invalid or expired authorization code");

        let err = AuthError::invalid_client("wrong secret for app1");
        let body = TokenError::from(&err);
        assert_eq!(body.error, "invalid_client");
        assert_eq!(body.detail, "Invalid client credentials");
    }
}
