//! Token endpoint handler.
//!
//! ```ignore
//! POST /token
//! Content-Type: application/x-www-form-urlencoded
//! Authorization: Basic <base64(client_id:client_secret)>
//!
//! grant_type=authorization_code
//! &code=SplxlOBeZQQYbYS6WxSbIA
//! &redirect_uri=http://localhost:3001/callback
//! ```

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};

use super::ProviderState;
use crate::error::AuthError;
use crate::oauth::client_auth::ClientCredentials;
use crate::oauth::token::{TokenError, TokenRequest, TokenResponse};

/// `POST /token`
pub async fn token_handler(
    State(state): State<ProviderState>,
    headers: HeaderMap,
    Form(request): Form<TokenRequest>,
) -> Response {
    tracing::debug!(
        grant_type = %request.grant_type,
        client_id = ?request.client_id,
        "Processing token request"
    );

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let credentials = match ClientCredentials::extract(
        authorization,
        request.client_id.as_deref(),
        request.client_secret.as_deref(),
    ) {
        Ok(credentials) => credentials,
        Err(e) => return token_error_response(&e),
    };

    match state.tokens.exchange_code(&request, &credentials).await {
        Ok(response) => token_success_response(response),
        Err(e) => {
            tracing::warn!(
                client_id = %credentials.client_id,
                error = %e,
                "Token request failed"
            );
            token_error_response(&e)
        }
    }
}

fn token_success_response(response: TokenResponse) -> Response {
    (
        StatusCode::OK,
        [
            (header::CACHE_CONTROL, "no-store"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(response),
    )
        .into_response()
}

fn token_error_response(error: &AuthError) -> Response {
    let mut response = (
        error.status_code(),
        [
            (header::CACHE_CONTROL, "no-store"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(TokenError::from(error)),
    )
        .into_response();

    if matches!(error, AuthError::InvalidClient { .. }) {
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            header::HeaderValue::from_static("Basic realm=\"passgate\""),
        );
    }
    response
}
