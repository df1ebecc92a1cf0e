//! Authorization endpoint handler.

use axum::Json;
use axum::extract::{Query, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use super::ProviderState;
use super::error::ApiError;
use crate::error::AuthError;
use crate::oauth::authorize::{AuthorizationError, AuthorizationRequest, login_redirect_url};

/// `GET /authorize`
///
/// - unknown client or redirect mismatch: 400 `{detail}` shown to the browser
/// - unsupported `response_type`: error redirect to the registered URI
/// - no session: redirect to the login page with the original query
/// - otherwise: redirect to `redirect_uri?code=...&state=...`
pub async fn authorize_handler(
    State(state): State<ProviderState>,
    RawQuery(raw_query): RawQuery,
    Query(request): Query<AuthorizationRequest>,
    jar: CookieJar,
) -> Response {
    let session_token = state.cookie.read(&jar);

    match state
        .authorization
        .authorize(&request, session_token.as_deref())
        .await
    {
        Ok(issued) => Redirect::to(&issued.redirect_url).into_response(),
        Err(AuthError::Unauthenticated { .. }) => {
            let target = login_redirect_url(&state.login_page, raw_query.as_deref().unwrap_or(""));
            tracing::debug!(client_id = %request.client_id, "No session, redirecting to login");
            Redirect::to(&target).into_response()
        }
        Err(err @ AuthError::UnsupportedResponseType { .. }) => {
            // Client and redirect URI were validated before this error can occur.
            let redirect = AuthorizationError::new(
                err.oauth_error_code(),
                request.state().map(str::to_string),
            )
            .with_description(err.public_detail())
            .to_redirect_url(&request.redirect_uri);
            match redirect {
                Ok(url) => Redirect::to(&url).into_response(),
                Err(_) => ApiError(err).into_response(),
            }
        }
        Err(err) if err.is_client_error() => {
            tracing::warn!(
                client_id = %request.client_id,
                error = %err,
                "Authorization request rejected"
            );
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": err.public_detail() })),
            )
                .into_response()
        }
        Err(err) => ApiError(err).into_response(),
    }
}
