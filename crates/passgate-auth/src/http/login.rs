//! Login, logout and profile handlers.

use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;

use super::ProviderState;
use super::error::ApiError;
use crate::error::AuthError;
use crate::types::UserProfile;

/// Form body of `POST /api/login`.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Local `/authorize?...` URL to resume after login.
    #[serde(default)]
    pub return_to: Option<String>,
}

/// `POST /api/login`
pub async fn login_handler(
    State(state): State<ProviderState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Response), ApiError> {
    let session = state
        .login
        .login(&form.username, &form.password)
        .await
        .map_err(|e| match e {
            AuthError::Unauthenticated { .. } => {
                AuthError::invalid_request("Incorrect username or password")
            }
            other => other,
        })?;

    let jar = jar.add(state.cookie.build(&session.session_id));

    let response = match form.return_to.as_deref().filter(|t| is_local_authorize_url(t)) {
        Some(target) => Redirect::to(target).into_response(),
        None => Json(json!({ "message": "Login successful" })).into_response(),
    };
    Ok((jar, response))
}

/// `GET|POST /api/logout`
pub async fn logout_handler(
    State(state): State<ProviderState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    let token = state.cookie.read(&jar);
    state.login.logout(token.as_deref()).await?;
    Ok((
        state.cookie.clear(jar),
        Json(json!({ "message": "Logged out" })),
    ))
}

/// `GET /api/me`
///
/// Accepts the provider session cookie or a bearer access token.
pub async fn me_handler(
    State(state): State<ProviderState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Json<UserProfile>, ApiError> {
    if let Some(token) = bearer_token(&headers) {
        let claims = state
            .issuer
            .verifier()
            .verify(token)
            .map_err(|_| AuthError::unauthenticated("Invalid bearer token"))?;
        return Ok(Json(UserProfile {
            sub: claims.sub,
            email: claims.email,
            full_name: claims.name,
        }));
    }

    let session_token = state.cookie.read(&jar);
    let user = state.login.current_user(session_token.as_deref()).await?;
    Ok(Json(user.profile()))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Only same-origin authorize URLs are followed after login.
fn is_local_authorize_url(target: &str) -> bool {
    target.starts_with("/authorize?") && !target.contains(['\r', '\n', '\\'])
}
