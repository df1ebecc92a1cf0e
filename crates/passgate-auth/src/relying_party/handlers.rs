//! Axum handlers for the relying application.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;

use super::{RelyingPartyClient, RelyingPartyError, generate_state};
use crate::secret::constant_time_eq;

/// Query parameters the provider appends to the callback URL.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// `GET /login`: starts a login attempt at the provider.
pub async fn login_handler(
    State(client): State<Arc<RelyingPartyClient>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let state = generate_state();
    let url = client.authorization_url(&state);
    (jar.add(client.state_cookie(&state)), Redirect::to(&url))
}

/// `GET <redirect_uri path>`: redeems the code and stores the access token.
///
/// Every outcome redirects to `home_url`; failures append `?error=<code>`.
pub async fn callback_handler(
    State(client): State<Arc<RelyingPartyClient>>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> Response {
    let expected_state = jar
        .get(&client.config.state_cookie_name)
        .map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::build(client.config.state_cookie_name.clone()).path("/"));

    match complete_login(&client, params, expected_state.as_deref()).await {
        Ok(cookie) => {
            tracing::info!(client_id = %client.config.client_id, "Login completed");
            (jar.add(cookie), Redirect::to(&client.config.home_url)).into_response()
        }
        Err(e) => {
            tracing::warn!(
                client_id = %client.config.client_id,
                error = %e,
                "Login callback failed"
            );
            let target = client.home_with_error(e.redirect_code());
            (jar, Redirect::to(&target)).into_response()
        }
    }
}

async fn complete_login(
    client: &RelyingPartyClient,
    params: CallbackParams,
    expected_state: Option<&str>,
) -> Result<Cookie<'static>, RelyingPartyError> {
    let state_matches = match (expected_state, params.state.as_deref()) {
        (Some(expected), Some(actual)) => constant_time_eq(expected, actual),
        _ => false,
    };
    if !state_matches {
        return Err(RelyingPartyError::StateMismatch);
    }
    if let Some(error) = params.error {
        return Err(RelyingPartyError::AuthorizationDenied(error));
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or(RelyingPartyError::MissingCode)?;

    let token = client.exchange_code(&code).await?;
    Ok(client.session_cookie(&token.access_token, token.expires_in))
}

/// `GET /logout`: drops the relying application's session cookie.
///
/// The provider session is left alone.
pub async fn logout_handler(
    State(client): State<Arc<RelyingPartyClient>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let jar = jar.remove(Cookie::build(client.config.session_cookie_name.clone()).path("/"));
    (jar, Redirect::to(&client.config.home_url))
}
