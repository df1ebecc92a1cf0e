//! HTTP handlers for the provider endpoints.
//!
//! # Available Handlers
//!
//! - [`login`] - `POST /api/login`, `GET|POST /api/logout`, `GET /api/me`
//! - [`authorize`] - `GET /authorize`
//! - [`token`] - `POST /token`
//! - [`jwks`] - `GET /jwks.json`
//!
//! All handlers share a single [`ProviderState`]; [`provider_routes`] wires
//! them into a router.

pub mod authorize;
pub mod cookies;
pub mod error;
pub mod jwks;
pub mod login;
pub mod token;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::oauth::service::{AuthorizationService, LoginService};
use crate::token::jwt::TokenIssuer;
use crate::token::service::TokenService;

pub use authorize::authorize_handler;
pub use cookies::SessionCookieConfig;
pub use error::ApiError;
pub use jwks::jwks_handler;
pub use login::{login_handler, logout_handler, me_handler};
pub use token::token_handler;

/// State shared by the provider handlers.
#[derive(Clone)]
pub struct ProviderState {
    pub login: Arc<LoginService>,
    pub authorization: Arc<AuthorizationService>,
    pub tokens: Arc<TokenService>,
    pub issuer: Arc<TokenIssuer>,
    pub cookie: SessionCookieConfig,
    /// Where `/authorize` sends unauthenticated browsers.
    pub login_page: String,
}

/// Routes for every provider endpoint.
pub fn provider_routes(state: ProviderState) -> Router {
    Router::new()
        .route("/api/login", post(login_handler))
        .route("/api/logout", get(logout_handler).post(logout_handler))
        .route("/api/me", get(me_handler))
        .route("/authorize", get(authorize_handler))
        .route("/token", post(token_handler))
        .route("/jwks.json", get(jwks_handler))
        .with_state(state)
}
