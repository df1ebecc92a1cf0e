//! # passgate-auth
//!
//! Authorization-code single sign-on for Passgate.
//!
//! This crate provides:
//! - provider login sessions and single-use authorization codes
//! - client authentication and the `authorization_code` grant
//! - signed access tokens (HS256, RS256, RS384) and a JWKS document
//! - in-memory and Redis stores
//! - axum handlers for the provider endpoints
//! - a helper for relying applications
//!
//! ## Modules
//!
//! - [`config`] - Authentication configuration
//! - [`oauth`] - Login, authorization and client authentication
//! - [`token`] - Access token signing, verification and redemption
//! - [`storage`] - Storage traits and backends
//! - [`http`] - Axum HTTP handlers for provider endpoints
//! - [`relying_party`] - Callback handling for relying applications
//! - [`secret`] - Secret generation and hashing

pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod relying_party;
pub mod secret;
pub mod storage;
pub mod token;
pub mod types;

pub use config::{AuthConfig, ConfigError, SigningConfig, StorageBackend, StorageConfig};
pub use error::{AuthError, AuthResult, ErrorCategory};
pub use http::{ProviderState, SessionCookieConfig, provider_routes};
pub use relying_party::{
    RelyingPartyClient, RelyingPartyConfig, RelyingPartyError, relying_party_routes,
};
pub use storage::{AuthorizationCodeStorage, ClientStorage, LoginSessionStorage, UserStorage};
pub use token::{SigningAlgorithm, SigningKey, TokenIssuer, TokenService, TokenVerifier};
pub use types::{ClientSecret, RegisteredClient, UserAccount, UserProfile};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use passgate_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::AuthConfig;
    pub use crate::error::{AuthError, AuthResult, ErrorCategory};
    pub use crate::oauth::{AuthorizationService, LoginService};
    pub use crate::storage::{
        AuthorizationCodeStorage, ClientStorage, LoginSessionStorage, UserStorage,
    };
    pub use crate::token::{TokenIssuer, TokenService};
    pub use crate::types::{RegisteredClient, UserAccount};
}
