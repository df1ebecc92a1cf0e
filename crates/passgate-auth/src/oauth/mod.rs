//! OAuth 2.0 authorization-code flow.
//!
//! - [`authorize`] - request/response types for `/authorize`
//! - [`code`] - single-use authorization codes
//! - [`login_session`] - provider login sessions
//! - [`client_auth`] - client authentication at `/token`
//! - [`token`] - `/token` request/response bodies
//! - [`service`] - login and authorization services

pub mod authorize;
pub mod client_auth;
pub mod code;
pub mod login_session;
pub mod service;
pub mod token;

pub use authorize::{AuthorizationError, AuthorizationRequest, AuthorizationResponse};
pub use client_auth::{ClientCredentials, authenticate_client};
pub use code::AuthorizationCode;
pub use login_session::LoginSession;
pub use service::{AuthorizationConfig, AuthorizationService, IssuedCode, LoginService};
pub use token::{TokenError, TokenRequest, TokenResponse};
