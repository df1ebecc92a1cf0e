//! Login and authorization services.
//!
//! [`LoginService`] owns the provider login session: it checks credentials,
//! starts sessions and resolves the session cookie. [`AuthorizationService`]
//! runs the `/authorize` checks and mints codes.
//!
//! # Usage
//!
//! ```ignore
//! let service = AuthorizationService::new(clients, sessions, codes, AuthorizationConfig::default());
//! let issued = service.authorize(&request, cookie.as_deref()).await?;
//! let location = issued.redirect_url;
//! ```

use std::sync::Arc;

use time::Duration;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::oauth::authorize::{AuthorizationRequest, AuthorizationResponse};
use crate::oauth::code::AuthorizationCode;
use crate::oauth::login_session::LoginSession;
use crate::storage::{
    AuthorizationCodeStorage, ClientStorage, LoginSessionStorage, RetryPolicy, UserStorage,
};
use crate::types::{RegisteredClient, UserAccount};

/// Lifetimes and retry policy shared by the services.
#[derive(Debug, Clone)]
pub struct AuthorizationConfig {
    /// Authorization code lifetime. Default: 5 minutes.
    pub code_lifetime: Duration,

    /// Login session lifetime. Default: 1 day.
    pub session_lifetime: Duration,

    /// Retry policy for store calls.
    pub retry: RetryPolicy,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            code_lifetime: Duration::minutes(5),
            session_lifetime: Duration::days(1),
            retry: RetryPolicy::default(),
        }
    }
}

impl AuthorizationConfig {
    #[must_use]
    pub fn from_auth_config(config: &AuthConfig) -> Self {
        Self {
            code_lifetime: to_time(config.authorization_code_lifetime),
            session_lifetime: to_time(config.session_lifetime),
            retry: RetryPolicy::from_config(config),
        }
    }

    #[must_use]
    pub fn with_code_lifetime(mut self, lifetime: Duration) -> Self {
        self.code_lifetime = lifetime;
        self
    }

    #[must_use]
    pub fn with_session_lifetime(mut self, lifetime: Duration) -> Self {
        self.session_lifetime = lifetime;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Converts a configured duration, saturating on overflow.
#[must_use]
pub fn to_time(d: std::time::Duration) -> Duration {
    Duration::try_from(d).unwrap_or(Duration::MAX)
}

// ============================================================================
// Login
// ============================================================================

/// Provider-side login sessions.
pub struct LoginService {
    users: Arc<dyn UserStorage>,
    sessions: Arc<dyn LoginSessionStorage>,
    config: AuthorizationConfig,
}

impl LoginService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStorage>,
        sessions: Arc<dyn LoginSessionStorage>,
        config: AuthorizationConfig,
    ) -> Self {
        Self {
            users,
            sessions,
            config,
        }
    }

    /// Checks credentials and starts a session.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` for unknown users or wrong passwords, and
    /// `Storage` if the session cannot be saved.
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<LoginSession> {
        let user = self
            .users
            .verify_password(username, password)
            .await?
            .ok_or_else(|| AuthError::unauthenticated("Incorrect username or password"))?;

        let session = LoginSession::start(&user.username, self.config.session_lifetime);
        self.config
            .retry
            .run("session.create", || self.sessions.create(&session))
            .await?;

        tracing::info!(subject = %user.username, "User logged in");
        Ok(session)
    }

    /// Resolves a session cookie value to a live session.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when the cookie is absent, unknown or expired.
    pub async fn current_session(&self, session_token: Option<&str>) -> AuthResult<LoginSession> {
        let token = session_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::unauthenticated("No session cookie"))?;
        self.config
            .retry
            .run("session.find", || self.sessions.find(token))
            .await?
            .ok_or_else(|| AuthError::unauthenticated("Session unknown or expired"))
    }

    /// Loads the account behind a live session.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` if the session or its user is gone.
    pub async fn current_user(&self, session_token: Option<&str>) -> AuthResult<UserAccount> {
        let session = self.current_session(session_token).await?;
        self.find_user(&session.subject).await
    }

    /// Looks up an active user by subject.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` if the user is unknown or inactive.
    pub async fn find_user(&self, subject: &str) -> AuthResult<UserAccount> {
        self.users
            .find_by_username(subject)
            .await?
            .filter(|u| u.active)
            .ok_or_else(|| AuthError::unauthenticated("User no longer exists"))
    }

    /// Ends a session. Unknown or missing tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store fails.
    pub async fn logout(&self, session_token: Option<&str>) -> AuthResult<()> {
        let Some(token) = session_token.filter(|t| !t.is_empty()) else {
            return Ok(());
        };
        self.config
            .retry
            .run("session.delete", || self.sessions.delete(token))
            .await?;
        tracing::info!("User logged out");
        Ok(())
    }

    #[must_use]
    pub fn session_lifetime(&self) -> Duration {
        self.config.session_lifetime
    }
}

// ============================================================================
// Authorization
// ============================================================================

/// A code minted by `/authorize` and the redirect that delivers it.
#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub code: AuthorizationCode,
    pub redirect_url: String,
}

/// Runs the authorization endpoint checks and mints codes.
pub struct AuthorizationService {
    clients: Arc<dyn ClientStorage>,
    sessions: Arc<dyn LoginSessionStorage>,
    codes: Arc<dyn AuthorizationCodeStorage>,
    config: AuthorizationConfig,
}

impl AuthorizationService {
    #[must_use]
    pub fn new(
        clients: Arc<dyn ClientStorage>,
        sessions: Arc<dyn LoginSessionStorage>,
        codes: Arc<dyn AuthorizationCodeStorage>,
        config: AuthorizationConfig,
    ) -> Self {
        Self {
            clients,
            sessions,
            codes,
            config,
        }
    }

    /// Resolves the client and checks the redirect URI.
    ///
    /// Nothing may be redirected to `redirect_uri` before this succeeds.
    ///
    /// # Errors
    ///
    /// - `InvalidClient` for unknown or inactive clients
    /// - `InvalidRedirectUri` if the URI is not exactly the registered one
    pub async fn validate_client_redirect(
        &self,
        client_id: &str,
        redirect_uri: &str,
    ) -> AuthResult<RegisteredClient> {
        let client = self
            .clients
            .find_by_client_id(client_id)
            .await?
            .filter(|c| c.active)
            .ok_or_else(|| AuthError::invalid_client(format!("Unknown client: {client_id}")))?;

        if !client.redirect_uri_matches(redirect_uri) {
            return Err(AuthError::invalid_redirect_uri(format!(
                "redirect_uri does not match the registration of {client_id}"
            )));
        }
        Ok(client)
    }

    /// Processes an authorization request.
    ///
    /// Checks run in this order: client, redirect URI, response type,
    /// session. On success exactly one code is stored.
    ///
    /// # Errors
    ///
    /// - `InvalidClient` / `InvalidRedirectUri`: show to the browser
    /// - `UnsupportedResponseType`: safe to redirect to `redirect_uri`
    /// - `Unauthenticated`: send the browser to the login page
    /// - `Storage`: the code could not be saved
    pub async fn authorize(
        &self,
        request: &AuthorizationRequest,
        session_token: Option<&str>,
    ) -> AuthResult<IssuedCode> {
        let client = self
            .validate_client_redirect(&request.client_id, &request.redirect_uri)
            .await?;

        if request.response_type != "code" {
            return Err(AuthError::unsupported_response_type(
                request.response_type.clone(),
            ));
        }

        let token = session_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::unauthenticated("No session cookie"))?;
        let session = self
            .config
            .retry
            .run("session.find", || self.sessions.find(token))
            .await?
            .ok_or_else(|| AuthError::unauthenticated("Session unknown or expired"))?;

        let code = AuthorizationCode::issue(
            &client.client_id,
            &client.redirect_uri,
            &session.subject,
            &request.scope,
            request.state().map(str::to_string),
            self.config.code_lifetime,
        );
        self.config
            .retry
            .run("code.create", || self.codes.create(&code))
            .await?;

        let redirect_url = AuthorizationResponse::new(code.code.clone(), code.state.clone())
            .to_redirect_url(&client.redirect_uri)
            .map_err(|e| AuthError::internal(format!("Registered redirect_uri is invalid: {e}")))?;

        tracing::info!(
            client_id = %client.client_id,
            subject = %session.subject,
            "Authorization code issued"
        );

        Ok(IssuedCode { code, redirect_url })
    }
}
