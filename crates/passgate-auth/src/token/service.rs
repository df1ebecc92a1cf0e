//! Authorization code redemption.
//!
//! [`TokenService::exchange_code`] implements `POST /token` for the
//! `authorization_code` grant:
//!
//! 1. authenticate the client
//! 2. check `grant_type` and required parameters
//! 3. look up the code; unknown, expired or consumed codes are rejected
//! 4. check the code's `client_id` and `redirect_uri` binding
//! 5. consume the code atomically
//! 6. sign an access token for the code's subject
//!
//! Tokens and codes are never logged.

use std::sync::Arc;

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::client_auth::{ClientCredentials, authenticate_client};
use crate::oauth::token::{TokenRequest, TokenResponse};
use crate::storage::{AuthorizationCodeStorage, ClientStorage, Consumption, RetryPolicy, UserStorage};
use crate::token::jwt::TokenIssuer;

/// Redeems authorization codes for access tokens.
pub struct TokenService {
    clients: Arc<dyn ClientStorage>,
    users: Arc<dyn UserStorage>,
    codes: Arc<dyn AuthorizationCodeStorage>,
    issuer: Arc<TokenIssuer>,
    retry: RetryPolicy,
}

impl TokenService {
    #[must_use]
    pub fn new(
        clients: Arc<dyn ClientStorage>,
        users: Arc<dyn UserStorage>,
        codes: Arc<dyn AuthorizationCodeStorage>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            clients,
            users,
            codes,
            issuer,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Exchanges an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// - `InvalidClient` if client authentication fails
    /// - `UnsupportedGrantType` unless `grant_type=authorization_code`
    /// - `InvalidRequest` if `code` or `redirect_uri` is missing
    /// - `InvalidGrant` if the code is unknown, expired, consumed, or bound
    ///   to another client or redirect URI
    /// - `SigningFailure` if the token cannot be signed
    pub async fn exchange_code(
        &self,
        request: &TokenRequest,
        credentials: &ClientCredentials,
    ) -> AuthResult<TokenResponse> {
        let client = authenticate_client(self.clients.as_ref(), credentials).await?;

        if request.grant_type != "authorization_code" {
            return Err(AuthError::unsupported_grant_type(request.grant_type.clone()));
        }

        let code = request
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthError::invalid_request("Missing code parameter"))?;
        let redirect_uri = request
            .redirect_uri
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AuthError::invalid_request("Missing redirect_uri parameter"))?;

        let stored = self
            .retry
            .run("code.find", || self.codes.find(code))
            .await?
            .ok_or_else(|| AuthError::invalid_grant("Unknown or expired authorization code"))?;

        if stored.is_consumed() {
            tracing::warn!(client_id = %client.client_id, "Authorization code replayed");
            return Err(AuthError::invalid_grant("Authorization code already used"));
        }
        if stored.client_id != client.client_id {
            tracing::warn!(
                client_id = %client.client_id,
                "Authorization code presented by a different client"
            );
            return Err(AuthError::invalid_grant(
                "Authorization code was issued to a different client",
            ));
        }
        if stored.redirect_uri != redirect_uri {
            return Err(AuthError::invalid_grant(
                "Redirect URI does not match authorization request",
            ));
        }

        // Not retried: a consume that landed before its reply was lost would
        // come back as AlreadyConsumed and reject the rightful redeemer.
        let redeemed = match self.codes.consume(code).await? {
            Consumption::Redeemed(redeemed) => redeemed,
            Consumption::AlreadyConsumed => {
                tracing::warn!(client_id = %client.client_id, "Authorization code lost redemption race");
                return Err(AuthError::invalid_grant("Authorization code already used"));
            }
            Consumption::NotFound => {
                return Err(AuthError::invalid_grant("Authorization code expired"));
            }
        };

        let user = self
            .users
            .find_by_username(&redeemed.subject)
            .await?
            .filter(|u| u.active)
            .ok_or_else(|| AuthError::invalid_grant("Subject no longer exists"))?;

        let issued = self
            .issuer
            .issue(&user.profile(), &client.client_id)
            .map_err(|e| AuthError::signing_failure(e.to_string()))?;

        tracing::info!(
            client_id = %client.client_id,
            subject = %redeemed.subject,
            "Access token issued"
        );

        Ok(TokenResponse::bearer(issued.access_token, issued.expires_in).with_scope(redeemed.scope))
    }

    #[must_use]
    pub fn issuer(&self) -> &Arc<TokenIssuer> {
        &self.issuer
    }
}
