//! Storage traits for the authorization-code flow.
//!
//! This module defines storage interfaces for:
//!
//! - registered clients
//! - user accounts
//! - provider login sessions
//! - authorization codes
//!
//! # Implementations
//!
//! - [`memory`] - `DashMap`-backed stores for single-instance deployments
//! - [`redis`] - shared session and code stores for multi-instance deployments

pub mod cleanup;
pub mod memory;
pub mod redis;
pub mod retry;

use async_trait::async_trait;

use crate::{AuthError, AuthResult};
use crate::oauth::code::AuthorizationCode;
use crate::oauth::login_session::LoginSession;
use crate::types::{RegisteredClient, UserAccount};

pub use self::memory::{MemoryClientStorage, MemoryCodeStorage, MemorySessionStorage, MemoryUserStorage};
pub use self::redis::{RedisCodeStorage, RedisSessionStorage};
pub use self::retry::RetryPolicy;

/// Read access to registered client applications.
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Finds a client by its identifier.
    ///
    /// Returns `Ok(None)` if no such client is registered. Inactive clients are
    /// returned as-is; callers decide what inactivity means.
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<RegisteredClient>>;

    /// Registers or replaces a client.
    async fn register(&self, client: RegisteredClient) -> AuthResult<()>;
}

/// Read access to user accounts.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Finds a user by username.
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserAccount>>;

    /// Registers or replaces a user.
    async fn register(&self, user: UserAccount) -> AuthResult<()>;

    /// Verifies a password for the given username.
    ///
    /// Returns the account on success. Unknown users, inactive users and wrong
    /// passwords all yield `Ok(None)`.
    async fn verify_password(
        &self,
        username: &str,
        password: &str,
    ) -> AuthResult<Option<UserAccount>> {
        let Some(user) = self.find_by_username(username).await? else {
            return Ok(None);
        };
        if !user.active {
            return Ok(None);
        }
        let ok = crate::secret::verify_secret(password, &user.password_hash)
            .map_err(|e| AuthError::internal(format!("Stored password hash is malformed: {e}")))?;
        Ok(ok.then_some(user))
    }
}

/// Provider login sessions, keyed by session token.
///
/// Expired sessions behave as absent.
#[async_trait]
pub trait LoginSessionStorage: Send + Sync {
    /// Stores a new session.
    async fn create(&self, session: &LoginSession) -> AuthResult<()>;

    /// Finds a live session by its token.
    async fn find(&self, session_id: &str) -> AuthResult<Option<LoginSession>>;

    /// Removes a session. Removing an unknown session is not an error.
    async fn delete(&self, session_id: &str) -> AuthResult<()>;

    /// Drops expired sessions and returns how many were removed.
    async fn cleanup_expired(&self) -> AuthResult<u64>;
}

/// Outcome of an attempt to redeem an authorization code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consumption {
    /// This caller redeemed the code. The returned value has `consumed_at` set.
    Redeemed(AuthorizationCode),
    /// Unknown or expired code.
    NotFound,
    /// Someone already redeemed this code.
    AlreadyConsumed,
}

/// Single-use authorization codes.
///
/// # Security
///
/// - Never log authorization codes
/// - `consume` must be linearizable: of any number of concurrent calls for the
///   same code, exactly one returns [`Consumption::Redeemed`]
#[async_trait]
pub trait AuthorizationCodeStorage: Send + Sync {
    /// Stores a freshly issued code.
    async fn create(&self, code: &AuthorizationCode) -> AuthResult<()>;

    /// Looks up a live code without consuming it.
    ///
    /// Expired codes are reported as `None`; consumed codes are returned with
    /// `consumed_at` set.
    async fn find(&self, code: &str) -> AuthResult<Option<AuthorizationCode>>;

    /// Atomically marks the code consumed.
    async fn consume(&self, code: &str) -> AuthResult<Consumption>;

    /// Drops expired codes and returns how many were removed.
    async fn cleanup_expired(&self) -> AuthResult<u64>;
}
