//! In-process stores backed by `DashMap`.
//!
//! Suitable for a single provider instance and for tests. Code consumption is
//! atomic because the check-and-set happens while holding the shard write lock
//! returned by `DashMap::get_mut`.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;

use super::{
    AuthorizationCodeStorage, ClientStorage, Consumption, LoginSessionStorage, UserStorage,
};
use crate::AuthResult;
use crate::oauth::code::AuthorizationCode;
use crate::oauth::login_session::LoginSession;
use crate::types::{RegisteredClient, UserAccount};

/// Client registry held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryClientStorage {
    clients: Arc<DashMap<String, RegisteredClient>>,
}

impl MemoryClientStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a fixed set of clients.
    #[must_use]
    pub fn with_clients(clients: impl IntoIterator<Item = RegisteredClient>) -> Self {
        let storage = Self::new();
        for client in clients {
            storage.clients.insert(client.client_id.clone(), client);
        }
        storage
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl ClientStorage for MemoryClientStorage {
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<RegisteredClient>> {
        Ok(self.clients.get(client_id).map(|c| c.clone()))
    }

    async fn register(&self, client: RegisteredClient) -> AuthResult<()> {
        self.clients.insert(client.client_id.clone(), client);
        Ok(())
    }
}

/// User accounts held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStorage {
    users: Arc<DashMap<String, UserAccount>>,
}

impl MemoryUserStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = UserAccount>) -> Self {
        let storage = Self::new();
        for user in users {
            storage.users.insert(user.username.clone(), user);
        }
        storage
    }
}

#[async_trait]
impl UserStorage for MemoryUserStorage {
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserAccount>> {
        Ok(self.users.get(username).map(|u| u.clone()))
    }

    async fn register(&self, user: UserAccount) -> AuthResult<()> {
        self.users.insert(user.username.clone(), user);
        Ok(())
    }
}

/// Login sessions held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    sessions: Arc<DashMap<String, LoginSession>>,
}

impl MemorySessionStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl LoginSessionStorage for MemorySessionStorage {
    async fn create(&self, session: &LoginSession) -> AuthResult<()> {
        self.sessions
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn find(&self, session_id: &str) -> AuthResult<Option<LoginSession>> {
        let Some(session) = self.sessions.get(session_id).map(|s| s.clone()) else {
            return Ok(None);
        };
        if session.is_expired() {
            self.sessions.remove(session_id);
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn delete(&self, session_id: &str) -> AuthResult<()> {
        self.sessions.remove(session_id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now = OffsetDateTime::now_utc();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before.saturating_sub(self.sessions.len())) as u64)
    }
}

/// Authorization codes held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCodeStorage {
    codes: Arc<DashMap<String, AuthorizationCode>>,
}

impl MemoryCodeStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored codes, expired and consumed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[async_trait]
impl AuthorizationCodeStorage for MemoryCodeStorage {
    async fn create(&self, code: &AuthorizationCode) -> AuthResult<()> {
        self.codes.insert(code.code.clone(), code.clone());
        Ok(())
    }

    async fn find(&self, code: &str) -> AuthResult<Option<AuthorizationCode>> {
        Ok(self
            .codes
            .get(code)
            .filter(|c| !c.is_expired())
            .map(|c| c.clone()))
    }

    async fn consume(&self, code: &str) -> AuthResult<Consumption> {
        let Some(mut entry) = self.codes.get_mut(code) else {
            return Ok(Consumption::NotFound);
        };
        let now = OffsetDateTime::now_utc();
        if entry.is_expired_at(now) {
            return Ok(Consumption::NotFound);
        }
        if entry.is_consumed() {
            return Ok(Consumption::AlreadyConsumed);
        }
        entry.consumed_at = Some(now);
        Ok(Consumption::Redeemed(entry.clone()))
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now = OffsetDateTime::now_utc();
        let before = self.codes.len();
        self.codes.retain(|_, c| !c.is_expired_at(now));
        Ok((before.saturating_sub(self.codes.len())) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::hash_secret;
    use crate::types::ClientSecret;
    use time::Duration;

    fn code(lifetime: Duration) -> AuthorizationCode {
        AuthorizationCode::issue(
            "app1",
            "http://localhost:3001/callback",
            "john.doe",
            "openid",
            None,
            lifetime,
        )
    }

    #[tokio::test]
    async fn test_client_lookup() {
        let storage = MemoryClientStorage::with_clients([RegisteredClient::new(
            "app1",
            ClientSecret::Plain("app1_secret".to_string()),
            "http://localhost:3001/callback",
        )]);
        assert_eq!(storage.len(), 1);
        assert!(storage.find_by_client_id("app1").await.unwrap().is_some());
        assert!(storage.find_by_client_id("app2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_verify_password() {
        let storage = MemoryUserStorage::with_users([UserAccount {
            username: "john.doe".to_string(),
            full_name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            password_hash: hash_secret("password123").unwrap(),
            active: true,
        }]);

        let user = storage
            .verify_password("john.doe", "password123")
            .await
            .unwrap();
        assert_eq!(user.map(|u| u.email), Some("john@example.com".to_string()));
        assert!(
            storage
                .verify_password("john.doe", "wrong")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            storage
                .verify_password("nobody", "password123")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_log_in() {
        let storage = MemoryUserStorage::with_users([UserAccount {
            username: "jane".to_string(),
            full_name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: hash_secret("pw").unwrap(),
            active: false,
        }]);
        assert!(storage.verify_password("jane", "pw").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let storage = MemorySessionStorage::new();
        let session = LoginSession::start("john.doe", Duration::hours(1));
        storage.create(&session).await.unwrap();

        let found = storage.find(&session.session_id).await.unwrap();
        assert_eq!(found, Some(session.clone()));

        storage.delete(&session.session_id).await.unwrap();
        assert!(storage.find(&session.session_id).await.unwrap().is_none());
        storage.delete(&session.session_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_is_absent() {
        let storage = MemorySessionStorage::new();
        let mut session = LoginSession::start("john.doe", Duration::hours(1));
        session.expires_at = OffsetDateTime::now_utc() - Duration::seconds(1);
        storage.create(&session).await.unwrap();
        assert!(storage.find(&session.session_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_consume_once() {
        let storage = MemoryCodeStorage::new();
        let c = code(Duration::minutes(5));
        storage.create(&c).await.unwrap();

        match storage.consume(&c.code).await.unwrap() {
            Consumption::Redeemed(redeemed) => {
                assert_eq!(redeemed.subject, "john.doe");
                assert!(redeemed.is_consumed());
            }
            other => panic!("expected Redeemed, got {other:?}"),
        }
        assert_eq!(
            storage.consume(&c.code).await.unwrap(),
            Consumption::AlreadyConsumed
        );
        assert!(storage.find(&c.code).await.unwrap().unwrap().is_consumed());
    }

    #[tokio::test]
    async fn test_consume_unknown_and_expired() {
        let storage = MemoryCodeStorage::new();
        assert_eq!(
            storage.consume("nope").await.unwrap(),
            Consumption::NotFound
        );

        let mut expired = code(Duration::seconds(60));
        expired.issued_at -= Duration::seconds(61);
        expired.expires_at -= Duration::seconds(61);
        storage.create(&expired).await.unwrap();
        assert!(storage.find(&expired.code).await.unwrap().is_none());
        assert_eq!(
            storage.consume(&expired.code).await.unwrap(),
            Consumption::NotFound
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_consume_has_single_winner() {
        let storage = Arc::new(MemoryCodeStorage::new());
        let c = code(Duration::minutes(5));
        storage.create(&c).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let storage = Arc::clone(&storage);
                let code = c.code.clone();
                tokio::spawn(async move { storage.consume(&code).await.unwrap() })
            })
            .collect();

        let mut redeemed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Consumption::Redeemed(_) => redeemed += 1,
                Consumption::AlreadyConsumed => {}
                Consumption::NotFound => panic!("code vanished"),
            }
        }
        assert_eq!(redeemed, 1);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let codes = MemoryCodeStorage::new();
        let live = code(Duration::minutes(5));
        let mut dead = code(Duration::minutes(5));
        dead.expires_at = OffsetDateTime::now_utc() - Duration::seconds(1);
        codes.create(&live).await.unwrap();
        codes.create(&dead).await.unwrap();

        assert_eq!(codes.cleanup_expired().await.unwrap(), 1);
        assert_eq!(codes.len(), 1);

        let sessions = MemorySessionStorage::new();
        let mut old = LoginSession::start("a", Duration::hours(1));
        old.expires_at = OffsetDateTime::now_utc() - Duration::seconds(1);
        sessions.create(&old).await.unwrap();
        sessions
            .create(&LoginSession::start("b", Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(sessions.cleanup_expired().await.unwrap(), 1);
        assert_eq!(sessions.len(), 1);
    }
}
