//! Redis-backed session and code stores.
//!
//! Values are stored as JSON under `{prefix}:session:{id}` and
//! `{prefix}:code:{code}` with a Redis TTL equal to the remaining lifetime, so
//! Redis evicts them on its own. Code consumption is linearized with
//! `SET {prefix}:code:{code}:consumed <unix-time> NX EX <ttl>`: only the caller whose
//! `SET` succeeds redeems the code, regardless of how many provider instances
//! race for it.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Pool, Runtime};
use redis::AsyncCommands;
use time::OffsetDateTime;

use super::{AuthorizationCodeStorage, Consumption, LoginSessionStorage};
use crate::config::RedisConfig;
use crate::oauth::code::AuthorizationCode;
use crate::oauth::login_session::LoginSession;
use crate::{AuthError, AuthResult};

/// Creates a connection pool and checks that Redis answers.
///
/// # Errors
///
/// Returns `AuthError::Storage` if the pool cannot be built or no connection
/// can be obtained within the configured timeout.
pub async fn create_pool(config: &RedisConfig) -> AuthResult<Pool> {
    tracing::info!(url = %config.url, "Connecting to Redis");

    let mut redis_config = deadpool_redis::Config::from_url(&config.url);
    if let Some(ref mut pool_config) = redis_config.pool {
        pool_config.max_size = config.pool_size;
        pool_config.timeouts.wait = Some(Duration::from_millis(config.timeout_ms));
        pool_config.timeouts.create = Some(Duration::from_millis(config.timeout_ms));
        pool_config.timeouts.recycle = Some(Duration::from_millis(config.timeout_ms));
    } else {
        let mut pool_config = deadpool_redis::PoolConfig::new(config.pool_size);
        pool_config.timeouts.wait = Some(Duration::from_millis(config.timeout_ms));
        pool_config.timeouts.create = Some(Duration::from_millis(config.timeout_ms));
        pool_config.timeouts.recycle = Some(Duration::from_millis(config.timeout_ms));
        redis_config.pool = Some(pool_config);
    }

    let pool = redis_config
        .create_pool(Some(Runtime::Tokio1))
        .map_err(|e| AuthError::storage(format!("Failed to create Redis pool: {e}")))?;

    pool.get()
        .await
        .map_err(|e| AuthError::storage(format!("Failed to connect to Redis: {e}")))?;

    tracing::info!("Connected to Redis");
    Ok(pool)
}

fn storage_err(e: impl std::fmt::Display) -> AuthError {
    AuthError::storage(e.to_string())
}

/// Seconds until `expires_at`, at least 1 so Redis accepts the TTL.
fn ttl_seconds(expires_at: OffsetDateTime) -> u64 {
    let remaining = (expires_at - OffsetDateTime::now_utc()).whole_seconds();
    remaining.max(1) as u64
}

async fn connection(pool: &Pool) -> AuthResult<deadpool_redis::Connection> {
    pool.get().await.map_err(storage_err)
}

/// Login sessions in Redis.
#[derive(Clone)]
pub struct RedisSessionStorage {
    pool: Pool,
    prefix: String,
}

impl RedisSessionStorage {
    #[must_use]
    pub fn new(pool: Pool, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            prefix: prefix.into(),
        }
    }

    fn key(&self, session_id: &str) -> String {
        format!("{}:session:{}", self.prefix, session_id)
    }
}

#[async_trait]
impl LoginSessionStorage for RedisSessionStorage {
    async fn create(&self, session: &LoginSession) -> AuthResult<()> {
        let value = serde_json::to_string(session).map_err(storage_err)?;
        let mut conn = connection(&self.pool).await?;
        let _: () = conn
            .set_ex(
                self.key(&session.session_id),
                value,
                ttl_seconds(session.expires_at),
            )
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn find(&self, session_id: &str) -> AuthResult<Option<LoginSession>> {
        let mut conn = connection(&self.pool).await?;
        let raw: Option<String> = conn.get(self.key(session_id)).await.map_err(storage_err)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let session: LoginSession = serde_json::from_str(&raw).map_err(storage_err)?;
        // Redis TTL has second granularity; the record's own expiry is authoritative.
        Ok((!session.is_expired()).then_some(session))
    }

    async fn delete(&self, session_id: &str) -> AuthResult<()> {
        let mut conn = connection(&self.pool).await?;
        let _: () = conn.del(self.key(session_id)).await.map_err(storage_err)?;
        Ok(())
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        // Redis expires keys itself.
        Ok(0)
    }
}

/// Authorization codes in Redis.
#[derive(Clone)]
pub struct RedisCodeStorage {
    pool: Pool,
    prefix: String,
}

impl RedisCodeStorage {
    #[must_use]
    pub fn new(pool: Pool, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            prefix: prefix.into(),
        }
    }

    fn key(&self, code: &str) -> String {
        format!("{}:code:{}", self.prefix, code)
    }

    fn consumed_key(&self, code: &str) -> String {
        format!("{}:code:{}:consumed", self.prefix, code)
    }

    async fn load(
        &self,
        conn: &mut deadpool_redis::Connection,
        code: &str,
    ) -> AuthResult<Option<AuthorizationCode>> {
        let raw: Option<String> = conn.get(self.key(code)).await.map_err(storage_err)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let stored: AuthorizationCode = serde_json::from_str(&raw).map_err(storage_err)?;
        Ok((!stored.is_expired()).then_some(stored))
    }
}

#[async_trait]
impl AuthorizationCodeStorage for RedisCodeStorage {
    async fn create(&self, code: &AuthorizationCode) -> AuthResult<()> {
        let value = serde_json::to_string(code).map_err(storage_err)?;
        let mut conn = connection(&self.pool).await?;
        let _: () = conn
            .set_ex(self.key(&code.code), value, ttl_seconds(code.expires_at))
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn find(&self, code: &str) -> AuthResult<Option<AuthorizationCode>> {
        let mut conn = connection(&self.pool).await?;
        let Some(mut stored) = self.load(&mut conn, code).await? else {
            return Ok(None);
        };
        let consumed_at: Option<i64> = conn
            .get(self.consumed_key(code))
            .await
            .map_err(storage_err)?;
        if let Some(ts) = consumed_at {
            stored.consumed_at = Some(
                OffsetDateTime::from_unix_timestamp(ts).unwrap_or_else(|_| OffsetDateTime::now_utc()),
            );
        }
        Ok(Some(stored))
    }

    async fn consume(&self, code: &str) -> AuthResult<Consumption> {
        let mut conn = connection(&self.pool).await?;
        let Some(mut stored) = self.load(&mut conn, code).await? else {
            return Ok(Consumption::NotFound);
        };

        let now = OffsetDateTime::now_utc();
        let won: Option<String> = redis::cmd("SET")
            .arg(self.consumed_key(code))
            .arg(now.unix_timestamp())
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds(stored.expires_at))
            .query_async(&mut conn)
            .await
            .map_err(storage_err)?;

        if won.is_none() {
            return Ok(Consumption::AlreadyConsumed);
        }
        stored.consumed_at = Some(now);
        Ok(Consumption::Redeemed(stored))
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration as TimeDuration;

    /// Returns a pool when `PASSGATE_TEST_REDIS_URL` is set.
    async fn test_pool() -> Option<Pool> {
        let url = std::env::var("PASSGATE_TEST_REDIS_URL").ok()?;
        let config = RedisConfig {
            url,
            ..RedisConfig::default()
        };
        Some(create_pool(&config).await.unwrap())
    }

    fn prefix() -> String {
        format!("passgate-test-{}", uuid::Uuid::new_v4())
    }

    #[test]
    fn test_ttl_seconds_never_zero() {
        let past = OffsetDateTime::now_utc() - TimeDuration::seconds(10);
        assert_eq!(ttl_seconds(past), 1);
        let future = OffsetDateTime::now_utc() + TimeDuration::seconds(120);
        assert!((118..=120).contains(&ttl_seconds(future)));
    }

    #[tokio::test]
    async fn test_redis_code_consumed_once() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let storage = RedisCodeStorage::new(pool, prefix());
        let code = AuthorizationCode::issue(
            "app1",
            "http://localhost:3001/callback",
            "john.doe",
            "openid",
            None,
            TimeDuration::minutes(5),
        );
        storage.create(&code).await.unwrap();

        assert!(matches!(
            storage.consume(&code.code).await.unwrap(),
            Consumption::Redeemed(_)
        ));
        assert_eq!(
            storage.consume(&code.code).await.unwrap(),
            Consumption::AlreadyConsumed
        );
        assert!(storage.find(&code.code).await.unwrap().unwrap().is_consumed());
        assert_eq!(
            storage.consume("missing").await.unwrap(),
            Consumption::NotFound
        );
    }

    #[tokio::test]
    async fn test_redis_concurrent_consume() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let storage = RedisCodeStorage::new(pool, prefix());
        let code = AuthorizationCode::issue(
            "app1",
            "http://localhost:3001/callback",
            "john.doe",
            "openid",
            None,
            TimeDuration::minutes(5),
        );
        storage.create(&code).await.unwrap();

        let results = consume_concurrently(&storage, &code.code, 8).await;
        let redeemed = results
            .iter()
            .filter(|r| matches!(r, Consumption::Redeemed(_)))
            .count();
        assert_eq!(redeemed, 1);
    }

    async fn consume_concurrently(storage: &RedisCodeStorage, code: &str, n: usize) -> Vec<Consumption> {
        let handles: Vec<_> = (0..n)
            .map(|_| {
                let storage = storage.clone();
                let code = code.to_string();
                tokio::spawn(async move { storage.consume(&code).await.unwrap() })
            })
            .collect();
        let mut out = Vec::with_capacity(n);
        for h in handles {
            out.push(h.await.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_redis_session_lifecycle() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let storage = RedisSessionStorage::new(pool, prefix());
        let session = LoginSession::start("john.doe", TimeDuration::hours(1));
        storage.create(&session).await.unwrap();
        assert_eq!(
            storage.find(&session.session_id).await.unwrap(),
            Some(session.clone())
        );
        storage.delete(&session.session_id).await.unwrap();
        assert!(storage.find(&session.session_id).await.unwrap().is_none());
    }
}
