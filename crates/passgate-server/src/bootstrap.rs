//! Startup wiring: stores, bootstrap clients and users, signing key.
//!
//! Clients and users come from the `[[clients]]` and `[[users]]` sections and
//! live in memory. Sessions and authorization codes go to the configured
//! backend so several replicas can share them.

use std::sync::Arc;

use anyhow::Context;
use passgate_auth::config::{SigningConfig, StorageBackend, StorageConfig};
use passgate_auth::secret::{hash_secret, is_argon2_hash};
use passgate_auth::storage::redis::create_pool;
use passgate_auth::storage::{
    AuthorizationCodeStorage, ClientStorage, LoginSessionStorage, MemoryClientStorage,
    MemoryCodeStorage, MemorySessionStorage, MemoryUserStorage, RedisCodeStorage,
    RedisSessionStorage, UserStorage,
};
use passgate_auth::token::{SigningAlgorithm, SigningKey};
use passgate_auth::types::{ClientSecret, RegisteredClient, UserAccount};
use tracing::{info, warn};

use crate::config::{ClientEntry, UserEntry};

/// The four stores the provider runs on.
#[derive(Clone)]
pub struct Stores {
    pub clients: Arc<dyn ClientStorage>,
    pub users: Arc<dyn UserStorage>,
    pub sessions: Arc<dyn LoginSessionStorage>,
    pub codes: Arc<dyn AuthorizationCodeStorage>,
}

/// Builds the stores and seeds them from configuration.
///
/// # Errors
///
/// Returns an error if a password cannot be hashed, a configured hash is
/// malformed, or Redis is selected and unreachable.
pub async fn build_stores(
    storage: &StorageConfig,
    clients: &[ClientEntry],
    users: &[UserEntry],
) -> anyhow::Result<Stores> {
    let registered = clients
        .iter()
        .map(registered_client)
        .collect::<anyhow::Result<Vec<_>>>()?;
    let accounts = users
        .iter()
        .map(user_account)
        .collect::<anyhow::Result<Vec<_>>>()?;

    info!(
        clients = registered.len(),
        users = accounts.len(),
        "Loaded bootstrap registrations"
    );

    let (sessions, codes): (Arc<dyn LoginSessionStorage>, Arc<dyn AuthorizationCodeStorage>) =
        match storage.backend {
            StorageBackend::Memory => {
                info!("Using in-memory session and code stores");
                (
                    Arc::new(MemorySessionStorage::new()),
                    Arc::new(MemoryCodeStorage::new()),
                )
            }
            StorageBackend::Redis => {
                let pool = create_pool(&storage.redis)
                    .await
                    .context("Redis store initialization failed")?;
                let prefix = storage.redis.key_prefix.clone();
                info!(prefix = %prefix, "Using Redis session and code stores");
                (
                    Arc::new(RedisSessionStorage::new(pool.clone(), prefix.clone())),
                    Arc::new(RedisCodeStorage::new(pool, prefix)),
                )
            }
        };

    Ok(Stores {
        clients: Arc::new(MemoryClientStorage::with_clients(registered)),
        users: Arc::new(MemoryUserStorage::with_users(accounts)),
        sessions,
        codes,
    })
}

fn registered_client(entry: &ClientEntry) -> anyhow::Result<RegisteredClient> {
    let secret = match (&entry.client_secret, &entry.client_secret_hash) {
        (_, Some(hash)) => {
            anyhow::ensure!(
                is_argon2_hash(hash),
                "clients.{}: client_secret_hash is not an Argon2 PHC string",
                entry.client_id
            );
            ClientSecret::Hashed(hash.clone())
        }
        (Some(plain), None) => ClientSecret::Plain(plain.clone()),
        (None, None) => anyhow::bail!("clients.{}: no secret configured", entry.client_id),
    };

    let mut client = RegisteredClient::new(&entry.client_id, secret, &entry.redirect_uri);
    if let Some(ref name) = entry.name {
        client = client.with_name(name);
    }
    client.active = entry.active;
    Ok(client)
}

fn user_account(entry: &UserEntry) -> anyhow::Result<UserAccount> {
    let password_hash = match (&entry.password, &entry.password_hash) {
        (_, Some(hash)) => {
            anyhow::ensure!(
                is_argon2_hash(hash),
                "users.{}: password_hash is not an Argon2 PHC string",
                entry.username
            );
            hash.clone()
        }
        (Some(password), None) => hash_secret(password)
            .map_err(|e| anyhow::anyhow!("users.{}: failed to hash password: {e}", entry.username))?,
        (None, None) => anyhow::bail!("users.{}: no password configured", entry.username),
    };

    Ok(UserAccount {
        username: entry.username.clone(),
        full_name: entry.full_name.clone(),
        email: entry.email.clone(),
        password_hash,
        active: entry.active,
    })
}

/// Loads the token signing key.
///
/// RSA algorithms without `private_key_path` get a fresh key pair; tokens
/// signed with it stop verifying after a restart.
///
/// # Errors
///
/// Returns an error for unknown algorithms, a missing HS256 secret, or an
/// unreadable or invalid PEM file.
pub fn load_signing_key(config: &SigningConfig) -> anyhow::Result<SigningKey> {
    let algorithm: SigningAlgorithm = config
        .algorithm
        .parse()
        .map_err(|e| anyhow::anyhow!("auth.signing.algorithm: {e}"))?;

    let key = match algorithm {
        SigningAlgorithm::HS256 => {
            let secret = config
                .secret
                .as_deref()
                .filter(|s| !s.is_empty())
                .context("auth.signing.secret is required for HS256")?;
            SigningKey::hmac(secret.as_bytes(), config.key_id.clone())?
        }
        _ => match config.private_key_path {
            Some(ref path) => {
                let pem = std::fs::read_to_string(path).with_context(|| {
                    format!("failed to read signing key {}", path.display())
                })?;
                let kid = config.key_id.clone().unwrap_or_else(|| "passgate-1".into());
                SigningKey::from_rsa_pem(kid, algorithm, &pem)?
            }
            None => {
                warn!(
                    algorithm = %algorithm,
                    "No auth.signing.private_key_path configured, generating an ephemeral key"
                );
                SigningKey::generate_rsa(algorithm)?
            }
        },
    };

    info!(algorithm = %algorithm, kid = ?key.kid(), "Signing key loaded");
    Ok(key)
}
