//! Registered client applications.

use serde::{Deserialize, Serialize};

use crate::secret::{constant_time_eq, verify_secret};

/// How a client's secret is held by the registry.
///
/// `Hashed` is preferred. `Plain` exists for relying applications that need the
/// provider to hold a reversible secret; it is still compared in constant time.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ClientSecret {
    /// Argon2id PHC string.
    Hashed(String),
    /// Reversible secret.
    Plain(String),
}

impl ClientSecret {
    /// Returns `true` if `presented` matches this secret.
    ///
    /// A malformed stored hash counts as a mismatch.
    #[must_use]
    pub fn matches(&self, presented: &str) -> bool {
        match self {
            Self::Hashed(hash) => verify_secret(presented, hash).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Stored client secret hash is malformed");
                false
            }),
            Self::Plain(secret) => constant_time_eq(secret, presented),
        }
    }
}

impl std::fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hashed(_) => f.write_str("ClientSecret::Hashed(..)"),
            Self::Plain(_) => f.write_str("ClientSecret::Plain(..)"),
        }
    }
}

/// A client application registered with the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredClient {
    /// Unique client identifier.
    pub client_id: String,

    /// Human-readable display name.
    pub name: String,

    /// Client credential.
    pub secret: ClientSecret,

    /// The single redirect URI accepted for this client. Compared by exact
    /// string equality.
    pub redirect_uri: String,

    /// Inactive clients are treated as unknown.
    pub active: bool,
}

impl RegisteredClient {
    /// Creates an active client.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        secret: ClientSecret,
        redirect_uri: impl Into<String>,
    ) -> Self {
        let client_id = client_id.into();
        Self {
            name: client_id.clone(),
            client_id,
            secret,
            redirect_uri: redirect_uri.into(),
            active: true,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Exact, byte-for-byte comparison against the registered redirect URI.
    /// No normalization: trailing slashes, case and query strings all matter.
    #[must_use]
    pub fn redirect_uri_matches(&self, candidate: &str) -> bool {
        self.redirect_uri == candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::hash_secret;

    #[test]
    fn test_plain_secret_matches() {
        let secret = ClientSecret::Plain("app1_secret".to_string());
        assert!(secret.matches("app1_secret"));
        assert!(!secret.matches("app2_secret"));
    }

    #[test]
    fn test_hashed_secret_matches() {
        let secret = ClientSecret::Hashed(hash_secret("app1_secret").unwrap());
        assert!(secret.matches("app1_secret"));
        assert!(!secret.matches("app1_secret "));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        let secret = ClientSecret::Hashed("garbage".to_string());
        assert!(!secret.matches("garbage"));
    }

    #[test]
    fn test_debug_hides_secret() {
        let secret = ClientSecret::Plain("app1_secret".to_string());
        assert!(!format!("{secret:?}").contains("app1_secret"));
    }

    #[test]
    fn test_redirect_uri_exact_match() {
        let client = RegisteredClient::new(
            "app1",
            ClientSecret::Plain("s".to_string()),
            "http://localhost:3001/callback",
        );
        assert!(client.redirect_uri_matches("http://localhost:3001/callback"));
        assert!(!client.redirect_uri_matches("http://localhost:3001/callback/"));
        assert!(!client.redirect_uri_matches("http://LOCALHOST:3001/callback"));
        assert!(!client.redirect_uri_matches("http://localhost:3001/callback?x=1"));
        assert!(client.active);
        assert_eq!(client.name, "app1");
    }
}
