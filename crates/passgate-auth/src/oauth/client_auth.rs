//! Client authentication at the token endpoint.
//!
//! Supported methods:
//!
//! - `client_secret_basic`: HTTP Basic `Authorization` header
//! - `client_secret_post`: `client_id` and `client_secret` in the form body
//!
//! When both are present the header wins.

use percent_encoding::percent_decode_str;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::ClientStorage;
use crate::secret::dummy_verify;
use crate::types::{ClientSecret, RegisteredClient};

/// Credentials presented by a client.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl ClientCredentials {
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Picks credentials from the `Authorization` header or the form body.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClient` if neither source carries a complete pair.
    pub fn extract(
        authorization: Option<&str>,
        body_client_id: Option<&str>,
        body_client_secret: Option<&str>,
    ) -> AuthResult<Self> {
        if let Some((id, secret)) = authorization.and_then(parse_basic_auth) {
            return Ok(Self::new(id, secret));
        }
        match (body_client_id, body_client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() => Ok(Self::new(id, secret)),
            _ => Err(AuthError::invalid_client("Missing client credentials")),
        }
    }
}

/// Authenticates a client against the registry.
///
/// Every outcome runs exactly one Argon2 verification: unknown and inactive
/// clients, and clients holding a plain secret, are checked against a dummy
/// hash as well, so response time does not reveal which client ids exist.
///
/// # Errors
///
/// Returns `InvalidClient` for unknown or inactive clients and for a wrong
/// secret; the three cases are indistinguishable to the caller.
pub async fn authenticate_client(
    clients: &dyn ClientStorage,
    credentials: &ClientCredentials,
) -> AuthResult<RegisteredClient> {
    let client = clients
        .find_by_client_id(&credentials.client_id)
        .await?
        .filter(|c| c.active);

    let outcome = check_secret(client.as_ref(), &credentials.client_secret);
    match client {
        Some(client) if outcome == SecretCheck::Accepted => Ok(client),
        _ => {
            tracing::warn!(client_id = %credentials.client_id, "Client authentication failed");
            Err(AuthError::invalid_client(format!(
                "Authentication failed for {}",
                credentials.client_id
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SecretCheck {
    Accepted,
    Rejected,
    UnknownClient,
}

fn check_secret(client: Option<&RegisteredClient>, presented: &str) -> SecretCheck {
    let Some(client) = client else {
        dummy_verify(presented);
        return SecretCheck::UnknownClient;
    };

    let matched = match client.secret {
        ClientSecret::Hashed(_) => client.secret.matches(presented),
        ClientSecret::Plain(_) => {
            dummy_verify(presented);
            client.secret.matches(presented)
        }
    };
    if matched {
        SecretCheck::Accepted
    } else {
        SecretCheck::Rejected
    }
}

/// Parses an HTTP Basic `Authorization` header value.
///
/// ```ignore
/// let auth_header = "Basic YXBwMTphcHAxX3NlY3JldA==";
/// assert_eq!(parse_basic_auth(auth_header), Some(("app1".into(), "app1_secret".into())));
/// ```
#[must_use]
pub fn parse_basic_auth(header_value: &str) -> Option<(String, String)> {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    let encoded = header_value.trim().strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;

    // Split on first colon (secret may contain colons)
    let (client_id, client_secret) = credentials.split_once(':')?;

    Some((form_decode(client_id)?, form_decode(client_secret)?))
}

/// Reverses `application/x-www-form-urlencoded` encoding of one component.
fn form_decode(value: &str) -> Option<String> {
    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}
