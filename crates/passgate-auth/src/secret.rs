//! Secret generation, hashing, and comparison.
//!
//! Client secrets and user passwords are stored as Argon2id PHC strings.
//! Plain client secrets (kept for relying applications that were registered
//! with a reversible secret) are compared over their SHA-256 digests so the
//! comparison time does not depend on where the inputs differ.
//!
//! ```
//! use passgate_auth::secret::{generate_client_secret, hash_secret, verify_secret};
//!
//! let secret = generate_client_secret();
//! let hash = hash_secret(&secret).unwrap();
//! assert!(verify_secret(&secret, &hash).unwrap());
//! ```

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a new client secret.
///
/// Format: `pgs_{64 hex characters}` (256 bits of randomness).
pub fn generate_client_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    format!("pgs_{}", hex::encode(bytes))
}

/// Hash a secret or password for storage using Argon2id.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
pub fn hash_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a secret against a stored Argon2 PHC hash.
///
/// Returns `Ok(false)` on mismatch; `Err` only when the stored hash is malformed.
pub fn verify_secret(secret: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(secret.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}

/// Argon2 hash of a throwaway value, verified against when there is no real
/// hash to check so that failures cost one Argon2 verification either way.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_secret("passgate-dummy-client-secret").ok());

/// Runs one Argon2 verification whose outcome is discarded.
pub fn dummy_verify(secret: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_secret(secret, hash);
    }
}

/// Returns `true` if `hash` looks like an Argon2 PHC string.
#[must_use]
pub fn is_argon2_hash(hash: &str) -> bool {
    hash.starts_with("$argon2")
}

/// Compare two secrets without short-circuiting on the first differing byte.
///
/// Both inputs are hashed first so differing lengths do not leak either.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let da = Sha256::digest(a.as_bytes());
    let db = Sha256::digest(b.as_bytes());
    da.iter()
        .zip(db.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_client_secret_format() {
        let secret = generate_client_secret();
        assert!(secret.starts_with("pgs_"));
        assert_eq!(secret.len(), 68);
        assert!(secret[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_client_secret_unique() {
        assert_ne!(generate_client_secret(), generate_client_secret());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_secret("password123").unwrap();
        assert!(is_argon2_hash(&hash));
        assert!(verify_secret("password123", &hash).unwrap());
        assert!(!verify_secret("password124", &hash).unwrap());
    }

    #[test]
    fn test_verify_malformed_hash() {
        assert!(verify_secret("x", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_dummy_hash_is_usable() {
        let hash = DUMMY_HASH.as_deref().unwrap();
        assert!(is_argon2_hash(hash));
        assert!(!verify_secret("app1_secret", hash).unwrap());
        dummy_verify("app1_secret");
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("app1_secret", "app1_secret"));
        assert!(!constant_time_eq("app1_secret", "app1_secreT"));
        assert!(!constant_time_eq("app1_secret", "app1"));
        assert!(constant_time_eq("", ""));
    }
}
