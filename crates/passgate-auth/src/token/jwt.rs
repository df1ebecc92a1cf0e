//! Access token signing and verification.
//!
//! Tokens are JWTs carrying `iss`, `sub`, `aud`, `name`, `email`, `iat`, `exp`
//! and `jti`. Two key families are supported:
//!
//! - **HS256**: shared secret, for deployments where relying applications are
//!   trusted with the key
//! - **RS256 / RS384**: RSA key pair; the public half is published as a JWKS
//!
//! Expiry is checked without leeway: a token is rejected at or after `exp`.
//!
//! ## Example
//!
//! ```ignore
//! use passgate_auth::token::jwt::{SigningKey, TokenIssuer};
//!
//! let key = SigningKey::hmac(b"shared-secret", None)?;
//! let issuer = TokenIssuer::new(key, "https://sso.example.com", time::Duration::minutes(15));
//! let issued = issuer.issue(&profile, "app1")?;
//! let claims = issuer.verifier().verify(&issued.access_token)?;
//! ```

use std::fmt;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::rngs::OsRng;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::AuthError;
use crate::types::UserProfile;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to sign a token.
    #[error("Failed to encode token: {message}")]
    EncodingError { message: String },

    /// The token is malformed or uses an unexpected algorithm.
    #[error("Failed to decode token: {message}")]
    DecodingError { message: String },

    /// The token is at or past its `exp`.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid (issuer, audience, missing claims).
    #[error("Invalid claims: {message}")]
    InvalidClaims { message: String },

    /// Key material could not be generated.
    #[error("Key generation failed: {message}")]
    KeyGenerationError { message: String },

    /// Key material is malformed or unsuitable for the algorithm.
    #[error("Invalid key: {message}")]
    InvalidKey { message: String },
}

impl JwtError {
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn key_generation_error(message: impl Into<String>) -> Self {
        Self::KeyGenerationError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a validation error (token rejected).
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Expired
                | Self::InvalidSignature
                | Self::InvalidClaims { .. }
                | Self::DecodingError { .. }
        )
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => Self::decoding_error(err.to_string()),
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => Self::invalid_claims(err.to_string()),
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Self::invalid_key(err.to_string())
            }
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::TokenExpired,
            JwtError::EncodingError { message } => AuthError::signing_failure(message),
            JwtError::KeyGenerationError { message } | JwtError::InvalidKey { message } => {
                AuthError::configuration(message)
            }
            other => AuthError::invalid_token(other.to_string()),
        }
    }
}

// ============================================================================
// Signing Algorithm
// ============================================================================

/// Supported signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256 over a shared secret.
    HS256,
    /// RSA with SHA-256.
    RS256,
    /// RSA with SHA-384.
    RS384,
}

impl SigningAlgorithm {
    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::RS256 => Algorithm::RS256,
            Self::RS384 => Algorithm::RS384,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
        }
    }

    #[must_use]
    pub fn is_rsa(&self) -> bool {
        matches!(self, Self::RS256 | Self::RS384)
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = JwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Self::HS256),
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            other => Err(JwtError::invalid_key(format!(
                "Unsupported signing algorithm: {other}"
            ))),
        }
    }
}

// ============================================================================
// Claims
// ============================================================================

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Issuer (provider URL).
    pub iss: String,

    /// Subject (username).
    pub sub: String,

    /// Audience (client_id the code was issued to).
    pub aud: String,

    /// Display name.
    pub name: String,

    pub email: String,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration (Unix timestamp).
    pub exp: i64,

    /// Unique token id.
    pub jti: String,
}

impl AccessTokenClaims {
    /// Returns `true` if the token is expired at `now` (no leeway).
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now.unix_timestamp() >= self.exp
    }
}

// ============================================================================
// JWKS Types
// ============================================================================

/// JSON Web Key Set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// A public RSA signing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: String,
    #[serde(rename = "use")]
    pub use_: String,
    pub alg: String,
    pub n: String,
    pub e: String,
}

// ============================================================================
// Signing Key
// ============================================================================

/// Key material used to sign tokens.
///
/// Immutable once built; load or generate it once at startup.
#[derive(Clone)]
pub struct SigningKey {
    kid: Option<String>,
    algorithm: SigningAlgorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    rsa_public: Option<RsaComponents>,
}

#[derive(Clone)]
struct RsaComponents {
    n: Vec<u8>,
    e: Vec<u8>,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Builds an HS256 key from a shared secret.
    ///
    /// # Errors
    /// Returns an error if the secret is empty.
    pub fn hmac(secret: &[u8], kid: Option<String>) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::invalid_key("HS256 secret cannot be empty"));
        }
        Ok(Self {
            kid,
            algorithm: SigningAlgorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            rsa_public: None,
        })
    }

    /// Generates a new 2048-bit RSA key pair.
    ///
    /// # Errors
    /// Returns an error if key generation fails or algorithm is not RSA-based.
    pub fn generate_rsa(algorithm: SigningAlgorithm) -> Result<Self, JwtError> {
        if !algorithm.is_rsa() {
            return Err(JwtError::invalid_key(format!(
                "Algorithm {} is not RSA-based",
                algorithm
            )));
        }

        let private_key = RsaPrivateKey::new(&mut OsRng, 2048)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        Self::from_rsa_private_key(uuid::Uuid::new_v4().to_string(), algorithm, &private_key)
    }

    /// Loads an RSA private key from PEM (PKCS#8 or PKCS#1).
    ///
    /// The public key is derived from the private key.
    ///
    /// # Errors
    /// Returns an error if the PEM data is invalid or the algorithm is not RSA.
    pub fn from_rsa_pem(
        kid: impl Into<String>,
        algorithm: SigningAlgorithm,
        private_pem: &str,
    ) -> Result<Self, JwtError> {
        if !algorithm.is_rsa() {
            return Err(JwtError::invalid_key(format!(
                "Algorithm {} is not RSA-based",
                algorithm
            )));
        }

        let private_key = RsaPrivateKey::from_pkcs8_pem(private_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_pem))
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        Self::from_rsa_private_key(kid.into(), algorithm, &private_key)
    }

    fn from_rsa_private_key(
        kid: String,
        algorithm: SigningAlgorithm,
        private_key: &RsaPrivateKey,
    ) -> Result<Self, JwtError> {
        let public_key = private_key.to_public_key();
        let n = public_key.n().to_bytes_be();
        let e = public_key.e().to_bytes_be();

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        Ok(Self {
            kid: Some(kid),
            algorithm,
            encoding_key,
            decoding_key,
            rsa_public: Some(RsaComponents { n, e }),
        })
    }

    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn kid(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    /// Exports the public key as a JWK. Shared-secret keys have no public half.
    #[must_use]
    pub fn to_jwk(&self) -> Option<Jwk> {
        let rsa = self.rsa_public.as_ref()?;
        Some(Jwk {
            kty: "RSA".to_string(),
            kid: self.kid.clone().unwrap_or_default(),
            use_: "sig".to_string(),
            alg: self.algorithm.as_str().to_string(),
            n: URL_SAFE_NO_PAD.encode(&rsa.n),
            e: URL_SAFE_NO_PAD.encode(&rsa.e),
        })
    }
}

// ============================================================================
// Token Issuer
// ============================================================================

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    /// Seconds until `exp`.
    pub expires_in: i64,
    pub claims: AccessTokenClaims,
}

/// Mints access tokens with a process-wide key.
///
/// This type is `Send + Sync` and is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    key: SigningKey,
    issuer: String,
    lifetime: Duration,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(key: SigningKey, issuer: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            key,
            issuer: issuer.into(),
            lifetime,
        }
    }

    /// Signs a token for `user`, addressed to `audience`, valid from now.
    ///
    /// # Errors
    /// Returns [`JwtError::EncodingError`] if signing fails.
    pub fn issue(&self, user: &UserProfile, audience: &str) -> Result<IssuedToken, JwtError> {
        self.issue_at(user, audience, OffsetDateTime::now_utc())
    }

    /// Signs a token as if issued at `now`.
    ///
    /// # Errors
    /// Returns [`JwtError::EncodingError`] if signing fails.
    pub fn issue_at(
        &self,
        user: &UserProfile,
        audience: &str,
        now: OffsetDateTime,
    ) -> Result<IssuedToken, JwtError> {
        let iat = now.unix_timestamp();
        let expires_in = self.lifetime.whole_seconds();
        let exp = iat
            .checked_add(expires_in)
            .ok_or_else(|| JwtError::encoding_error("token lifetime overflows exp"))?;
        let claims = AccessTokenClaims {
            iss: self.issuer.clone(),
            sub: user.sub.clone(),
            aud: audience.to_string(),
            name: user.full_name.clone(),
            email: user.email.clone(),
            iat,
            exp,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let mut header = Header::new(self.key.algorithm.to_jwt_algorithm());
        header.kid = self.key.kid.clone();

        let access_token = encode(&header, &claims, &self.key.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))?;

        Ok(IssuedToken {
            access_token,
            expires_in,
            claims,
        })
    }

    /// Verifier bound to this issuer's key and `iss`.
    #[must_use]
    pub fn verifier(&self) -> TokenVerifier {
        TokenVerifier::new(self.key.algorithm, self.key.decoding_key.clone())
            .with_issuer(self.issuer.clone())
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// The JWKS containing the public key, empty for shared-secret keys.
    #[must_use]
    pub fn jwks(&self) -> Jwks {
        Jwks {
            keys: self.key.to_jwk().into_iter().collect(),
        }
    }
}

// ============================================================================
// Token Verifier
// ============================================================================

/// Verifies access tokens against a fixed key.
///
/// Relying applications can build one directly from the shared secret or the
/// provider's RSA public key without any other part of the crate.
#[derive(Clone)]
pub struct TokenVerifier {
    algorithm: SigningAlgorithm,
    decoding_key: DecodingKey,
    issuer: Option<String>,
    audience: Option<String>,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    #[must_use]
    pub fn new(algorithm: SigningAlgorithm, decoding_key: DecodingKey) -> Self {
        Self {
            algorithm,
            decoding_key,
            issuer: None,
            audience: None,
        }
    }

    /// Verifier for HS256 tokens signed with `secret`.
    #[must_use]
    pub fn hs256(secret: &[u8]) -> Self {
        Self::new(SigningAlgorithm::HS256, DecodingKey::from_secret(secret))
    }

    /// Verifier for RSA tokens from an SPKI public key PEM.
    ///
    /// # Errors
    /// Returns an error if the PEM is not an RSA public key.
    pub fn from_rsa_public_pem(algorithm: SigningAlgorithm, pem: &str) -> Result<Self, JwtError> {
        if !algorithm.is_rsa() {
            return Err(JwtError::invalid_key(format!(
                "Algorithm {} is not RSA-based",
                algorithm
            )));
        }
        RsaPublicKey::from_public_key_pem(pem).map_err(|e| JwtError::invalid_key(e.to_string()))?;
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())?;
        Ok(Self::new(algorithm, key))
    }

    /// Require `iss` to equal `issuer`.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Require `aud` to equal `audience`.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Verifies signature, claims and expiry against the current time.
    ///
    /// # Errors
    /// Returns [`JwtError::Expired`] at or after `exp`, and a validation error
    /// for any signature or claim problem.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, JwtError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Verifies as of `now`.
    ///
    /// # Errors
    /// See [`TokenVerifier::verify`].
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<AccessTokenClaims, JwtError> {
        let mut validation = Validation::new(self.algorithm.to_jwt_algorithm());
        validation.leeway = 0;
        // Expiry is checked below against `now` so callers can pin the clock.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub", "iat"]);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)?;
        if data.claims.is_expired_at(now) {
            return Err(JwtError::Expired);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn john() -> UserProfile {
        UserProfile {
            sub: "john.doe".to_string(),
            email: "john.doe@example.com".to_string(),
            full_name: "John Doe".to_string(),
        }
    }

    fn hs_issuer() -> TokenIssuer {
        TokenIssuer::new(
            SigningKey::hmac(b"test-secret", None).unwrap(),
            "http://localhost:8000",
            Duration::minutes(15),
        )
    }

    #[test]
    fn test_overflowing_lifetime_is_an_error() {
        let issuer = TokenIssuer::new(
            SigningKey::hmac(b"test-secret", None).unwrap(),
            "http://localhost:8000",
            Duration::MAX,
        );
        let err = issuer.issue(&john(), "app1").unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn test_hs256_issue_and_verify() {
        let issuer = hs_issuer();
        let issued = issuer.issue(&john(), "app1").unwrap();
        assert_eq!(issued.expires_in, 900);

        let claims = issuer.verifier().verify(&issued.access_token).unwrap();
        assert_eq!(claims.sub, "john.doe");
        assert_eq!(claims.name, "John Doe");
        assert_eq!(claims.email, "john.doe@example.com");
        assert_eq!(claims.aud, "app1");
        assert_eq!(claims.iss, "http://localhost:8000");
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_expiry_boundary_without_leeway() {
        let issuer = hs_issuer();
        let now = OffsetDateTime::now_utc();
        let issued = issuer.issue_at(&john(), "app1", now).unwrap();
        let verifier = issuer.verifier();

        assert!(verifier.verify_at(&issued.access_token, now).is_ok());
        assert!(
            verifier
                .verify_at(&issued.access_token, now + Duration::seconds(899))
                .is_ok()
        );
        assert!(matches!(
            verifier.verify_at(&issued.access_token, now + Duration::seconds(900)),
            Err(JwtError::Expired)
        ));
        assert!(matches!(
            verifier.verify_at(&issued.access_token, now + Duration::seconds(901)),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = hs_issuer().issue(&john(), "app1").unwrap();
        let err = TokenVerifier::hs256(b"other-secret")
            .verify(&issued.access_token)
            .unwrap_err();
        assert!(matches!(err, JwtError::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let issued = hs_issuer().issue(&john(), "app1").unwrap();
        let mut parts: Vec<String> = issued
            .access_token
            .split('.')
            .map(str::to_string)
            .collect();
        let mut claims = issued.claims.clone();
        claims.sub = "admin".to_string();
        parts[1] = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let forged = parts.join(".");

        assert!(hs_issuer().verifier().verify(&forged).is_err());
    }

    #[test]
    fn test_issuer_and_audience_checks() {
        let issued = hs_issuer().issue(&john(), "app1").unwrap();

        let wrong_iss = TokenVerifier::hs256(b"test-secret").with_issuer("https://evil.example");
        assert!(matches!(
            wrong_iss.verify(&issued.access_token),
            Err(JwtError::InvalidClaims { .. })
        ));

        let app2 = TokenVerifier::hs256(b"test-secret").with_audience("app2");
        assert!(app2.verify(&issued.access_token).is_err());

        let app1 = TokenVerifier::hs256(b"test-secret").with_audience("app1");
        assert!(app1.verify(&issued.access_token).is_ok());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let err = hs_issuer().verifier().verify("not.a.jwt").unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_hmac_rejects_empty_secret() {
        assert!(SigningKey::hmac(b"", None).is_err());
        assert!(hs_issuer().jwks().keys.is_empty());
    }

    #[test]
    fn test_rs256_generate_issue_verify_and_jwks() {
        let key = SigningKey::generate_rsa(SigningAlgorithm::RS256).unwrap();
        let issuer = TokenIssuer::new(key, "http://localhost:8000", Duration::minutes(15));
        let issued = issuer.issue(&john(), "app1").unwrap();

        assert!(issuer.verifier().verify(&issued.access_token).is_ok());

        let jwks = issuer.jwks();
        assert_eq!(jwks.keys.len(), 1);
        assert_eq!(jwks.keys[0].kty, "RSA");
        assert_eq!(jwks.keys[0].alg, "RS256");
        assert_eq!(jwks.keys[0].use_, "sig");

        let header = jsonwebtoken::decode_header(&issued.access_token).unwrap();
        assert_eq!(header.kid.as_deref(), Some(jwks.keys[0].kid.as_str()));
    }

    #[test]
    fn test_rsa_pem_round_trip() {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let private_pem = private_key.to_pkcs8_pem(LineEnding::LF).unwrap();
        let public_pem = private_key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap();

        let key = SigningKey::from_rsa_pem("k1", SigningAlgorithm::RS384, &private_pem).unwrap();
        assert_eq!(key.kid(), Some("k1"));
        let issuer = TokenIssuer::new(key, "iss", Duration::minutes(1));
        let issued = issuer.issue(&john(), "app1").unwrap();

        let verifier =
            TokenVerifier::from_rsa_public_pem(SigningAlgorithm::RS384, &public_pem).unwrap();
        assert_eq!(verifier.verify(&issued.access_token).unwrap().sub, "john.doe");
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!(
            "RS384".parse::<SigningAlgorithm>().unwrap(),
            SigningAlgorithm::RS384
        );
        assert!("none".parse::<SigningAlgorithm>().is_err());
        assert!(SigningKey::generate_rsa(SigningAlgorithm::HS256).is_err());
    }

    #[test]
    fn test_jwt_error_maps_to_auth_error() {
        assert!(matches!(
            AuthError::from(JwtError::Expired),
            AuthError::TokenExpired
        ));
        assert!(matches!(
            AuthError::from(JwtError::encoding_error("x")),
            AuthError::SigningFailure { .. }
        ));
        assert!(matches!(
            AuthError::from(JwtError::InvalidSignature),
            AuthError::InvalidToken { .. }
        ));
    }
}
