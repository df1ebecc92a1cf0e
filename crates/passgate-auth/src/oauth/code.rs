//! Authorization codes.
//!
//! A code binds a subject to the `{client_id, redirect_uri}` pair it was
//! issued for. It is redeemable exactly once, and only before `expires_at`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// A single-use authorization code and its binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCode {
    /// 256-bit random value, base64url-encoded (43 characters).
    pub code: String,

    /// Client the code was issued to.
    pub client_id: String,

    /// Redirect URI used at `/authorize`. Must be repeated verbatim at `/token`.
    pub redirect_uri: String,

    /// Username of the authenticated user.
    pub subject: String,

    /// Space-separated scope from the authorization request.
    pub scope: String,

    /// `state` from the authorization request, kept for audit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// Set once, when the code is redeemed.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub consumed_at: Option<OffsetDateTime>,
}

impl AuthorizationCode {
    /// Mints a fresh code valid for `lifetime` from now.
    #[must_use]
    pub fn issue(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        subject: impl Into<String>,
        scope: impl Into<String>,
        state: Option<String>,
        lifetime: Duration,
    ) -> Self {
        let issued_at = OffsetDateTime::now_utc();
        Self {
            code: Self::generate_code(),
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            subject: subject.into(),
            scope: scope.into(),
            state,
            issued_at,
            expires_at: issued_at.saturating_add(lifetime),
            consumed_at: None,
        }
    }

    /// Generates a new cryptographically secure authorization code.
    ///
    /// 32 bytes from the thread RNG, base64url without padding.
    #[must_use]
    pub fn generate_code() -> String {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Returns `true` if the code is at or past its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    /// Returns `true` if the code has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }

    /// Returns `true` if the code has been redeemed.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// Time left before expiry, clamped to zero.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        (self.expires_at - OffsetDateTime::now_utc()).max(Duration::ZERO)
    }
}
