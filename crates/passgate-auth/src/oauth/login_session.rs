//! Provider-side login sessions.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// A logged-in user, referenced by the `sso_session_token` cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSession {
    /// Opaque token carried by the cookie. 256 random bits.
    pub session_id: String,

    /// Username of the authenticated user.
    pub subject: String,

    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl LoginSession {
    /// Starts a new session for `subject`.
    #[must_use]
    pub fn start(subject: impl Into<String>, lifetime: Duration) -> Self {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        let issued_at = OffsetDateTime::now_utc();
        Self {
            session_id: URL_SAFE_NO_PAD.encode(bytes),
            subject: subject.into(),
            issued_at,
            expires_at: issued_at.saturating_add(lifetime),
        }
    }

    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }

    /// Time left before expiry, clamped to zero.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        (self.expires_at - OffsetDateTime::now_utc()).max(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_session() {
        let session = LoginSession::start("john.doe", Duration::days(1));
        assert_eq!(session.subject, "john.doe");
        assert_eq!(session.session_id.len(), 43);
        assert!(!session.is_expired());
        assert_eq!(session.expires_at - session.issued_at, Duration::days(1));
    }

    #[test]
    fn test_huge_lifetime_saturates() {
        let session = LoginSession::start("john.doe", Duration::MAX);
        assert!(session.expires_at > session.issued_at);
        assert!(!session.is_expired());
    }

    #[test]
    fn test_session_ids_unique() {
        let a = LoginSession::start("a", Duration::hours(1));
        let b = LoginSession::start("a", Duration::hours(1));
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn test_expired_at_boundary() {
        let session = LoginSession::start("a", Duration::hours(1));
        assert!(session.is_expired_at(session.expires_at));
        assert!(!session.is_expired_at(session.expires_at - Duration::seconds(1)));
    }
}
