//! User accounts known to the provider.

use serde::{Deserialize, Serialize};

/// A user that can log in to the provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// Login name, also the token subject.
    pub username: String,
    pub full_name: String,
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub active: bool,
}

impl std::fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAccount")
            .field("username", &self.username)
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl UserAccount {
    /// Public view of the account.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            sub: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
        }
    }
}

/// Identity fields returned by `/api/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub sub: String,
    pub email: String,
    pub full_name: String,
}
