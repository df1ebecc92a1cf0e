//! Errors raised on the relying-application side of the flow.

/// Errors from the relying-party helper.
#[derive(Debug, thiserror::Error)]
pub enum RelyingPartyError {
    /// The callback carried no `code` parameter.
    #[error("Authorization code not found in callback")]
    MissingCode,

    /// The callback `state` does not match the state cookie.
    #[error("State mismatch: callback state does not match the login attempt")]
    StateMismatch,

    /// The provider redirected back with an OAuth error.
    #[error("Authorization denied by provider: {0}")]
    AuthorizationDenied(String),

    /// The token endpoint answered with an error body.
    #[error("Token exchange rejected: {error}: {detail}")]
    TokenRejected {
        status: u16,
        error: String,
        detail: String,
    },

    /// The token endpoint answered with something unexpected.
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid relying party configuration: {0}")]
    Configuration(String),
}

impl RelyingPartyError {
    /// Short code appended to the home URL as `?error=...`.
    #[must_use]
    pub fn redirect_code(&self) -> &'static str {
        match self {
            Self::MissingCode => "NoCode",
            Self::StateMismatch => "StateMismatch",
            Self::AuthorizationDenied(_) => "AccessDenied",
            Self::TokenRejected { .. }
            | Self::TokenExchangeFailed(_)
            | Self::Network(_)
            | Self::Url(_)
            | Self::Configuration(_) => "TokenExchangeFailed",
        }
    }
}
