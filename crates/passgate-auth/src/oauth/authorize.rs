//! Authorization request and response types.
//!
//! # Example Request
//!
//! ```ignore
//! GET /authorize?
//!   response_type=code
//!   &client_id=app1
//!   &redirect_uri=http://localhost:3001/callback
//!   &state=abc123xyz
//! ```

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Authorization request parameters from the `/authorize` query string.
///
/// Every field defaults to empty so that a missing parameter is reported by
/// the same checks as a wrong one (unknown client, redirect mismatch).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthorizationRequest {
    /// Must be "code".
    pub response_type: String,

    /// Client identifier issued during registration.
    pub client_id: String,

    /// Must exactly match the registered redirect URI.
    pub redirect_uri: String,

    /// Requested scope (space-separated). Carried through to the code.
    pub scope: String,

    /// Opaque value echoed back to the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl AuthorizationRequest {
    /// Non-empty `state`, if any.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref().filter(|s| !s.is_empty())
    }
}

/// Successful authorization: where to send the browser with the code.
///
/// ```ignore
/// HTTP/1.1 302 Found
/// Location: http://localhost:3001/callback?code=SplxlOBeZQQYbYS6WxSbIA&state=abc123xyz
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationResponse {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl AuthorizationResponse {
    #[must_use]
    pub fn new(code: String, state: Option<String>) -> Self {
        Self { code, state }
    }

    /// Builds the redirect URL. `state` is appended only when present.
    ///
    /// # Errors
    ///
    /// Returns an error if `redirect_uri` is not an absolute URL.
    pub fn to_redirect_url(&self, redirect_uri: &str) -> Result<String, url::ParseError> {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("code", &self.code);
        if let Some(state) = self.state.as_deref() {
            query.append_pair("state", state);
        }
        append_query(redirect_uri, &query.finish())
    }
}

/// Error delivered to a trusted redirect URI.
///
/// Only used once the client and redirect URI have been validated; before
/// that, errors are shown to the browser directly.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationError {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl AuthorizationError {
    #[must_use]
    pub fn new(error: &'static str, state: Option<String>) -> Self {
        Self {
            error,
            error_description: None,
            state,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.error_description = Some(description.into());
        self
    }

    /// # Errors
    ///
    /// Returns an error if `redirect_uri` is not an absolute URL.
    pub fn to_redirect_url(&self, redirect_uri: &str) -> Result<String, url::ParseError> {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("error", self.error);
        if let Some(ref desc) = self.error_description {
            query.append_pair("error_description", desc);
        }
        if let Some(ref state) = self.state {
            query.append_pair("state", state);
        }
        append_query(redirect_uri, &query.finish())
    }
}

/// Appends `query` to the registered redirect URI without re-serializing it.
///
/// The URI is parsed only to reject relative values; the returned string keeps
/// the registered spelling byte for byte (host case, explicit default port,
/// empty path). A fragment stays after the query.
fn append_query(redirect_uri: &str, query: &str) -> Result<String, url::ParseError> {
    url::Url::parse(redirect_uri)?;

    let (base, fragment) = match redirect_uri.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (redirect_uri, None),
    };
    let separator = match base.find('?') {
        None => "?",
        Some(idx) if idx + 1 == base.len() || base.ends_with('&') => "",
        Some(_) => "&",
    };

    let mut out = format!("{base}{separator}{query}");
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    Ok(out)
}

/// URL of the login page carrying the original authorize query, so the
/// browser can come back to `/authorize` once logged in.
///
/// `login_page` may be absolute or a local path.
#[must_use]
pub fn login_redirect_url(login_page: &str, authorize_query: &str) -> String {
    if authorize_query.is_empty() {
        return login_page.to_string();
    }
    let separator = if login_page.contains('?') { '&' } else { '?' };
    format!("{login_page}{separator}{authorize_query}")
}
