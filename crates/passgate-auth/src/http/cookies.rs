//! Provider session cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// How the provider session cookie is written.
#[derive(Debug, Clone)]
pub struct SessionCookieConfig {
    pub name: String,
    pub secure: bool,
    pub max_age: Duration,
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        Self {
            name: "sso_session_token".to_string(),
            secure: false,
            max_age: Duration::days(1),
        }
    }
}

impl SessionCookieConfig {
    /// httpOnly, `SameSite=Lax`, `Path=/` cookie carrying the session token.
    #[must_use]
    pub fn build(&self, session_id: &str) -> Cookie<'static> {
        Cookie::build((self.name.clone(), session_id.to_string()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(self.max_age)
            .build()
    }

    /// Session token from the request cookies.
    #[must_use]
    pub fn read(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Removes the cookie from the browser.
    #[must_use]
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build(self.name.clone()).path("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_attributes() {
        let config = SessionCookieConfig {
            secure: true,
            ..SessionCookieConfig::default()
        };
        let cookie = config.build("abc");
        assert_eq!(cookie.name(), "sso_session_token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(1)));
    }

    #[test]
    fn test_read_ignores_empty_value() {
        let config = SessionCookieConfig::default();
        let jar = CookieJar::new().add(Cookie::new("sso_session_token", ""));
        assert_eq!(config.read(&jar), None);

        let jar = CookieJar::new().add(config.build("tok"));
        assert_eq!(config.read(&jar).as_deref(), Some("tok"));
    }
}
