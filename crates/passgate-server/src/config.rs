use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use passgate_auth::config::{AuthConfig, StorageBackend, StorageConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Protocol settings: lifetimes, cookie, signing key
    #[serde(default)]
    pub auth: AuthConfig,
    /// Session and authorization code store
    #[serde(default)]
    pub storage: StorageConfig,
    /// Client applications registered at startup
    #[serde(default)]
    pub clients: Vec<ClientEntry>,
    /// User accounts created at startup
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.request_timeout_ms == 0 {
            return Err("server.request_timeout_ms must be > 0".into());
        }
        if let Some(ref public_url) = self.server.public_url {
            parse_absolute_url(public_url)
                .map_err(|e| format!("server.public_url is invalid: {e}"))?;
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Auth validation
        self.auth
            .validate()
            .map_err(|e| format!("auth config error: {e}"))?;
        // Storage validation
        if self.storage.backend == StorageBackend::Redis {
            if self.storage.redis.url.trim().is_empty() {
                return Err("storage.redis.url must be set when backend = \"redis\"".into());
            }
            if self.storage.redis.pool_size == 0 {
                return Err("storage.redis.pool_size must be > 0".into());
            }
        }
        // Client registrations
        let mut client_ids = HashSet::new();
        for client in &self.clients {
            if client.client_id.trim().is_empty() {
                return Err("clients: client_id cannot be empty".into());
            }
            if !client_ids.insert(client.client_id.as_str()) {
                return Err(format!("clients: duplicate client_id '{}'", client.client_id));
            }
            parse_absolute_url(&client.redirect_uri).map_err(|e| {
                format!(
                    "clients.{}: redirect_uri '{}' is invalid: {e}",
                    client.client_id, client.redirect_uri
                )
            })?;
            match (&client.client_secret, &client.client_secret_hash) {
                (Some(_), None) | (None, Some(_)) => {}
                _ => {
                    return Err(format!(
                        "clients.{}: exactly one of client_secret or client_secret_hash is required",
                        client.client_id
                    ));
                }
            }
        }
        // User accounts
        let mut usernames = HashSet::new();
        for user in &self.users {
            if user.username.trim().is_empty() {
                return Err("users: username cannot be empty".into());
            }
            if !usernames.insert(user.username.as_str()) {
                return Err(format!("users: duplicate username '{}'", user.username));
            }
            match (&user.password, &user.password_hash) {
                (Some(_), None) | (None, Some(_)) => {}
                _ => {
                    return Err(format!(
                        "users.{}: exactly one of password or password_hash is required",
                        user.username
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    /// Returns the public URL of the provider.
    /// If `public_url` is configured, returns that; otherwise computes from host:port.
    pub fn public_url(&self) -> String {
        self.server
            .public_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.server.host, self.server.port))
    }
}

fn parse_absolute_url(value: &str) -> Result<url::Url, String> {
    let url = url::Url::parse(value).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err("must be an absolute http(s) URL".into());
    }
    Ok(url)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Externally visible URL, used in logs and as the default issuer hint.
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}
fn default_request_timeout_ms() -> u64 {
    15_000
}
fn default_body_limit() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            request_timeout_ms: default_request_timeout_ms(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// A `[[clients]]` entry.
///
/// `client_secret` is kept as given and compared in constant time;
/// `client_secret_hash` is an Argon2id PHC string.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientEntry {
    pub client_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub redirect_uri: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub client_secret_hash: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl std::fmt::Debug for ClientEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientEntry")
            .field("client_id", &self.client_id)
            .field("name", &self.name)
            .field("redirect_uri", &self.redirect_uri)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// A `[[users]]` entry.
///
/// A plain `password` is hashed when the server starts.
#[derive(Clone, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl std::fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserEntry")
            .field("username", &self.username)
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

fn default_active() -> bool {
    true
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                // Try default root-level file
                let default_path = PathBuf::from("passgate.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., PASSGATE__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("PASSGATE")
                .prefix_separator("__")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn load_config_with_default_path<P: AsRef<Path>>(
        path: Option<P>,
    ) -> Result<AppConfig, String> {
        let p = path
            .as_ref()
            .map(|p| p.as_ref().to_string_lossy().to_string());
        load_config(p.as_deref())
    }
}
