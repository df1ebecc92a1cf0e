use std::{env, fs};

use passgate_auth::config::StorageBackend;
use passgate_server::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("passgate.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081
public_url = "https://sso.example.com"

[logging]
level = "debug"

[auth]
issuer = "https://sso.example.com"
authorization_code_lifetime = "60s"
access_token_lifetime = "15m"
session_lifetime = "1d"
secure_cookies = true

[auth.signing]
algorithm = "HS256"
secret = "file-secret"

[storage]
backend = "memory"

[[clients]]
client_id = "app1"
redirect_uri = "http://localhost:3001/callback"
client_secret = "app1_secret"

[[clients]]
client_id = "app2"
name = "Second App"
redirect_uri = "http://localhost:3002/callback"
client_secret = "app2_secret"

[[users]]
username = "john.doe"
full_name = "John Doe"
email = "john.doe@example.com"
password = "password123"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.public_url(), "https://sso.example.com");
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.auth.authorization_code_lifetime.as_secs(), 60);
    assert_eq!(cfg.auth.access_token_lifetime.as_secs(), 900);
    assert_eq!(cfg.auth.session_lifetime.as_secs(), 86_400);
    assert!(cfg.auth.secure_cookies);
    assert_eq!(cfg.storage.backend, StorageBackend::Memory);
    assert_eq!(cfg.clients.len(), 2);
    assert_eq!(cfg.clients[1].name.as_deref(), Some("Second App"));
    assert_eq!(cfg.users[0].username, "john.doe");

    // 2) Env override should win over file
    unsafe {
        env::set_var("PASSGATE__SERVER__PORT", "9090");
        env::set_var("PASSGATE__AUTH__SIGNING__SECRET", "env-secret");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.server.port, 9090);
    assert_eq!(cfg_env.auth.signing.secret.as_deref(), Some("env-secret"));
    unsafe {
        env::remove_var("PASSGATE__SERVER__PORT");
        env::remove_var("PASSGATE__AUTH__SIGNING__SECRET");
    }

    // 3) Missing file falls back to defaults, which lack an HS256 secret
    let missing = dir.path().join("missing.toml");
    let err = load_config(missing.to_str()).expect_err("expected validation error");
    assert!(err.contains("auth config error"));

    // 4) Duplicate client ids are rejected
    let dup_path = dir.path().join("dup.toml");
    let dup_toml = r#"
[auth.signing]
secret = "s"

[[clients]]
client_id = "app1"
redirect_uri = "http://localhost:3001/callback"
client_secret = "a"

[[clients]]
client_id = "app1"
redirect_uri = "http://localhost:3002/callback"
client_secret = "b"
"#;
    fs::write(&dup_path, dup_toml).expect("write dup toml");
    let err = load_config(dup_path.to_str()).expect_err("expected duplicate error");
    assert!(err.contains("duplicate client_id"));

    // 5) Relative redirect URIs are rejected
    let rel_path = dir.path().join("relative.toml");
    let rel_toml = r#"
[auth.signing]
secret = "s"

[[clients]]
client_id = "app1"
redirect_uri = "/callback"
client_secret = "a"
"#;
    fs::write(&rel_path, rel_toml).expect("write relative toml");
    let err = load_config(rel_path.to_str()).expect_err("expected redirect error");
    assert!(err.contains("redirect_uri"));

    // 6) Zero lifetimes are rejected
    let zero_path = dir.path().join("zero.toml");
    let zero_toml = r#"
[auth]
authorization_code_lifetime = "0s"

[auth.signing]
secret = "s"
"#;
    fs::write(&zero_path, zero_toml).expect("write zero toml");
    let err = load_config(zero_path.to_str()).expect_err("expected lifetime error");
    assert!(err.contains("authorization_code_lifetime"));
}
