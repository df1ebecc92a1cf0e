use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use passgate_auth::http::{ProviderState, SessionCookieConfig, provider_routes};
use passgate_auth::oauth::service::to_time;
use passgate_auth::oauth::{AuthorizationConfig, AuthorizationService, LoginService};
use passgate_auth::storage::RetryPolicy;
use passgate_auth::storage::cleanup::start_cleanup_task;
use passgate_auth::token::{TokenIssuer, TokenService};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::bootstrap::{Stores, build_stores, load_signing_key};
use crate::config::AppConfig;
use crate::handlers::{self, HealthState};

/// Shared state assembled at startup.
#[derive(Clone)]
pub struct AppState {
    pub provider: ProviderState,
    pub stores: Stores,
}

impl AppState {
    /// Builds stores, signing key and services from configuration.
    pub async fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let stores = build_stores(&cfg.storage, &cfg.clients, &cfg.users).await?;
        Self::with_stores(cfg, stores)
    }

    /// Builds services on top of existing stores.
    pub fn with_stores(cfg: &AppConfig, stores: Stores) -> anyhow::Result<Self> {
        let key = load_signing_key(&cfg.auth.signing)?;
        let issuer = Arc::new(TokenIssuer::new(
            key,
            cfg.auth.issuer.clone(),
            to_time(cfg.auth.access_token_lifetime),
        ));

        let authz_config = AuthorizationConfig::from_auth_config(&cfg.auth);
        let retry = RetryPolicy::from_config(&cfg.auth);

        let provider = ProviderState {
            login: Arc::new(LoginService::new(
                stores.users.clone(),
                stores.sessions.clone(),
                authz_config.clone(),
            )),
            authorization: Arc::new(AuthorizationService::new(
                stores.clients.clone(),
                stores.sessions.clone(),
                stores.codes.clone(),
                authz_config,
            )),
            tokens: Arc::new(
                TokenService::new(
                    stores.clients.clone(),
                    stores.users.clone(),
                    stores.codes.clone(),
                    issuer.clone(),
                )
                .with_retry(retry),
            ),
            issuer,
            cookie: SessionCookieConfig {
                name: cfg.auth.session_cookie_name.clone(),
                secure: cfg.auth.secure_cookies,
                max_age: to_time(cfg.auth.session_lifetime),
            },
            login_page: cfg.auth.login_page.clone(),
        };

        Ok(Self { provider, stores })
    }
}

pub struct PassgateServer {
    addr: SocketAddr,
    app: Router,
    state: AppState,
    cleanup_interval: std::time::Duration,
}

pub fn build_router(cfg: &AppConfig, state: &AppState) -> Router {
    let health = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .with_state(HealthState {
            sessions: state.stores.sessions.clone(),
        });

    Router::new()
        .merge(health)
        .merge(provider_routes(state.provider.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|req: &axum::http::Request<_>| {
                            use tracing::field::Empty;
                            // Only the path is recorded: queries carry codes and state.
                            tracing::info_span!(
                                "http.request",
                                http.method = %req.method(),
                                http.target = %req.uri().path(),
                                http.status_code = Empty,
                            )
                        })
                        .on_response(
                            |res: &axum::http::Response<_>,
                             latency: std::time::Duration,
                             span: &tracing::Span| {
                                span.record(
                                    "http.status_code",
                                    tracing::field::display(res.status().as_u16()),
                                );
                                tracing::info!(
                                    http.status = %res.status().as_u16(),
                                    elapsed_ms = %latency.as_millis(),
                                    "request handled"
                                );
                            },
                        ),
                )
                .layer(TimeoutLayer::new(cfg.request_timeout())),
        )
        .layer(axum::extract::DefaultBodyLimit::max(cfg.server.body_limit_bytes))
}

/// Builds the full application router from configuration.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = AppState::from_config(cfg).await?;
    Ok(build_router(cfg, &state))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<PassgateServer> {
        let state = AppState::from_config(&self.config).await?;
        let app = build_router(&self.config, &state);

        Ok(PassgateServer {
            addr: self.addr,
            app,
            state,
            cleanup_interval: self.config.auth.cleanup_interval,
        })
    }
}

impl PassgateServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let cleanup = start_cleanup_task(
            self.state.stores.sessions.clone(),
            self.state.stores.codes.clone(),
            self.cleanup_interval,
        );

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Some(handle) = cleanup {
            handle.abort();
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
