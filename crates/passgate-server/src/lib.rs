pub mod bootstrap;
pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;

pub use bootstrap::{Stores, build_stores, load_signing_key};
pub use config::{AppConfig, ClientEntry, LoggingConfig, ServerConfig, UserEntry};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{AppState, PassgateServer, ServerBuilder, build_app, build_router};
