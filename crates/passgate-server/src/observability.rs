//! Log setup for the provider process.
//!
//! Tracing starts at `info` so config loading can log. Once the file is read,
//! `logging.level` replaces the filter through a reload handle. `RUST_LOG`
//! overrides both.

use std::sync::OnceLock;

use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

const STARTUP_LEVEL: &str = "info";

/// HTTP plumbing that is noisy at `debug` and says nothing about logins.
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "h2=warn", "reqwest=warn"];

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

fn filter_for(level: &str) -> EnvFilter {
    QUIET_TARGETS
        .iter()
        .filter_map(|target| target.parse::<Directive>().ok())
        .fold(EnvFilter::new(level), EnvFilter::add_directive)
}

fn rust_log_set() -> bool {
    std::env::var_os("RUST_LOG").is_some()
}

/// Installs the global subscriber at the startup level.
pub fn init_tracing() {
    let filter = if rust_log_set() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for(STARTUP_LEVEL))
    } else {
        filter_for(STARTUP_LEVEL)
    };

    let (filter_layer, handle) = reload::Layer::new(filter);
    let _ = FILTER_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer())
        .try_init();
}

/// Switches to the configured `logging.level`.
///
/// Returns `false` when `RUST_LOG` is set or tracing was never initialized.
pub fn apply_logging_level(level: &str) -> bool {
    if rust_log_set() {
        return false;
    }
    FILTER_HANDLE
        .get()
        .is_some_and(|handle| handle.modify(|f| *f = filter_for(level)).is_ok())
}
