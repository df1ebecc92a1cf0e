//! Periodic sweep of expired sessions and codes.
//!
//! Expiry is always enforced on read; the sweep only bounds memory use.

use std::sync::Arc;
use std::time::Duration;

use super::{AuthorizationCodeStorage, LoginSessionStorage};

/// Removes expired entries from both stores once.
///
/// Returns `(sessions_removed, codes_removed)`. Failures are logged and count
/// as zero removals.
pub async fn sweep_once(
    sessions: &dyn LoginSessionStorage,
    codes: &dyn AuthorizationCodeStorage,
) -> (u64, u64) {
    let sessions_removed = sessions.cleanup_expired().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Login session cleanup failed");
        0
    });
    let codes_removed = codes.cleanup_expired().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Authorization code cleanup failed");
        0
    });
    (sessions_removed, codes_removed)
}

/// Starts the background sweep.
///
/// Returns `None` without spawning anything when `every` is zero.
pub fn start_cleanup_task(
    sessions: Arc<dyn LoginSessionStorage>,
    codes: Arc<dyn AuthorizationCodeStorage>,
    every: Duration,
) -> Option<tokio::task::JoinHandle<()>> {
    if every.is_zero() {
        tracing::info!("Expired entry sweep disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;

            let (sessions_removed, codes_removed) =
                sweep_once(sessions.as_ref(), codes.as_ref()).await;
            if sessions_removed > 0 || codes_removed > 0 {
                tracing::debug!(
                    sessions = sessions_removed,
                    codes = codes_removed,
                    "Expired entry sweep completed"
                );
            }
        }
    }))
}
