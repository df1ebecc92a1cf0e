use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use passgate_auth::storage::LoginSessionStorage;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

/// Stores probed by `/readyz`.
#[derive(Clone)]
pub struct HealthState {
    pub sessions: Arc<dyn LoginSessionStorage>,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Ready once the session store answers a lookup.
pub async fn readyz(State(state): State<HealthState>) -> impl IntoResponse {
    match state.sessions.find("readiness-probe").await {
        Ok(_) => (StatusCode::OK, Json(HealthResponse { status: "ready" })),
        Err(e) => {
            tracing::warn!(error = %e, "Session store not ready");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                }),
            )
        }
    }
}
