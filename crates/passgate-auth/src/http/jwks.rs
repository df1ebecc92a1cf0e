//! JWKS endpoint handler.

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use super::ProviderState;

/// `GET /jwks.json`
///
/// Public keys for verifying access tokens. Empty for shared-secret (HS256)
/// deployments.
///
/// ```json
/// {
///   "keys": [
///     { "kty": "RSA", "kid": "key-1", "use": "sig", "alg": "RS256", "n": "...", "e": "AQAB" }
///   ]
/// }
/// ```
pub async fn jwks_handler(State(state): State<ProviderState>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "public, max-age=3600")],
        Json(state.issuer.jwks()),
    )
}
