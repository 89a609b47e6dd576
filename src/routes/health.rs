// src/routes/health.rs
//! Liveness endpoint for the alarm server.
//!
//! Used by the container runtime and by the clock device's boot check to
//! confirm the HTTP server answers before it starts polling
//! `/api/next-alarm`. Exports a subrouter to the gateway (`mod.rs`).

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Handle `GET /health`.
///
/// Does not touch the alarm store.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Subrouter containing `/health`, generic over the gateway's state type.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
