//! Health check endpoint

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub database: String,
    /// Stored songs; absent when the database is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub songs: Option<i64>,
}

/// GET /health
///
/// 200 with `status: "ok"` and the song count when the `songs` table
/// answers, 503 with `status: "degraded"` otherwise.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, database, songs) = match state.store.count().await {
        Ok(count) => (StatusCode::OK, "ok", "ok".to_string(), Some(count)),
        Err(e) => {
            tracing::warn!("Health check: database unreachable: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unreachable".to_string(), None)
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            module: "songlib-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database,
            songs,
        }),
    )
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
