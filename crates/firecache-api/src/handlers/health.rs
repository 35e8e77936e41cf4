//! Health check handler.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub cache_root: String,
}

/// Healthy while the cache root is still a directory.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Cache root missing", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cache_root = state.cache_root.display().to_string();

    let healthy = match tokio::fs::metadata(&state.cache_root).await {
        Ok(meta) => meta.is_dir(),
        Err(e) => {
            tracing::error!(error = %e, cache_root = %cache_root, "Cache root health check failed");
            false
        }
    };

    let (status, label) = if healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            cache_root,
        }),
    )
}
