//! Scaled variants of cached images.

use super::cache::AssetQuery;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, RawQuery, State},
    response::Response,
};
use firecache_core::AppError;
use firecache_processing::{ImageScaler, ScaleSize};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/scale/{size}",
    tag = "assets",
    params(
        ("size" = String, Path, description = "Bounding box: N for N x N, or WIDTHxHEIGHT (e.g. 800x600)"),
        AssetQuery
    ),
    responses(
        (status = 200, description = "PNG fitting the box, or the original asset when it is not an image"),
        (status = 400, description = "Invalid size or url parameter", body = ErrorResponse),
        (status = 403, description = "Origin rejected the caller's access", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_scaled_asset(
    State(state): State<Arc<AppState>>,
    Path(size): Path<String>,
    query: Result<Query<AssetQuery>, QueryRejection>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, HttpAppError> {
    let size = ScaleSize::parse(&size)?;
    let Query(query) = query?;

    let original = state
        .asset_cache
        .get_asset(&query.url, raw_query.as_deref().unwrap_or_default())
        .await?;

    tracing::debug!(size = %size, content_type = %original.content_type, "Scaling asset");

    let entry = tokio::task::spawn_blocking(move || {
        ImageScaler::scale(&original, size).map(|outcome| outcome.into_entry(original))
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to spawn blocking task");
        AppError::Internal(e.to_string())
    })??;

    super::asset_response(entry)
}
