//! Cached passthrough of storage download URLs.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, RawQuery, State},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssetQuery {
    /// Storage download URL, e.g.
    /// `https://firebasestorage.googleapis.com/v0/b/<bucket>/o/<object>?alt=media&token=<t>`.
    /// Its own query parameters may follow unencoded.
    pub url: String,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "assets",
    params(AssetQuery),
    responses(
        (status = 200, description = "Asset bytes with the origin's content type"),
        (status = 400, description = "Missing or malformed url parameter", body = ErrorResponse),
        (status = 403, description = "Origin rejected the caller's access", body = ErrorResponse),
        (status = 404, description = "Object not found at the origin", body = ErrorResponse),
        (status = 502, description = "Origin unreachable", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_cached_asset(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AssetQuery>, QueryRejection>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, HttpAppError> {
    let Query(query) = query?;
    let entry = state
        .asset_cache
        .get_asset(&query.url, raw_query.as_deref().unwrap_or_default())
        .await?;

    super::asset_response(entry)
}
