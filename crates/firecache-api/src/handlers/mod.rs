pub mod cache;
pub mod health;
pub mod scale;

use crate::error::HttpAppError;
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use firecache_core::{AppError, CacheEntry};

/// Render an entry with its stored content type.
fn asset_response(entry: CacheEntry) -> Result<Response, HttpAppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, entry.content_type.as_str())
        .header(header::CONTENT_LENGTH, entry.len())
        .body(Body::from(entry.content))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            AppError::Internal(e.to_string()).into()
        })
}
