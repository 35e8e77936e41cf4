//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use firecache_core::Config;
use firecache_services::AssetCache;
use std::sync::Arc;

/// Initialize telemetry, then the application.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.is_production());

    build_app(config).await
}

/// Validate `config`, bootstrap the cache and build the router.
///
/// Does not touch the global tracing subscriber.
pub async fn build_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config
        .validate()
        .context("Configuration validation failed")?;

    let cache_config = config.cache_config().clone();
    tracing::info!(
        cache_root = %cache_config.cache_root.display(),
        storage_host = %cache_config.storage_host,
        origin_timeout_secs = cache_config.origin_timeout.as_secs(),
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let asset_cache = AssetCache::setup(&cache_config)
        .await
        .context("Failed to set up the asset cache")?;

    let state = Arc::new(AppState {
        asset_cache,
        cache_root: cache_config.cache_root,
        config,
    });

    let router = routes::setup_routes(&state.config, state.clone())?;

    Ok((state, router))
}
