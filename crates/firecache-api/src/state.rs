//! Application state shared by all handlers.

use firecache_core::Config;
use firecache_services::AssetCache;
use std::path::PathBuf;

pub struct AppState {
    pub asset_cache: AssetCache,
    /// Cache root as configured, checked by the health endpoint.
    pub cache_root: PathBuf,
    pub config: Config,
}
