//! Firecache Services Library
//!
//! The origin fetcher and the asset cache orchestrator that decides, per
//! request, whether to fetch and store or to revalidate and serve.

pub mod asset_cache;
pub mod origin;

pub use asset_cache::AssetCache;
pub use origin::{HttpOriginClient, OriginClient};
