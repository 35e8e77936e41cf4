//! Firecache Core Library
//!
//! Domain models, error types, configuration and the pure URL logic shared by
//! all firecache crates: turning a storage download URL into its cache key and
//! recovering the URL to forward to the origin.

pub mod config;
pub mod constants;
pub mod error;
pub mod forwarding;
pub mod models;
pub mod resolver;

pub use config::{CacheConfig, Config, ProxyConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use forwarding::download_url;
pub use models::{CacheEntry, CanonicalPath, DEFAULT_CONTENT_TYPE};
pub use resolver::{resolve, resolve_url};
