//! Firecache Storage Library
//!
//! The cache store abstraction and its local filesystem implementation.
//!
//! # Cache layout
//!
//! The cache root mirrors the canonical storage paths. Object `a/b.png` is
//! stored as `<root>/a/b.png.cache`, one self-describing JSON record holding
//! the content type and the base64-encoded bytes.
//!
//! Entries are immutable: written at most once, never updated or evicted.

#[cfg(feature = "storage-local")]
pub mod local;
mod record;
pub mod traits;

#[cfg(feature = "storage-local")]
pub use local::LocalCacheStore;
pub use traits::{CacheStore, StorageError, StorageResult, WriteOutcome};
