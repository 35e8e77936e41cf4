//! Asset cache orchestrator
//!
//! Cold path: fetch from the origin and store. Warm path: the bytes come from
//! disk, but only after a HEAD with the caller's URL succeeds at the origin,
//! so a cached copy never outlives the caller's access grant.

use crate::origin::{HttpOriginClient, OriginClient};
use firecache_core::resolver::authority;
use firecache_core::{download_url, resolve_url, AppError, CacheConfig, CacheEntry};
use firecache_storage::{CacheStore, LocalCacheStore, WriteOutcome};
use std::sync::Arc;
use url::Url;

#[derive(Clone)]
pub struct AssetCache {
    store: Arc<dyn CacheStore>,
    origin: Arc<dyn OriginClient>,
    storage_host: String,
}

impl AssetCache {
    pub fn new(
        store: Arc<dyn CacheStore>,
        origin: Arc<dyn OriginClient>,
        storage_host: impl Into<String>,
    ) -> Self {
        Self {
            store,
            origin,
            storage_host: storage_host.into(),
        }
    }

    /// Build the filesystem store and HTTP origin client for `config`.
    ///
    /// Creates the cache root when it does not exist yet.
    pub async fn setup(config: &CacheConfig) -> Result<Self, AppError> {
        let store = LocalCacheStore::new(config.cache_root.clone()).await?;
        let origin = HttpOriginClient::new(config.origin_timeout)?;
        Ok(Self::new(
            Arc::new(store),
            Arc::new(origin),
            config.storage_host.clone(),
        ))
    }

    /// Return the asset for `origin_url`, fetching it on a miss.
    ///
    /// `origin_url` is the decoded `url` parameter; `request_query` is the raw
    /// request query from which the URL forwarded to the origin is rebuilt.
    /// The cache slot is resolved from the forwarded URL, which still carries
    /// the object name's escapes. No bytes are returned unless the origin
    /// accepted the caller's URL during this call.
    pub async fn get_asset(
        &self,
        origin_url: &str,
        request_query: &str,
    ) -> Result<CacheEntry, AppError> {
        let forward = download_url(request_query)?;
        let path = resolve_url(&forward, &self.storage_host)?;

        // Decoding may have turned `%23` into a fragment, so only the host is compared.
        let declared = Url::parse(origin_url.trim())?;
        if authority(&declared) != authority(&forward) {
            return Err(AppError::MalformedUrl(format!(
                "Forwarded URL does not target host {}",
                declared.host_str().unwrap_or_default()
            )));
        }

        if self.store.exists(&path).await? {
            self.origin.head_check(&forward).await?;
            tracing::debug!(path = %path, "Cache hit revalidated at origin");
        } else {
            let entry = self.origin.fetch(&forward).await?;
            match self.store.write(&path, &entry).await? {
                WriteOutcome::Written => {
                    tracing::info!(path = %path, size_bytes = entry.len(), "Cached asset")
                }
                WriteOutcome::AlreadyPresent => {
                    tracing::debug!(path = %path, "Asset cached by a concurrent request")
                }
            }
        }

        // Served from disk on both paths so a lost write race yields the winner.
        Ok(self.store.read(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;
    use url::Url;

    const HOST: &str = "storage.test";

    #[derive(Default)]
    struct FakeOrigin {
        fetches: AtomicUsize,
        heads: AtomicUsize,
        fetch_status: Mutex<Option<u16>>,
        head_status: Mutex<Option<u16>>,
        last_url: Mutex<Option<String>>,
    }

    impl FakeOrigin {
        fn fail_fetch(&self, status: u16) {
            *self.fetch_status.lock().unwrap() = Some(status);
        }

        fn fail_head(&self, status: u16) {
            *self.head_status.lock().unwrap() = Some(status);
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn heads(&self) -> usize {
            self.heads.load(Ordering::SeqCst)
        }

        fn rejection(status: u16) -> AppError {
            AppError::Origin {
                status,
                reason: "Rejected".to_string(),
            }
        }
    }

    #[async_trait]
    impl OriginClient for FakeOrigin {
        async fn fetch(&self, url: &Url) -> Result<CacheEntry, AppError> {
            *self.last_url.lock().unwrap() = Some(url.to_string());
            let n = self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = *self.fetch_status.lock().unwrap() {
                return Err(Self::rejection(status));
            }
            // Each fetch yields distinct bytes so racing writers are observable.
            Ok(CacheEntry::new("image/png", format!("payload-{n}").into_bytes()))
        }

        async fn head_check(&self, url: &Url) -> Result<(), AppError> {
            *self.last_url.lock().unwrap() = Some(url.to_string());
            self.heads.fetch_add(1, Ordering::SeqCst);
            match *self.head_status.lock().unwrap() {
                Some(status) => Err(Self::rejection(status)),
                None => Ok(()),
            }
        }
    }

    async fn setup() -> (AssetCache, Arc<FakeOrigin>, Arc<LocalCacheStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(LocalCacheStore::new(dir.path()).await.unwrap());
        let origin = Arc::new(FakeOrigin::default());
        let cache = AssetCache::new(store.clone(), origin.clone(), HOST);
        (cache, origin, store, dir)
    }

    fn origin_url(token: &str) -> String {
        format!("https://{HOST}/v0/b/bkt/o/a%2Fb.png?alt=media&token={token}")
    }

    fn query(token: &str) -> String {
        format!("url={}", origin_url(token))
    }

    #[tokio::test]
    async fn test_cold_request_fetches_once_and_stores() {
        let (cache, origin, store, _dir) = setup().await;

        let entry = cache.get_asset(&origin_url("t1"), &query("t1")).await.unwrap();
        assert_eq!(entry.content.as_ref(), b"payload-0");
        assert_eq!(entry.content_type, "image/png");
        assert_eq!(origin.fetches(), 1);
        assert_eq!(origin.heads(), 0);

        let path = firecache_core::CanonicalPath::parse("a/b.png").unwrap();
        assert!(store.exists(&path).await.unwrap());
        assert_eq!(
            origin.last_url.lock().unwrap().as_deref(),
            Some(origin_url("t1").as_str())
        );
    }

    #[tokio::test]
    async fn test_warm_request_revalidates_without_refetching() {
        let (cache, origin, _store, _dir) = setup().await;

        let first = cache.get_asset(&origin_url("t1"), &query("t1")).await.unwrap();
        let second = cache.get_asset(&origin_url("t2"), &query("t2")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(origin.fetches(), 1);
        assert_eq!(origin.heads(), 1);
        // The second caller's own token is what gets checked.
        assert_eq!(
            origin.last_url.lock().unwrap().as_deref(),
            Some(origin_url("t2").as_str())
        );
    }

    #[tokio::test]
    async fn test_revoked_access_withholds_cached_bytes() {
        let (cache, origin, _store, _dir) = setup().await;
        cache.get_asset(&origin_url("t1"), &query("t1")).await.unwrap();

        origin.fail_head(403);
        let err = cache
            .get_asset(&origin_url("expired"), &query("expired"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Origin { status: 403, .. }));
        assert_eq!(origin.fetches(), 1);
    }

    #[tokio::test]
    async fn test_origin_failure_is_not_cached() {
        let (cache, origin, store, _dir) = setup().await;

        origin.fail_fetch(404);
        let err = cache.get_asset(&origin_url("t"), &query("t")).await.unwrap_err();
        assert!(matches!(err, AppError::Origin { status: 404, .. }));

        let path = firecache_core::CanonicalPath::parse("a/b.png").unwrap();
        assert!(!store.exists(&path).await.unwrap());

        // A later request goes back to the origin.
        *origin.fetch_status.lock().unwrap() = None;
        cache.get_asset(&origin_url("t"), &query("t")).await.unwrap();
        assert_eq!(origin.fetches(), 2);
    }

    #[tokio::test]
    async fn test_declared_url_on_other_host_is_rejected() {
        let (cache, origin, _store, _dir) = setup().await;

        let declared = "https://evil.test/v0/b/bkt/o/a%2Fb.png?alt=media&token=t";
        let err = cache.get_asset(declared, &query("t")).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedUrl(_)));
        assert_eq!(origin.fetches() + origin.heads(), 0);
    }

    #[tokio::test]
    async fn test_object_name_with_hash_uses_raw_query() {
        let (cache, origin, store, _dir) = setup().await;

        let raw = format!("https://{HOST}/v0/b/bkt/o/photos%2Fsummer%20%231.png?alt=media&token=t");
        // What form decoding of the `url` parameter yields.
        let decoded = format!("https://{HOST}/v0/b/bkt/o/photos/summer #1.png?alt=media&token=t");

        let entry = cache.get_asset(&decoded, &format!("url={raw}")).await.unwrap();
        assert_eq!(entry.content.as_ref(), b"payload-0");

        let path = firecache_core::CanonicalPath::parse("photos/summer #1.png").unwrap();
        assert!(store.exists(&path).await.unwrap());
        assert_eq!(origin.last_url.lock().unwrap().as_deref(), Some(raw.as_str()));
    }

    #[tokio::test]
    async fn test_object_name_with_plus_uses_raw_query() {
        let (cache, origin, store, _dir) = setup().await;

        let raw = format!("https://{HOST}/v0/b/bkt/o/a+b.png?alt=media&token=t");
        let decoded = format!("https://{HOST}/v0/b/bkt/o/a b.png?alt=media&token=t");

        cache.get_asset(&decoded, &format!("url={raw}")).await.unwrap();

        let path = firecache_core::CanonicalPath::parse("a+b.png").unwrap();
        assert!(store.exists(&path).await.unwrap());
        let other = firecache_core::CanonicalPath::parse("a b.png").unwrap();
        assert!(!store.exists(&other).await.unwrap());
        assert_eq!(origin.last_url.lock().unwrap().as_deref(), Some(raw.as_str()));
    }

    #[tokio::test]
    async fn test_foreign_host_never_reaches_origin() {
        let (cache, origin, _store, _dir) = setup().await;

        let url = "https://evil.test/v0/b/bkt/o/a%2Fb.png?token=t";
        let err = cache.get_asset(url, &format!("url={url}")).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedUrl(_)));
        assert_eq!(origin.fetches() + origin.heads(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_cold_requests_converge() {
        let (cache, origin, _store, _dir) = setup().await;

        let tasks = (0..8).map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let token = format!("t{i}");
                cache.get_asset(&origin_url(&token), &query(&token)).await
            })
        });
        let results: Vec<CacheEntry> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        assert!(origin.fetches() >= 1);
        assert!(results.windows(2).all(|w| w[0] == w[1]));

        // Later hits keep serving the winner.
        let later = cache.get_asset(&origin_url("z"), &query("z")).await.unwrap();
        assert_eq!(later, results[0]);
    }
}
