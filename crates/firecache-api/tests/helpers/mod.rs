//! Test helpers: a mockito origin standing in for the storage front end and a
//! TestServer wired to it.
//!
//! Run from workspace root: `cargo test -p firecache-api --test proxy_test`.

use axum_test::TestServer;
use firecache_api::setup;
use firecache_core::{CacheConfig, Config, ProxyConfig};
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

pub struct TestApp {
    pub server: TestServer,
    pub origin: mockito::ServerGuard,
    pub cache_root: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Download URL for `object` as the storage front end would hand it out.
    pub fn download_url(&self, object: &str, token: &str) -> String {
        format!(
            "{}/v0/b/bkt/o/{}?alt=media&token={}",
            self.origin.url(),
            object,
            token
        )
    }

    /// Request path for the plain endpoint, nested URL left unencoded.
    pub fn asset_path(&self, object: &str, token: &str) -> String {
        format!("/?url={}", self.download_url(object, token))
    }

    pub fn scale_path(&self, size: &str, object: &str, token: &str) -> String {
        format!("/scale/{}?url={}", size, self.download_url(object, token))
    }
}

pub async fn setup_test_app() -> TestApp {
    let origin = mockito::Server::new_async().await;
    let temp_dir = TempDir::new().unwrap();
    let cache_root = temp_dir.path().join("cache");

    let config = Config(Box::new(ProxyConfig {
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        http_concurrency_limit: 100,
        environment: "test".to_string(),
        cache: CacheConfig::new(&cache_root, origin.host_with_port())
            .with_origin_timeout(Duration::from_secs(5)),
    }));

    let (_state, router) = setup::build_app(config).await.unwrap();
    let server = TestServer::new(router).unwrap();

    TestApp {
        server,
        origin,
        cache_root,
        _temp_dir: temp_dir,
    }
}

pub fn create_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([40, 120, 200]),
    ));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .unwrap();
    buffer
}
