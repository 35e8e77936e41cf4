//! Origin fetcher
//!
//! Talks to the storage front end with the caller's own signed URL. The
//! origin's status is never collapsed into a generic failure: a 403 from the
//! origin is a 403 to the client.

use async_trait::async_trait;
use firecache_core::{AppError, CacheEntry, DEFAULT_CONTENT_TYPE};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

/// Outbound access to the storage origin.
///
/// Only a `200 OK` counts as success; any other status is the origin's answer.
#[async_trait]
pub trait OriginClient: Send + Sync {
    /// GET the object; the whole body is read before returning.
    async fn fetch(&self, url: &Url) -> Result<CacheEntry, AppError>;

    /// HEAD the object to prove the URL's access grant is still valid.
    async fn head_check(&self, url: &Url) -> Result<(), AppError>;
}

/// [`OriginClient`] over HTTP(S).
#[derive(Clone)]
pub struct HttpOriginClient {
    client: reqwest::Client,
}

impl HttpOriginClient {
    /// Every request, body included, is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn status_error(status: StatusCode) -> AppError {
        AppError::Origin {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    fn transport_error(err: reqwest::Error, url: &Url) -> AppError {
        let target = loggable(url);
        if err.is_timeout() {
            tracing::warn!(url = %target, error = %err, "Origin request timed out");
            AppError::OriginTimeout(target)
        } else {
            tracing::warn!(url = %target, error = %err, "Origin request failed");
            AppError::OriginUnavailable(format!("{}: {}", target, err))
        }
    }
}

/// URL without its query string; the query carries access tokens.
fn loggable(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}

#[async_trait]
impl OriginClient for HttpOriginClient {
    async fn fetch(&self, url: &Url) -> Result<CacheEntry, AppError> {
        let start = std::time::Instant::now();
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Self::transport_error(e, url))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(url = %loggable(url), status = status.as_u16(), "Origin rejected fetch");
            return Err(Self::status_error(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let content = response
            .bytes()
            .await
            .map_err(|e| Self::transport_error(e, url))?;

        tracing::info!(
            url = %loggable(url),
            content_type = %content_type,
            size_bytes = content.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Fetched asset from origin"
        );

        Ok(CacheEntry::new(content_type, content))
    }

    async fn head_check(&self, url: &Url) -> Result<(), AppError> {
        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|e| Self::transport_error(e, url))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(url = %loggable(url), status = status.as_u16(), "Origin rejected access check");
            return Err(Self::status_error(status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client() -> HttpOriginClient {
        HttpOriginClient::new(Duration::from_secs(5)).unwrap()
    }

    fn object_url(server: &mockito::ServerGuard) -> Url {
        Url::parse(&format!(
            "{}/v0/b/bkt/o/a%2Fb.png?alt=media&token=abc",
            server.url()
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_content_type() {
        let mut server = mockito::Server::new_async().await;
        let body: Vec<u8> = vec![0x89, b'P', b'N', b'G', 0x00, 0xFF];
        let mock = server
            .mock("GET", Matcher::Regex(r"^/v0/b/bkt/o/a%2Fb\.png".to_string()))
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("alt".into(), "media".into()),
                Matcher::UrlEncoded("token".into(), "abc".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(body.clone())
            .create_async()
            .await;

        let entry = client().fetch(&object_url(&server)).await.unwrap();
        assert_eq!(entry.content_type, "image/png");
        assert_eq!(entry.content.as_ref(), body.as_slice());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_defaults_missing_content_type() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(200)
            .with_body("raw")
            .create_async()
            .await;

        let entry = client().fetch(&object_url(&server)).await.unwrap();
        assert_eq!(entry.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(entry.content.as_ref(), b"raw");
    }

    #[tokio::test]
    async fn test_fetch_forwards_origin_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":404,"message":"Not Found."}}"#)
            .create_async()
            .await;

        let err = client().fetch(&object_url(&server)).await.unwrap_err();
        match err {
            AppError::Origin { status, reason } => {
                assert_eq!(status, 404);
                assert_eq!(reason, "Not Found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_head_check_uses_head() {
        let mut server = mockito::Server::new_async().await;
        let head = server
            .mock("HEAD", Matcher::Any)
            .with_status(200)
            .create_async()
            .await;
        let get = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        client().head_check(&object_url(&server)).await.unwrap();
        head.assert_async().await;
        get.assert_async().await;
    }

    #[tokio::test]
    async fn test_head_check_rejection() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("HEAD", Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let err = client().head_check(&object_url(&server)).await.unwrap_err();
        assert!(matches!(err, AppError::Origin { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_origin() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{}/v0/b/bkt/o/x", port)).unwrap();
        let err = client().fetch(&url).await.unwrap_err();
        assert!(matches!(err, AppError::OriginUnavailable(_)));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_ok_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(204)
            .create_async()
            .await;

        let err = client().fetch(&object_url(&server)).await.unwrap_err();
        assert!(matches!(err, AppError::Origin { status: 204, .. }));
    }

    /// Accepts connections and never answers.
    async fn silent_origin() -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        Url::parse(&format!("http://{}/v0/b/bkt/o/a%2Fb.png?alt=media&token=abc", addr)).unwrap()
    }

    #[tokio::test]
    async fn test_slow_origin_times_out() {
        let url = silent_origin().await;
        let client = HttpOriginClient::new(Duration::from_millis(200)).unwrap();

        let err = client.fetch(&url).await.unwrap_err();
        assert!(matches!(err, AppError::OriginTimeout(_)), "got {err:?}");

        let err = client.head_check(&url).await.unwrap_err();
        assert!(matches!(err, AppError::OriginTimeout(_)), "got {err:?}");
    }

    #[test]
    fn test_loggable_strips_token() {
        let url = Url::parse("https://h.test/v0/b/bkt/o/a?alt=media&token=secret").unwrap();
        assert_eq!(loggable(&url), "https://h.test/v0/b/bkt/o/a");
    }
}
