//! Path resolver
//!
//! Turns a storage download URL into the [`CanonicalPath`] used as cache key.
//! Download URLs look like
//! `https://firebasestorage.googleapis.com/v0/b/<bucket>/o/<object>?alt=media&token=...`
//! where `<object>` encodes its separators as `%2F`.

use crate::error::AppError;
use crate::models::CanonicalPath;
use percent_encoding::percent_decode_str;
use url::Url;

/// Segment separating the bucket prefix from the object name.
pub const CONTAINER_MARKER: &str = "/o/";

/// Resolve the canonical storage path of `url`.
///
/// The query string and fragment never take part in the result, so every
/// signed variant of the same object resolves to the same path.
pub fn resolve(url: &str, host_marker: &str) -> Result<CanonicalPath, AppError> {
    let parsed = Url::parse(url.trim())?;
    resolve_url(&parsed, host_marker)
}

/// Same as [`resolve`] for an already parsed URL.
pub fn resolve_url(url: &Url, host_marker: &str) -> Result<CanonicalPath, AppError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(AppError::MalformedUrl(format!(
            "Unsupported URL scheme: {}",
            url.scheme()
        )));
    }

    let authority = authority(url)
        .ok_or_else(|| AppError::MalformedUrl("URL has no host".to_string()))?;
    if !authority.eq_ignore_ascii_case(host_marker) {
        return Err(AppError::MalformedUrl(format!(
            "URL host {} is not the storage host {}",
            authority, host_marker
        )));
    }

    // url keeps the path percent-encoded, so `%2F` inside the object name is
    // still distinguishable from real separators here.
    let raw_path = url.path();
    let object = raw_path
        .find(CONTAINER_MARKER)
        .map(|idx| &raw_path[idx + CONTAINER_MARKER.len()..])
        .ok_or_else(|| {
            AppError::MalformedUrl(format!(
                "URL path {} has no object segment ({})",
                raw_path, CONTAINER_MARKER
            ))
        })?;

    let decoded = percent_decode_str(object)
        .decode_utf8()
        .map_err(|_| AppError::MalformedUrl("Object name is not valid UTF-8".to_string()))?;

    CanonicalPath::parse(decoded.into_owned())
}

/// `host` or `host:port` when the URL carries a non-default port.
pub fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
