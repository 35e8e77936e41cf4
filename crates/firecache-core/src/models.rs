//! Cache domain models

use crate::error::AppError;
use bytes::Bytes;
use std::fmt;

/// Content type stored when the origin does not send one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Provider-independent identifier of a stored object, used as the cache key.
///
/// Always relative, never empty and free of empty, `.` and `..` segments, so
/// it maps to a location inside any cache root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    /// Validate an already percent-decoded object path.
    pub fn parse(path: impl Into<String>) -> Result<Self, AppError> {
        let path = path.into();
        if path.is_empty() {
            return Err(AppError::MalformedUrl(
                "Storage URL does not name an object".to_string(),
            ));
        }
        if path.starts_with('/') || path.contains('\\') || path.contains('\0') {
            return Err(AppError::MalformedUrl(format!(
                "Invalid object path: {}",
                path
            )));
        }
        if path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(AppError::MalformedUrl(format!(
                "Invalid object path segment in: {}",
                path
            )));
        }
        Ok(CanonicalPath(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A cached asset: the origin's content type and the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub content_type: String,
    pub content: Bytes,
}

impl CacheEntry {
    pub fn new(content_type: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
