//! Error types module
//!
//! All failures of the cache pipeline are unified under [`AppError`]. Each
//! variant self-describes how it should be presented over HTTP through the
//! [`ErrorMetadata`] trait, so the API crate only has to render it.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like malformed client input
    Debug,
    /// Warning level - for upstream failures outside our control
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "ORIGIN_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The client-supplied URL does not have the storage provider's shape.
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The origin answered with a non-success status.
    #[error("Origin returned {status}: {reason}")]
    Origin { status: u16, reason: String },

    #[error("Origin unavailable: {0}")]
    OriginUnavailable(String),

    #[error("Origin timed out: {0}")]
    OriginTimeout(String),

    /// A stored record could not be parsed back into an entry.
    #[error("Cache entry corrupt: {0}")]
    CacheCorrupt(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Storage(format!("IO error: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::MalformedUrl(format!("URL parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::MalformedUrl(_) => (
            400,
            "MALFORMED_URL",
            false,
            Some("Pass the storage download URL unchanged in the url parameter"),
            false,
            LogLevel::Debug,
        ),
        AppError::BadRequest(_) => (
            400,
            "BAD_REQUEST",
            false,
            Some("Check request format and parameters"),
            false,
            LogLevel::Debug,
        ),
        AppError::Origin { status, .. } => (
            *status,
            "ORIGIN_ERROR",
            *status >= 500,
            Some("Check that the object exists and the access token is still valid"),
            false,
            if *status >= 500 {
                LogLevel::Warn
            } else {
                LogLevel::Debug
            },
        ),
        AppError::OriginUnavailable(_) => (
            502,
            "ORIGIN_UNAVAILABLE",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Warn,
        ),
        AppError::OriginTimeout(_) => (
            504,
            "ORIGIN_TIMEOUT",
            true,
            Some("Retry after a short delay"),
            false,
            LogLevel::Warn,
        ),
        AppError::CacheCorrupt(_) => (
            500,
            "CACHE_CORRUPT",
            false,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::ImageProcessing(_) => (
            500,
            "IMAGE_PROCESSING_ERROR",
            false,
            Some("Request the unscaled asset instead"),
            false,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::MalformedUrl(_) => "MalformedUrl",
            AppError::BadRequest(_) => "BadRequest",
            AppError::Origin { .. } => "Origin",
            AppError::OriginUnavailable(_) => "OriginUnavailable",
            AppError::OriginTimeout(_) => "OriginTimeout",
            AppError::CacheCorrupt(_) => "CacheCorrupt",
            AppError::Storage(_) => "Storage",
            AppError::ImageProcessing(_) => "ImageProcessing",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::MalformedUrl(ref msg) => msg.clone(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::Origin { ref reason, .. } => reason.clone(),
            AppError::OriginUnavailable(_) => "Origin unavailable".to_string(),
            AppError::OriginTimeout(_) => "Origin did not respond in time".to_string(),
            AppError::CacheCorrupt(_) => "Cached asset could not be read".to_string(),
            AppError::Storage(_) => "Failed to access cache storage".to_string(),
            AppError::ImageProcessing(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}
