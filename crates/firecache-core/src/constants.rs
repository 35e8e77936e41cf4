//! Fixed values of the storage provider

/// Host of the Firebase Storage download front end.
pub const DEFAULT_STORAGE_HOST: &str = "firebasestorage.googleapis.com";

/// Extension appended to every cache record file.
pub const CACHE_FILE_EXTENSION: &str = "cache";
