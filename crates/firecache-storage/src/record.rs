//! On-disk record format
//!
//! One JSON document per cached object:
//! `{"content_type": "image/png", "content": "<base64>"}`. Base64 keeps the
//! payload binary-transparent inside a text container. Line breaks inside
//! `content` are tolerated on read (MIME-style base64 wraps at 76 columns).

use crate::traits::{StorageError, StorageResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use firecache_core::{CacheEntry, DEFAULT_CONTENT_TYPE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    #[serde(default)]
    content_type: Option<String>,
    content: String,
}

pub(crate) fn encode(entry: &CacheEntry) -> StorageResult<Vec<u8>> {
    let record = CacheRecord {
        content_type: Some(entry.content_type.clone()),
        content: STANDARD.encode(&entry.content),
    };
    serde_json::to_vec(&record)
        .map_err(|e| StorageError::WriteFailed(format!("Failed to encode cache record: {}", e)))
}

pub(crate) fn decode(data: &[u8]) -> StorageResult<CacheEntry> {
    let record: CacheRecord = serde_json::from_slice(data)
        .map_err(|e| StorageError::Corrupt(format!("Invalid cache record: {}", e)))?;

    let compact: String = record
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let content = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| StorageError::Corrupt(format!("Invalid base64 content: {}", e)))?;

    Ok(CacheEntry::new(
        record
            .content_type
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        content,
    ))
}
