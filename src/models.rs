//! Core data models used throughout the gateway.
//!
//! These types represent the assets, index counters, and conversational
//! payloads that flow between the HTTP surface, the pipeline store, and
//! the worker bridge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a stored file lives on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetLocation {
    Uploaded,
    Scraped,
}

impl fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetLocation::Uploaded => write!(f, "uploaded"),
            AssetLocation::Scraped => write!(f, "scraped"),
        }
    }
}

/// A stored file: an administrator upload or scraper output.
///
/// Names are unique within a location; the same name may exist in both.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataAsset {
    pub name: String,
    pub size_bytes: u64,
    pub extension: String,
    pub modified_at: DateTime<Utc>,
    pub location: AssetLocation,
}

/// Aggregate counters reported by the reindex worker.
///
/// The physical artifacts (vector index + chunk store) live in the
/// vectorstore directory and are rebuilt wholesale; these counters are
/// never patched incrementally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexState {
    pub chunk_count: u64,
    pub file_count: u64,
}

/// One turn of conversation context supplied by the chat client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatTurn {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub text: String,
}

/// The reply contract of the chat endpoint. Always well-formed, even when
/// the inference worker is down.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub text: String,
    #[serde(rename = "followUps")]
    pub follow_ups: Vec<String>,
}

/// Result of a bulk asset deletion. Every requested name lands in exactly
/// one of: the deleted count or the error list.
#[derive(Debug, Clone, Default)]
pub struct BatchDeleteOutcome {
    pub deleted_count: usize,
    pub errors: Vec<String>,
}

/// One row of the query-frequency analytics report.
#[derive(Debug, Clone, Serialize)]
pub struct QueryCount {
    pub query: String,
    pub count: i64,
}
