//! Data contracts for the persisted periodicals catalog.
//!
//! Every file under the data directory is a JSON array of one of these record
//! types. Field declaration order is the on-disk key order.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Two events with the same id starting closer together than this are the
/// same occurrence.
pub const EVENT_DUPLICATE_WINDOW_SECS: f64 = 2.0 * 24.0 * 60.0 * 60.0;

/// A timed event as published to downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub end_timestamp: f64,
    pub id: String,
    pub message: String,
    pub multiplier: f64,
    pub start_timestamp: f64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub ultra: bool,
}

impl EventRecord {
    /// Whether `other` is a refetch of the same occurrence.
    pub fn is_same_occurrence(&self, other: &EventRecord) -> bool {
        self.id == other.id
            && (self.start_timestamp - other.start_timestamp).abs() < EVENT_DUPLICATE_WINDOW_SECS
    }
}

/// An opaque, base64-encoded protobuf entity keyed by its identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlobRecord {
    pub id: String,
    pub proto: String,
}

impl BlobRecord {
    pub fn new(id: impl Into<String>, proto: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            proto: proto.into(),
        }
    }
}

/// Render a collection the way it is stored: two-space indentation and a
/// trailing newline.
pub fn encode_collection_json<T: Serialize>(records: &[T]) -> serde_json::Result<String> {
    let mut text = serde_json::to_string_pretty(records)?;
    text.push('\n');
    Ok(text)
}

pub fn decode_collection_json<T: DeserializeOwned>(data: &str) -> serde_json::Result<Vec<T>> {
    serde_json::from_str(data)
}
