//! Queue Message Decoding
//!
//! Decodes inbound queue events into guide requests. Upstream producers have
//! historically delivered bodies double-encoded or littered with literal
//! escape sequences; `decode_body` accepts well-formed JSON first and only
//! falls back to the legacy normalization shim when parsing fails.

use crate::error::WorkerError;
use serde::{Deserialize, Serialize};

/// Inbound queue event: a batch of records processed in receipt order
#[derive(Debug, Clone, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueRecord>,
}

/// One queue record with an opaque string body
#[derive(Debug, Clone, Deserialize)]
pub struct QueueRecord {
    pub body: String,
}

/// A decoded guide-generation request, immutable once decoded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuideRequest {
    #[serde(rename = "projectId")]
    pub project_id: String,
    pub asset_parent: String,
    pub sections: Vec<Section>,
    pub token: String,
}

/// A named subunit of a project, mapped to an asset id used for reporting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub asset_id: String,
}

/// Decode one record body into a [`GuideRequest`].
///
/// Tolerates three shapes, tried in order: plain JSON, a JSON-encoded string
/// containing JSON (double-encoded), and the raw escape-sequence artifacts
/// some producers emit (`\"`, literal `\r\n`, stray wrapping quotes).
pub fn decode_body(body: &str) -> Result<GuideRequest, WorkerError> {
    let body = body.trim();

    if let Ok(request) = serde_json::from_str::<GuideRequest>(body) {
        return Ok(request);
    }

    if let Ok(inner) = serde_json::from_str::<String>(body) {
        if let Ok(request) = serde_json::from_str::<GuideRequest>(&inner) {
            return Ok(request);
        }
    }

    let normalized = body
        .trim_matches('"')
        .replace("\\r\\n", "")
        .replace("\\\"", "\"");

    serde_json::from_str(&normalized).map_err(|e| WorkerError::Decode(e.to_string()))
}
