//! Responses and progress reports.

use std::sync::Arc;

use fileagent_record::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A successful server reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: u16,
    /// Parsed JSON body, or the raw body as a string.
    pub data: Value,
}

impl UploadResponse {
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    /// Remote URL of the uploaded file: the `url` field of a JSON body, or
    /// a plain-text body.
    pub fn url(&self) -> Option<&str> {
        match &self.data {
            Value::Object(map) => map.get("url").and_then(Value::as_str),
            Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

/// Progress of one record inside an upload batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub record: RecordId,
    /// Progress of this record, 0–100.
    pub percent: u8,
    /// Progress of the whole batch, 0–100.
    pub overall: u8,
}

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;
