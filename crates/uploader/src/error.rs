//! Transport error types.

use fileagent_record::RecordError;

/// Any rejection coming back from the uploader.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("server responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record error: {0}")]
    Record(#[from] RecordError),

    #[error("rejected: {0}")]
    Rejected(String),
}
