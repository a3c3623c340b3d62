//! Orchestrator error types.

use fileagent_record::{RecordError, RecordId};
use fileagent_uploader::TransportError;

/// Errors returned by [`FileAgent`](crate::FileAgent) operations.
///
/// Hook cancellations are never errors. Transport rejections during a
/// delete or rename are rolled back and reported as a
/// [`LifecycleOutcome`](crate::LifecycleOutcome); only direct upload calls
/// return [`AgentError::Transport`].
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("record {0} is not in the collection")]
    NotFound(RecordId),

    #[error("record {0} already has an action in flight")]
    Busy(RecordId),

    #[error("index {index} out of range for {len} records")]
    OutOfRange { index: usize, len: usize },

    #[error("sorting is not enabled")]
    NotSortable,

    #[error("no uploader configured")]
    NoUploader,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("agent is disabled or readonly")]
    Inactive,

    #[error("drop resolution failed: {0}")]
    Drop(String),

    #[error("thumbnail extraction failed: {0}")]
    Thumbnail(String),

    #[error("record error: {0}")]
    Record(#[from] RecordError),
}
