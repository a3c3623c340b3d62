//! Record error types.

use serde::Serialize;

/// Why a record failed validation at ingestion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationErrorKind {
    /// File is larger than the configured ceiling.
    Size,
    /// File type does not match the accept pattern.
    Type,
}

/// Validation failure attached to a record.
///
/// Never returned as `Err` from ingestion: the record is kept, flagged,
/// rendered with its error and excluded from uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl ValidationError {
    pub fn size(message: impl Into<String>) -> Self {
        Self {
            kind: ValidationErrorKind::Size,
            message: message.into(),
        }
    }

    pub fn file_type(message: impl Into<String>) -> Self {
        Self {
            kind: ValidationErrorKind::Type,
            message: message.into(),
        }
    }
}

/// A human-readable size string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid size {input:?}: {reason}")]
pub struct SizeParseError {
    pub input: String,
    pub reason: &'static str,
}

/// Errors produced while building or reading file handles.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("file has no readable content: {0}")]
    Detached(String),

    #[error(transparent)]
    Size(#[from] SizeParseError),
}
