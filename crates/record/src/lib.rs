//! File records for the file agent.
//!
//! A [`FileRecord`] wraps one selected [`FileHandle`] together with the
//! state derived from it: validation error, thumbnail, natural dimensions,
//! editable display name, upload progress and remote URL. Whoever mutates
//! one of those attributes notifies the single subscriber bound to the
//! matching [`ChangeSlots`] entry (in practice, the preview currently
//! rendering the record).
//!
//! Ingestion turns a batch of raw handles into validated records
//! concurrently; see [`ingest`].

mod accept;
mod error;
mod handle;
mod ingest;
mod record;
mod size;
mod slots;

pub use accept::AcceptPattern;
pub use error::{RecordError, SizeParseError, ValidationError, ValidationErrorKind};
pub use handle::{FileHandle, FileIdentity, FileSource};
pub use ingest::{ValidationOptions, ingest, validate};
pub use record::{Dimensions, FileRecord, RecordId, Thumbnail, UploadState};
pub use size::{format_size, parse_size};
pub use slots::{ChangeHandler, ChangeSlots, RecordField};

/// Default thumbnail edge length in pixels.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 360;
