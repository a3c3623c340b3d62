//! Batch ingestion: raw handles in, validated records out.

use std::io::Cursor;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::debug;

use crate::DEFAULT_THUMBNAIL_SIZE;
use crate::accept::AcceptPattern;
use crate::error::ValidationError;
use crate::handle::{FileHandle, FileSource};
use crate::record::{Dimensions, FileRecord};
use crate::size::format_size;

/// Validation settings snapshotted from the widget configuration.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Size ceiling in bytes; files strictly larger are rejected.
    pub max_size: Option<u64>,
    pub accept: AcceptPattern,
    pub thumbnail_size: u32,
    /// Probe natural dimensions of valid images while ingesting.
    pub read_dimensions: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            max_size: None,
            accept: AcceptPattern::default(),
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            read_dimensions: true,
        }
    }
}

/// Checks one handle against the size ceiling and accept pattern.
pub fn validate(file: &FileHandle, options: &ValidationOptions) -> Option<ValidationError> {
    if let Some(max) = options.max_size
        && file.size() > max
    {
        return Some(ValidationError::size(format!(
            "Files should not exceed {}",
            format_size(max)
        )));
    }
    if !options.accept.accepts(file.name(), file.mime_type()) {
        return Some(ValidationError::file_type("Invalid file type"));
    }
    None
}

/// Builds records for a whole batch.
///
/// Every handle is validated concurrently; the future completes only when
/// all records are ready, and the output keeps the input order. Invalid
/// files still produce a record, with its error set.
pub async fn ingest(files: Vec<FileHandle>, options: &ValidationOptions) -> Vec<Arc<FileRecord>> {
    join_all(files.into_iter().map(|file| build_record(file, options))).await
}

async fn build_record(file: FileHandle, options: &ValidationOptions) -> Arc<FileRecord> {
    let record = FileRecord::new(file, options.thumbnail_size);

    if let Some(error) = validate(record.file(), options) {
        debug!(file = %record.file().name(), error = %error, "file rejected");
        record.set_error(Some(error));
    } else if options.read_dimensions
        && record.is_image()
        && let Some(dimensions) = read_dimensions(record.file()).await
    {
        record.set_dimensions(dimensions);
    }

    Arc::new(record)
}

/// Reads an image header for its pixel size. Failures are ignored.
async fn read_dimensions(file: &FileHandle) -> Option<Dimensions> {
    let source = file.source().clone();
    let (width, height) = tokio::task::spawn_blocking(move || match source {
        FileSource::Path(path) => image::image_dimensions(&path).ok(),
        FileSource::Memory(bytes) => {
            let reader = image::ImageReader::new(Cursor::new(&bytes[..]))
                .with_guessed_format()
                .ok()?;
            reader.into_dimensions().ok()
        }
        FileSource::Detached => None,
    })
    .await
    .ok()
    .flatten()?;

    Some(Dimensions { width, height })
}
