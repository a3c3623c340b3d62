//! Video thumbnail extraction glue.
//!
//! The host decodes video; the agent only decides which records get a
//! thumbnail and makes sure the temporary object URL is released.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use fileagent_record::{FileHandle, FileRecord, Thumbnail};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::AgentError;

/// Videos above this size are not decoded for a thumbnail.
pub const VIDEO_THUMBNAIL_MAX_BYTES: u64 = 20 * 1024 * 1024;

pub type FrameFuture<'a> = Pin<Box<dyn Future<Output = Result<Thumbnail, AgentError>> + Send + 'a>>;

/// Host-side video frame capture.
pub trait ThumbnailExtractor: Send + Sync {
    /// Exposes the file under a temporary URL the decoder can load.
    fn create_object_url(&self, file: &FileHandle) -> Result<String, AgentError>;

    /// Loads the video and captures a frame scaled to `size`.
    fn capture_frame<'a>(&'a self, object_url: &'a str, size: u32, average_color: bool)
    -> FrameFuture<'a>;

    fn revoke_object_url(&self, object_url: &str);
}

/// Whether ingestion should extract a frame for this record.
pub fn wants_video_thumbnail(record: &FileRecord) -> bool {
    record.is_playable_video() && record.file().size() <= VIDEO_THUMBNAIL_MAX_BYTES
}

/// Captures a frame into the record's thumbnail. The object URL is
/// revoked whether or not capture succeeds.
pub async fn extract_video_thumbnail(
    extractor: &dyn ThumbnailExtractor,
    record: &FileRecord,
    average_color: bool,
) -> Result<(), AgentError> {
    let url = extractor.create_object_url(record.file())?;
    let frame = extractor
        .capture_frame(&url, record.thumbnail_size(), average_color)
        .await;
    extractor.revoke_object_url(&url);
    record.set_thumbnail(frame?);
    debug!(record = %record.id(), "video thumbnail ready");
    Ok(())
}

/// Fire-and-forget extraction; failures are logged and swallowed.
pub(crate) fn spawn_video_thumbnail(
    extractor: Arc<dyn ThumbnailExtractor>,
    record: Arc<FileRecord>,
    average_color: bool,
) -> Option<JoinHandle<()>> {
    if !wants_video_thumbnail(&record) {
        return None;
    }
    Some(tokio::spawn(async move {
        if let Err(e) = extract_video_thumbnail(extractor.as_ref(), &record, average_color).await {
            warn!(record = %record.id(), error = %e, "video thumbnail failed");
        }
    }))
}
