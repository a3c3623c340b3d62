//! The file record value object.

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::handle::FileHandle;
use crate::size::format_size;
use crate::slots::{ChangeHandler, ChangeSlots, RecordField};

/// Video containers the preview can play back (and extract frames from).
const PLAYABLE_VIDEO_TYPES: [&str; 3] = ["video/mp4", "video/webm", "video/ogg"];

/// Stable identifier generated for every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Natural pixel dimensions of an image or video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A generated preview image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thumbnail {
    /// Data URL or object URL of the rendered thumbnail.
    pub url: String,
    /// Natural dimensions of the source media.
    pub dimensions: Dimensions,
    /// Average RGB colour, when requested.
    pub average_color: Option<[u8; 3]>,
}

/// Upload lifecycle state of a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadState {
    #[default]
    Idle,
    Uploading,
    Uploaded,
    Deleting,
    Renaming,
}

#[derive(Debug, Default)]
struct RecordState {
    error: Option<ValidationError>,
    thumbnail: Option<Thumbnail>,
    dimensions: Option<Dimensions>,
    custom_name: Option<String>,
    /// Display name before an uncommitted rename (`Some(None)` = file name).
    rename_shadow: Option<Option<String>>,
    progress: Option<u8>,
    url: Option<String>,
    upload_data: Option<Value>,
    upload_state: UploadState,
}

/// One file in the widget plus everything derived from it.
///
/// Records are shared (`Arc<FileRecord>`) between the orchestrator, the
/// caller and background tasks; all mutable state sits behind a lock and
/// every mutator notifies the matching change slot after releasing it.
pub struct FileRecord {
    id: RecordId,
    file: FileHandle,
    thumbnail_size: u32,
    state: Mutex<RecordState>,
    slots: Mutex<ChangeSlots>,
}

impl FileRecord {
    pub fn new(file: FileHandle, thumbnail_size: u32) -> Self {
        Self {
            id: RecordId::new(),
            file,
            thumbnail_size,
            state: Mutex::new(RecordState::default()),
            slots: Mutex::new(ChangeSlots::default()),
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn file(&self) -> &FileHandle {
        &self.file
    }

    pub fn thumbnail_size(&self) -> u32 {
        self.thumbnail_size
    }

    // -----------------------------------------------------------------------
    // Change slots
    // -----------------------------------------------------------------------

    /// Binds the single subscriber for `field`.
    pub fn on_change(&self, field: RecordField, handler: ChangeHandler) {
        self.slots.lock().unwrap().set(field, handler);
    }

    pub fn off_change(&self, field: RecordField) {
        self.slots.lock().unwrap().clear(field);
    }

    /// Unbinds every slot.
    pub fn clear_handlers(&self) {
        self.slots.lock().unwrap().clear_all();
    }

    pub fn bound_handlers(&self) -> usize {
        self.slots.lock().unwrap().bound()
    }

    fn notify(&self, field: RecordField) {
        let handler = self.slots.lock().unwrap().get(field);
        if let Some(handler) = handler {
            handler();
        }
    }

    // -----------------------------------------------------------------------
    // Name
    // -----------------------------------------------------------------------

    /// Display name: the custom name if renamed, otherwise the file name.
    pub fn name(&self) -> String {
        self.state
            .lock()
            .unwrap()
            .custom_name
            .clone()
            .unwrap_or_else(|| self.file.name().to_string())
    }

    pub fn name_without_extension(&self) -> String {
        let name = self.name();
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => name,
        }
    }

    /// Lowercased extension of the underlying file.
    pub fn extension(&self) -> String {
        self.file.extension()
    }

    /// Optimistically renames the record, keeping the file's extension.
    ///
    /// The previous display name is kept as a shadow until
    /// [`commit_rename`](Self::commit_rename) or
    /// [`revert_rename`](Self::revert_rename).
    pub fn rename(&self, name_without_extension: &str) {
        let original = self.file.name();
        let new_name = match original.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => format!("{name_without_extension}.{ext}"),
            _ => name_without_extension.to_string(),
        };
        {
            let mut state = self.state.lock().unwrap();
            if state.rename_shadow.is_none() {
                state.rename_shadow = Some(state.custom_name.clone());
            }
            state.custom_name = Some(new_name);
        }
        self.notify(RecordField::Name);
    }

    pub fn is_renaming(&self) -> bool {
        self.state.lock().unwrap().rename_shadow.is_some()
    }

    /// Drops the rename shadow; the current name becomes authoritative.
    pub fn commit_rename(&self) {
        self.state.lock().unwrap().rename_shadow = None;
    }

    /// Restores the name from before the pending rename.
    ///
    /// Returns `false` if no rename was pending.
    pub fn revert_rename(&self) -> bool {
        let reverted = {
            let mut state = self.state.lock().unwrap();
            match state.rename_shadow.take() {
                Some(previous) => {
                    state.custom_name = previous;
                    true
                }
                None => false,
            }
        };
        if reverted {
            self.notify(RecordField::Name);
        }
        reverted
    }

    // -----------------------------------------------------------------------
    // Derived state
    // -----------------------------------------------------------------------

    pub fn error(&self) -> Option<ValidationError> {
        self.state.lock().unwrap().error.clone()
    }

    pub fn set_error(&self, error: Option<ValidationError>) {
        self.state.lock().unwrap().error = error;
        self.notify(RecordField::Error);
    }

    /// Records with a validation error are never uploaded.
    pub fn is_valid(&self) -> bool {
        self.state.lock().unwrap().error.is_none()
    }

    pub fn progress(&self) -> Option<u8> {
        self.state.lock().unwrap().progress
    }

    /// Sets upload progress, clamped to 100.
    pub fn set_progress(&self, percent: u8) {
        self.state.lock().unwrap().progress = Some(percent.min(100));
        self.notify(RecordField::Progress);
    }

    pub fn clear_progress(&self) {
        self.state.lock().unwrap().progress = None;
        self.notify(RecordField::Progress);
    }

    pub fn url(&self) -> Option<String> {
        self.state.lock().unwrap().url.clone()
    }

    pub fn set_url(&self, url: Option<String>) {
        self.state.lock().unwrap().url = url;
        self.notify(RecordField::Url);
    }

    pub fn thumbnail(&self) -> Option<Thumbnail> {
        self.state.lock().unwrap().thumbnail.clone()
    }

    /// Sets the thumbnail; also fills in natural dimensions if unknown.
    pub fn set_thumbnail(&self, thumbnail: Thumbnail) {
        let dimensions_changed = {
            let mut state = self.state.lock().unwrap();
            let fill = state.dimensions.is_none();
            if fill {
                state.dimensions = Some(thumbnail.dimensions);
            }
            state.thumbnail = Some(thumbnail);
            fill
        };
        self.notify(RecordField::Thumbnail);
        if dimensions_changed {
            self.notify(RecordField::Dimensions);
        }
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.state.lock().unwrap().dimensions
    }

    pub fn set_dimensions(&self, dimensions: Dimensions) {
        self.state.lock().unwrap().dimensions = Some(dimensions);
        self.notify(RecordField::Dimensions);
    }

    /// Server data returned by the last successful upload.
    pub fn upload_data(&self) -> Option<Value> {
        self.state.lock().unwrap().upload_data.clone()
    }

    pub fn set_upload_data(&self, data: Option<Value>) {
        self.state.lock().unwrap().upload_data = data;
    }

    pub fn upload_state(&self) -> UploadState {
        self.state.lock().unwrap().upload_state
    }

    pub fn set_upload_state(&self, upload_state: UploadState) {
        self.state.lock().unwrap().upload_state = upload_state;
    }

    // -----------------------------------------------------------------------
    // File type helpers
    // -----------------------------------------------------------------------

    pub fn size_text(&self) -> String {
        format_size(self.file.size())
    }

    pub fn is_image(&self) -> bool {
        self.file.mime_type().starts_with("image/")
    }

    pub fn is_video(&self) -> bool {
        self.file.mime_type().starts_with("video/")
    }

    pub fn is_playable_video(&self) -> bool {
        let mime_type = self.file.mime_type();
        PLAYABLE_VIDEO_TYPES.iter().any(|t| *t == mime_type)
    }
}

impl fmt::Debug for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("FileRecord")
            .field("id", &self.id)
            .field("file", &self.file.name())
            .field("size", &self.file.size())
            .field("custom_name", &state.custom_name)
            .field("error", &state.error)
            .field("progress", &state.progress)
            .field("upload_state", &state.upload_state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(name: &str, mime: &str) -> FileRecord {
        FileRecord::new(FileHandle::new(name, 2048, mime, 0), 360)
    }

    fn counter(record: &FileRecord, field: RecordField) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        record.on_change(field, Arc::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        hits
    }

    #[test]
    fn rename_keeps_extension_and_reverts() {
        let rec = record("holiday.jpg", "image/jpeg");
        let hits = counter(&rec, RecordField::Name);

        rec.rename("beach");
        assert_eq!(rec.name(), "beach.jpg");
        assert_eq!(rec.name_without_extension(), "beach");
        assert!(rec.is_renaming());

        assert!(rec.revert_rename());
        assert_eq!(rec.name(), "holiday.jpg");
        assert!(!rec.is_renaming());
        assert!(!rec.revert_rename());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn second_rename_keeps_first_shadow() {
        let rec = record("a.txt", "text/plain");
        rec.rename("b");
        rec.commit_rename();
        rec.rename("c");
        rec.rename("d");
        assert_eq!(rec.name(), "d.txt");
        rec.revert_rename();
        assert_eq!(rec.name(), "b.txt");
    }

    #[test]
    fn rename_without_extension() {
        let rec = record("Makefile", "");
        rec.rename("Rules");
        assert_eq!(rec.name(), "Rules");
    }

    #[test]
    fn progress_is_clamped_and_notifies() {
        let rec = record("a.bin", "");
        let hits = counter(&rec, RecordField::Progress);
        rec.set_progress(150);
        assert_eq!(rec.progress(), Some(100));
        rec.clear_progress();
        assert_eq!(rec.progress(), None);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn thumbnail_fills_dimensions_once() {
        let rec = record("clip.mp4", "video/mp4");
        let dims = counter(&rec, RecordField::Dimensions);
        let thumbs = counter(&rec, RecordField::Thumbnail);

        rec.set_thumbnail(Thumbnail {
            url: "data:image/png;base64,AAAA".into(),
            dimensions: Dimensions { width: 640, height: 360 },
            average_color: None,
        });
        assert_eq!(rec.dimensions(), Some(Dimensions { width: 640, height: 360 }));

        rec.set_thumbnail(Thumbnail {
            url: "data:image/png;base64,BBBB".into(),
            dimensions: Dimensions { width: 1, height: 1 },
            average_color: Some([1, 2, 3]),
        });
        assert_eq!(rec.dimensions(), Some(Dimensions { width: 640, height: 360 }));
        assert_eq!(thumbs.load(Ordering::SeqCst), 2);
        assert_eq!(dims.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn error_marks_record_invalid() {
        let rec = record("big.iso", "");
        let hits = counter(&rec, RecordField::Error);
        assert!(rec.is_valid());
        rec.set_error(Some(ValidationError::size("too big")));
        assert!(!rec.is_valid());
        assert_eq!(rec.error().unwrap().to_string(), "too big");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_may_read_record_state() {
        let rec = Arc::new(record("a.png", "image/png"));
        let seen = Arc::new(Mutex::new(None));
        let weak = Arc::downgrade(&rec);
        let sink = seen.clone();
        rec.on_change(RecordField::Url, Arc::new(move || {
            if let Some(r) = weak.upgrade() {
                *sink.lock().unwrap() = r.url();
            }
        }));
        rec.set_url(Some("https://cdn.example/a.png".into()));
        assert_eq!(
            seen.lock().unwrap().as_deref(),
            Some("https://cdn.example/a.png")
        );
    }

    #[test]
    fn type_helpers() {
        assert!(record("a.png", "image/png").is_image());
        assert!(record("a.mp4", "video/mp4").is_playable_video());
        assert!(record("a.mkv", "video/x-matroska").is_video());
        assert!(!record("a.mkv", "video/x-matroska").is_playable_video());
        assert_eq!(record("a.bin", "").size_text(), "2 KB");
    }
}
