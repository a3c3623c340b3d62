//! Replaceable fragments injected around and inside the widget.

use std::fmt;
use std::sync::Arc;

use fileagent_record::FileRecord;

use crate::surface::NodeId;

/// Static slot containers around the file list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotName {
    BeforeOuter,
    BeforeInner,
    AfterInner,
    AfterOuter,
}

impl SlotName {
    pub const ALL: [SlotName; 4] = [
        SlotName::BeforeOuter,
        SlotName::BeforeInner,
        SlotName::AfterInner,
        SlotName::AfterOuter,
    ];
}

/// Literal markup or an element already built on the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotContent {
    Markup(String),
    Element(NodeId),
}

impl From<&str> for SlotContent {
    fn from(markup: &str) -> Self {
        SlotContent::Markup(markup.to_string())
    }
}

impl From<String> for SlotContent {
    fn from(markup: String) -> Self {
        SlotContent::Markup(markup)
    }
}

/// Custom preview for one record, given its position in the collection.
pub type PreviewSlot = Arc<dyn Fn(&Arc<FileRecord>, usize) -> SlotContent + Send + Sync>;

#[derive(Clone, Default)]
pub struct Slots {
    pub before_outer: Option<SlotContent>,
    pub before_inner: Option<SlotContent>,
    pub after_inner: Option<SlotContent>,
    pub after_outer: Option<SlotContent>,
    /// Replaces the built-in "add file" tile.
    pub file_preview_new: Option<SlotContent>,
    /// Replaces the built-in preview of every record.
    pub file_preview: Option<PreviewSlot>,
}

impl Slots {
    pub fn get(&self, name: SlotName) -> Option<&SlotContent> {
        match name {
            SlotName::BeforeOuter => self.before_outer.as_ref(),
            SlotName::BeforeInner => self.before_inner.as_ref(),
            SlotName::AfterInner => self.after_inner.as_ref(),
            SlotName::AfterOuter => self.after_outer.as_ref(),
        }
    }

    pub fn set(&mut self, name: SlotName, content: impl Into<SlotContent>) {
        let content = Some(content.into());
        match name {
            SlotName::BeforeOuter => self.before_outer = content,
            SlotName::BeforeInner => self.before_inner = content,
            SlotName::AfterInner => self.after_inner = content,
            SlotName::AfterOuter => self.after_outer = content,
        }
    }

    pub fn with_file_preview(
        mut self,
        f: impl Fn(&Arc<FileRecord>, usize) -> SlotContent + Send + Sync + 'static,
    ) -> Self {
        self.file_preview = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slots")
            .field("before_outer", &self.before_outer)
            .field("before_inner", &self.before_inner)
            .field("after_inner", &self.after_inner)
            .field("after_outer", &self.after_outer)
            .field("file_preview_new", &self.file_preview_new)
            .field("file_preview", &self.file_preview.is_some())
            .finish()
    }
}
