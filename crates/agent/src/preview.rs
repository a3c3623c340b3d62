//! Built-in preview component for one record.

use std::sync::{Arc, Weak};

use fileagent_record::{FileRecord, RecordField};

use crate::surface::{ElementRef, NodeId, PreviewPatch, PreviewView, RenderSurface, SharedSurface};

/// Classes every preview wrapper node carries.
pub const PREVIEW_WRAPPER_CLASSES: [&str; 3] = [
    "file-preview-wrapper",
    "grid-box-item-for-transition",
    "grid-block",
];

/// Display flags a preview is created with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewProps {
    pub average_color: bool,
    pub deletable: bool,
    pub editable: bool,
    pub linkable: bool,
    pub disabled: bool,
    pub meta: bool,
}

/// Renders one record into its node and keeps it in sync.
///
/// While bound, the record's six change slots point at the matching
/// `update_*` method, so each mutation patches just that field.
pub struct FilePreview {
    record: Arc<FileRecord>,
    node: NodeId,
    props: PreviewProps,
    surface: SharedSurface,
}

impl FilePreview {
    pub fn new(
        record: Arc<FileRecord>,
        node: NodeId,
        props: PreviewProps,
        surface: SharedSurface,
    ) -> Arc<Self> {
        Arc::new(Self {
            record,
            node,
            props,
            surface,
        })
    }

    pub fn record(&self) -> &Arc<FileRecord> {
        &self.record
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Subscribes to every change slot of the record.
    pub fn bind(self: &Arc<Self>) {
        for field in RecordField::ALL {
            let weak: Weak<Self> = Arc::downgrade(self);
            self.record.on_change(
                field,
                Arc::new(move || {
                    if let Some(preview) = weak.upgrade() {
                        preview.update(field);
                    }
                }),
            );
        }
    }

    pub fn unbind(&self) {
        self.record.clear_handlers();
    }

    pub fn view(&self) -> PreviewView {
        let record = &self.record;
        PreviewView {
            name: record.name(),
            extension: record.extension(),
            size_text: record.size_text(),
            progress: record.progress(),
            url: record.url(),
            thumbnail: record.thumbnail(),
            dimensions: record.dimensions(),
            error: record.error(),
            deletable: self.props.deletable,
            editable: self.props.editable,
            linkable: self.props.linkable,
            disabled: self.props.disabled,
            meta: self.props.meta,
        }
    }

    /// Full render; the caller holds the surface.
    pub fn render(&self, surface: &mut dyn RenderSurface) {
        surface.set_classes(&ElementRef::Node(self.node), &self.wrapper_classes());
        surface.render_preview(self.node, &self.view());
    }

    fn wrapper_classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = PREVIEW_WRAPPER_CLASSES
            .iter()
            .map(|c| c.to_string())
            .collect();
        let ext = self.record.extension();
        if !ext.is_empty() {
            classes.push(format!("file-ext-{ext}"));
        }
        if self.record.is_image() {
            classes.push("file-category-image".into());
        } else if self.record.is_video() {
            classes.push("file-category-video".into());
        }
        if !self.record.is_valid() {
            classes.push("file-has-error".into());
        }
        classes
    }

    fn update(&self, field: RecordField) {
        match field {
            RecordField::Progress => self.update_progress(),
            RecordField::Name => self.update_name(),
            RecordField::Url => self.update_url(),
            RecordField::Thumbnail => self.update_thumbnail(),
            RecordField::Dimensions => self.update_dimensions(),
            RecordField::Error => self.update_error(),
        }
    }

    fn patch(&self, patch: PreviewPatch) {
        self.surface.lock().unwrap().patch_preview(self.node, &patch);
    }

    pub fn update_progress(&self) {
        self.patch(PreviewPatch::Progress(self.record.progress()));
    }

    pub fn update_name(&self) {
        self.patch(PreviewPatch::Name(self.record.name()));
    }

    pub fn update_url(&self) {
        self.patch(PreviewPatch::Url(self.record.url()));
    }

    pub fn update_thumbnail(&self) {
        self.patch(PreviewPatch::Thumbnail(self.record.thumbnail()));
    }

    pub fn update_dimensions(&self) {
        self.patch(PreviewPatch::Dimensions(self.record.dimensions()));
    }

    /// Error changes also flip the wrapper's error class.
    pub fn update_error(&self) {
        let classes = self.wrapper_classes();
        let mut surface = self.surface.lock().unwrap();
        surface.set_classes(&ElementRef::Node(self.node), &classes);
        surface.patch_preview(self.node, &PreviewPatch::Error(self.record.error()));
    }
}
