//! Per-record change notification slots.
//!
//! Each observable attribute has at most one subscriber. Binding a new
//! handler replaces the previous one.

use std::fmt;
use std::sync::Arc;

/// An observable attribute of a [`FileRecord`](crate::FileRecord).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Progress,
    Name,
    Url,
    Thumbnail,
    Dimensions,
    Error,
}

impl RecordField {
    pub const ALL: [RecordField; 6] = [
        RecordField::Progress,
        RecordField::Name,
        RecordField::Url,
        RecordField::Thumbnail,
        RecordField::Dimensions,
        RecordField::Error,
    ];
}

/// Handler invoked after the matching attribute changed.
pub type ChangeHandler = Arc<dyn Fn() + Send + Sync>;

/// One optional handler per [`RecordField`].
#[derive(Default, Clone)]
pub struct ChangeSlots {
    progress: Option<ChangeHandler>,
    name: Option<ChangeHandler>,
    url: Option<ChangeHandler>,
    thumbnail: Option<ChangeHandler>,
    dimensions: Option<ChangeHandler>,
    error: Option<ChangeHandler>,
}

impl ChangeSlots {
    fn slot(&self, field: RecordField) -> &Option<ChangeHandler> {
        match field {
            RecordField::Progress => &self.progress,
            RecordField::Name => &self.name,
            RecordField::Url => &self.url,
            RecordField::Thumbnail => &self.thumbnail,
            RecordField::Dimensions => &self.dimensions,
            RecordField::Error => &self.error,
        }
    }

    fn slot_mut(&mut self, field: RecordField) -> &mut Option<ChangeHandler> {
        match field {
            RecordField::Progress => &mut self.progress,
            RecordField::Name => &mut self.name,
            RecordField::Url => &mut self.url,
            RecordField::Thumbnail => &mut self.thumbnail,
            RecordField::Dimensions => &mut self.dimensions,
            RecordField::Error => &mut self.error,
        }
    }

    /// Binds `handler` to `field`, returning the handler it replaced.
    pub fn set(&mut self, field: RecordField, handler: ChangeHandler) -> Option<ChangeHandler> {
        self.slot_mut(field).replace(handler)
    }

    pub fn clear(&mut self, field: RecordField) -> Option<ChangeHandler> {
        self.slot_mut(field).take()
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    pub fn get(&self, field: RecordField) -> Option<ChangeHandler> {
        self.slot(field).clone()
    }

    pub fn is_bound(&self, field: RecordField) -> bool {
        self.slot(field).is_some()
    }

    /// Number of bound slots.
    pub fn bound(&self) -> usize {
        RecordField::ALL
            .iter()
            .filter(|f| self.is_bound(**f))
            .count()
    }
}

impl fmt::Debug for ChangeSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound: Vec<RecordField> = RecordField::ALL
            .into_iter()
            .filter(|field| self.is_bound(*field))
            .collect();
        f.debug_struct("ChangeSlots").field("bound", &bound).finish()
    }
}
