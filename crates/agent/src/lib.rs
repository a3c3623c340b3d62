//! File agent orchestrator.
//!
//! A [`FileAgent`] owns an ordered collection of
//! [`FileRecord`](fileagent_record::FileRecord)s and keeps a render surface
//! in step with it. It has no UI dependency of its own: the host provides a
//! [`RenderSurface`], and optionally an
//! [`Uploader`](fileagent_uploader::Uploader), a [`DropResolver`] and a
//! [`ThumbnailExtractor`].
//!
//! # Flow
//!
//! 1. **Ingest**: picks and drops are de-duplicated, capped and validated
//! 2. **Reconcile**: the list is brought in line with the collection,
//!    reusing existing previews, and the delta goes to a [`TransitionDriver`]
//! 3. **Lifecycle**: uploads, plus optimistic deletes and renames that roll
//!    back when the server or a hook rejects them

pub mod agent;
pub mod config;
pub mod drag;
pub mod drop;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod preview;
mod reconcile;
pub mod slots;
pub mod surface;
pub mod thumbnail;
pub mod transition;
pub mod wrapper;

#[cfg(test)]
mod testing;

// Re-export primary types for convenience.
pub use agent::{FileAgent, FileAgentBuilder, SharedRecords};
pub use config::{AgentConfig, Draggable, MaxSize, Sortable, Theme};
pub use drag::{DragState, DragTracker};
pub use drop::{DropFuture, DropPayload, DropResolver, DroppedItem, FsDropResolver};
pub use error::AgentError;
pub use events::{AgentEvents, InputChange, Predicate, Verdict};
pub use lifecycle::{LifecycleOutcome, RollbackReason};
pub use preview::{FilePreview, PreviewProps};
pub use slots::{PreviewSlot, SlotContent, SlotName, Slots};
pub use surface::{
    ElementRef, InputAttributes, MemorySurface, NodeContent, NodeId, PreviewPatch, PreviewView,
    Rect, RenderSurface, SharedSurface,
};
pub use thumbnail::{
    FrameFuture, ThumbnailExtractor, VIDEO_THUMBNAIL_MAX_BYTES, extract_video_thumbnail,
    wants_video_thumbnail,
};
pub use transition::{
    ChildRect, FlipOffset, FlipTransitions, InstantTransitions, TransitionDriver, TransitionPlan,
};
pub use wrapper::{WrapperState, drag_target};
