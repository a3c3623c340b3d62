//! Reconciliation of the record collection against the rendered list.
//!
//! Each pass walks the collection newest-first and prepends every record's
//! node, so the list ends up in collection order with the "add file" anchor
//! last. Nodes of known records are moved, never recreated; records seen
//! for the first time get a node and a bound preview. Nodes of records that
//! disappeared stay in place, unbound, until their exit transition settles.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use fileagent_record::{FileRecord, RecordId};
use tracing::debug;

use crate::config::Theme;
use crate::preview::{FilePreview, PREVIEW_WRAPPER_CLASSES, PreviewProps};
use crate::slots::Slots;
use crate::surface::{NodeId, RenderSurface, SharedSurface};
use crate::transition::{ChildRect, TransitionPlan};

const NEW_PREVIEW_CLASS: &str = "file-preview-new";

struct CacheEntry {
    record: Arc<FileRecord>,
    /// `None` when a `filePreview` slot rendered the node.
    preview: Option<Arc<FilePreview>>,
    node: NodeId,
}

/// Inputs of a pass that come from the agent configuration.
pub(crate) struct RenderContext<'a> {
    pub props: PreviewProps,
    pub slots: &'a Slots,
    pub theme: Theme,
}

/// Render state per record, keyed by record id.
#[derive(Default)]
pub(crate) struct RenderCache {
    entries: HashMap<RecordId, CacheEntry>,
    /// Removed entries whose exit transition has not settled.
    leaving: HashMap<NodeId, CacheEntry>,
    anchor: Option<NodeId>,
}

impl RenderCache {
    #[cfg(test)]
    pub fn leaving(&self) -> usize {
        self.leaving.len()
    }

    pub fn node_of(&self, id: RecordId) -> Option<NodeId> {
        self.entries.get(&id).map(|e| e.node)
    }

    pub fn preview_of(&self, id: RecordId) -> Option<Arc<FilePreview>> {
        self.entries.get(&id).and_then(|e| e.preview.clone())
    }

    /// Record shown by a live or leaving node.
    pub fn record_at(&self, node: NodeId) -> Option<Arc<FileRecord>> {
        self.entries
            .values()
            .chain(self.leaving.values())
            .find(|e| e.node == node)
            .map(|e| e.record.clone())
    }

    #[cfg(test)]
    pub fn anchor(&self) -> Option<NodeId> {
        self.anchor
    }

    fn ensure_anchor(&mut self, surface: &mut dyn RenderSurface, slots: &Slots) -> NodeId {
        if let Some(anchor) = self.anchor {
            return anchor;
        }
        surface.clear_list();
        let node = surface.create_node(&[NEW_PREVIEW_CLASS]);
        match &slots.file_preview_new {
            Some(content) => surface.fill_node(node, content),
            None => surface.render_new_preview(node),
        }
        surface.append(node);
        self.anchor = Some(node);
        node
    }

    /// Runs one pass and returns the partitions for the transition driver.
    pub fn reconcile(
        &mut self,
        surface: &mut dyn RenderSurface,
        shared: &SharedSurface,
        records: &[Arc<FileRecord>],
        ctx: &RenderContext<'_>,
    ) -> TransitionPlan {
        let anchor = self.ensure_anchor(surface, ctx.slots);

        let first: Vec<ChildRect> = surface
            .children()
            .into_iter()
            .map(|node| ChildRect {
                node,
                rect: surface.bounding_rect(node),
            })
            .collect();

        let mut added = Vec::new();
        let mut kept = Vec::new();
        for (index, record) in records.iter().enumerate().rev() {
            if let Some(entry) = self.entries.get(&record.id()) {
                surface.prepend(entry.node);
                kept.push(entry.node);
                continue;
            }

            let node = surface.create_node(&PREVIEW_WRAPPER_CLASSES);
            let preview = match &ctx.slots.file_preview {
                Some(slot) => {
                    surface.fill_node(node, &slot(record, index));
                    None
                }
                None => {
                    let preview =
                        FilePreview::new(record.clone(), node, ctx.props, shared.clone());
                    preview.bind();
                    preview.render(surface);
                    Some(preview)
                }
            };
            surface.prepend(node);
            self.entries.insert(
                record.id(),
                CacheEntry {
                    record: record.clone(),
                    preview,
                    node,
                },
            );
            added.push(node);
        }
        kept.push(anchor);

        let present: HashSet<RecordId> = records.iter().map(|r| r.id()).collect();
        let gone: Vec<RecordId> = self
            .entries
            .keys()
            .filter(|id| !present.contains(id))
            .copied()
            .collect();
        let mut removed = Vec::with_capacity(gone.len());
        for id in gone {
            if let Some(entry) = self.entries.remove(&id) {
                if let Some(preview) = &entry.preview {
                    preview.unbind();
                }
                removed.push(entry.node);
                self.leaving.insert(entry.node, entry);
            }
        }

        debug!(
            added = added.len(),
            kept = kept.len() - 1,
            removed = removed.len(),
            "reconciled file list"
        );

        TransitionPlan {
            added,
            removed,
            kept,
            first,
            theme: ctx.theme,
        }
    }

    /// Drops a leaving node once its exit transition is over.
    pub fn finish_leaving(&mut self, surface: &mut dyn RenderSurface, node: NodeId) -> bool {
        if self.leaving.remove(&node).is_some() {
            surface.remove(node);
            true
        } else {
            false
        }
    }

    /// Unbinds every preview and forgets all nodes.
    pub fn clear(&mut self, surface: &mut dyn RenderSurface) {
        for entry in self.entries.values() {
            if let Some(preview) = &entry.preview {
                preview.unbind();
            }
        }
        self.entries.clear();
        self.leaving.clear();
        self.anchor = None;
        surface.clear_list();
    }
}
