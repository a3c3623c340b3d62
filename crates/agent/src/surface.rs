//! Rendering seam.
//!
//! The orchestrator never touches a real DOM. It drives a [`RenderSurface`]
//! holding three fixed regions (root, container, file list) plus the nodes
//! it creates inside the list. [`MemorySurface`] is the headless
//! implementation used by the demo binary and tests.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};

use fileagent_record::{Dimensions, Thumbnail, ValidationError};

use crate::slots::{SlotContent, SlotName};

/// Handle of a node created on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Layout box of a node, in surface pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Element addressed by class updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementRef {
    Root,
    Container,
    Node(NodeId),
    /// Custom element, e.g. a separate drop zone.
    Selector(String),
}

/// Attributes of the hidden file input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputAttributes {
    pub disabled: bool,
    pub multiple: bool,
    pub accept: String,
    pub capture: Option<String>,
}

impl Default for InputAttributes {
    fn default() -> Self {
        Self {
            disabled: false,
            multiple: false,
            accept: "*".into(),
            capture: None,
        }
    }
}

/// Everything a preview shows for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewView {
    pub name: String,
    pub extension: String,
    pub size_text: String,
    pub progress: Option<u8>,
    pub url: Option<String>,
    pub thumbnail: Option<Thumbnail>,
    pub dimensions: Option<Dimensions>,
    pub error: Option<ValidationError>,
    pub deletable: bool,
    pub editable: bool,
    pub linkable: bool,
    pub disabled: bool,
    pub meta: bool,
}

/// Single-field update of a rendered preview.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewPatch {
    Progress(Option<u8>),
    Name(String),
    Url(Option<String>),
    Thumbnail(Option<Thumbnail>),
    Dimensions(Option<Dimensions>),
    Error(Option<ValidationError>),
}

/// Host rendering backend.
pub trait RenderSurface: Send {
    /// Creates a detached node with the given classes.
    fn create_node(&mut self, classes: &[&str]) -> NodeId;

    /// Children of the file list, in visual order.
    fn children(&self) -> Vec<NodeId>;

    fn bounding_rect(&self, node: NodeId) -> Rect;

    /// Moves (or inserts) `node` to the front of the file list.
    fn prepend(&mut self, node: NodeId);

    /// Moves (or inserts) `node` to the end of the file list.
    fn append(&mut self, node: NodeId);

    /// Detaches and drops a node.
    fn remove(&mut self, node: NodeId);

    /// Empties the file list.
    fn clear_list(&mut self);

    fn set_classes(&mut self, element: &ElementRef, classes: &[String]);

    fn toggle_class(&mut self, element: &ElementRef, class: &str, on: bool);

    fn set_help_text(&mut self, text: &str);

    fn set_input(&mut self, attrs: &InputAttributes);

    /// Clears the input's selection so picking the same file fires again.
    fn reset_input(&mut self);

    fn fill_slot(&mut self, slot: SlotName, content: &SlotContent);

    /// Replaces a node's content with a slot fragment.
    fn fill_node(&mut self, node: NodeId, content: &SlotContent);

    /// Draws the built-in "add file" tile.
    fn render_new_preview(&mut self, node: NodeId);

    fn render_preview(&mut self, node: NodeId, view: &PreviewView);

    fn patch_preview(&mut self, node: NodeId, patch: &PreviewPatch);

    /// Sets or clears a translate transform.
    fn set_transform(&mut self, node: NodeId, offset: Option<(f64, f64)>);
}

pub type SharedSurface = Arc<Mutex<dyn RenderSurface>>;

// ---------------------------------------------------------------------------
// In-memory surface
// ---------------------------------------------------------------------------

/// What a [`MemorySurface`] node currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Empty,
    NewPreview,
    Slot(SlotContent),
    Preview(PreviewView),
}

#[derive(Debug)]
struct MemoryNode {
    content: NodeContent,
    transform: Option<(f64, f64)>,
}

/// Headless surface: a vertical list with fixed row height.
#[derive(Debug)]
pub struct MemorySurface {
    next_id: u64,
    row_height: f64,
    nodes: HashMap<NodeId, MemoryNode>,
    list: Vec<NodeId>,
    classes: HashMap<ElementRef, BTreeSet<String>>,
    help_text: String,
    input: InputAttributes,
    input_resets: usize,
    slots: HashMap<SlotName, SlotContent>,
    created: usize,
    patches: Vec<(NodeId, PreviewPatch)>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            row_height: 40.0,
            nodes: HashMap::new(),
            list: Vec::new(),
            classes: HashMap::new(),
            help_text: String::new(),
            input: InputAttributes::default(),
            input_resets: 0,
            slots: HashMap::new(),
            created: 0,
            patches: Vec::new(),
        }
    }

    pub fn shared() -> Arc<Mutex<MemorySurface>> {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn list(&self) -> &[NodeId] {
        &self.list
    }

    pub fn content(&self, node: NodeId) -> Option<&NodeContent> {
        self.nodes.get(&node).map(|n| &n.content)
    }

    /// The preview drawn in `node`, if any.
    pub fn view(&self, node: NodeId) -> Option<&PreviewView> {
        match self.content(node) {
            Some(NodeContent::Preview(view)) => Some(view),
            _ => None,
        }
    }

    pub fn transform(&self, node: NodeId) -> Option<(f64, f64)> {
        self.nodes.get(&node).and_then(|n| n.transform)
    }

    pub fn classes(&self, element: &ElementRef) -> Vec<String> {
        self.classes
            .get(element)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, element: &ElementRef, class: &str) -> bool {
        self.classes
            .get(element)
            .is_some_and(|set| set.contains(class))
    }

    pub fn help_text(&self) -> &str {
        &self.help_text
    }

    pub fn input(&self) -> &InputAttributes {
        &self.input
    }

    pub fn input_resets(&self) -> usize {
        self.input_resets
    }

    pub fn slot(&self, slot: SlotName) -> Option<&SlotContent> {
        self.slots.get(&slot)
    }

    /// Number of nodes ever created.
    pub fn created(&self) -> usize {
        self.created
    }

    pub fn patches(&self) -> &[(NodeId, PreviewPatch)] {
        &self.patches
    }

    fn detach(&mut self, node: NodeId) {
        self.list.retain(|n| *n != node);
    }
}

impl RenderSurface for MemorySurface {
    fn create_node(&mut self, classes: &[&str]) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.created += 1;
        self.nodes.insert(
            id,
            MemoryNode {
                content: NodeContent::Empty,
                transform: None,
            },
        );
        self.classes.insert(
            ElementRef::Node(id),
            classes.iter().map(|c| c.to_string()).collect(),
        );
        id
    }

    fn children(&self) -> Vec<NodeId> {
        self.list.clone()
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        match self.list.iter().position(|n| *n == node) {
            Some(index) => Rect {
                left: 0.0,
                top: index as f64 * self.row_height,
                width: 100.0,
                height: self.row_height,
            },
            None => Rect::default(),
        }
    }

    fn prepend(&mut self, node: NodeId) {
        self.detach(node);
        self.list.insert(0, node);
    }

    fn append(&mut self, node: NodeId) {
        self.detach(node);
        self.list.push(node);
    }

    fn remove(&mut self, node: NodeId) {
        self.detach(node);
        self.nodes.remove(&node);
        self.classes.remove(&ElementRef::Node(node));
    }

    fn clear_list(&mut self) {
        for node in std::mem::take(&mut self.list) {
            self.nodes.remove(&node);
            self.classes.remove(&ElementRef::Node(node));
        }
    }

    fn set_classes(&mut self, element: &ElementRef, classes: &[String]) {
        self.classes
            .insert(element.clone(), classes.iter().cloned().collect());
    }

    fn toggle_class(&mut self, element: &ElementRef, class: &str, on: bool) {
        let set = self.classes.entry(element.clone()).or_default();
        if on {
            set.insert(class.to_string());
        } else {
            set.remove(class);
        }
    }

    fn set_help_text(&mut self, text: &str) {
        self.help_text = text.to_string();
    }

    fn set_input(&mut self, attrs: &InputAttributes) {
        self.input = attrs.clone();
    }

    fn reset_input(&mut self) {
        self.input_resets += 1;
    }

    fn fill_slot(&mut self, slot: SlotName, content: &SlotContent) {
        self.slots.insert(slot, content.clone());
    }

    fn fill_node(&mut self, node: NodeId, content: &SlotContent) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.content = NodeContent::Slot(content.clone());
        }
    }

    fn render_new_preview(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.content = NodeContent::NewPreview;
        }
    }

    fn render_preview(&mut self, node: NodeId, view: &PreviewView) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.content = NodeContent::Preview(view.clone());
        }
    }

    fn patch_preview(&mut self, node: NodeId, patch: &PreviewPatch) {
        self.patches.push((node, patch.clone()));
        let Some(NodeContent::Preview(view)) = self.nodes.get_mut(&node).map(|n| &mut n.content)
        else {
            return;
        };
        match patch {
            PreviewPatch::Progress(p) => view.progress = *p,
            PreviewPatch::Name(name) => view.name = name.clone(),
            PreviewPatch::Url(url) => view.url = url.clone(),
            PreviewPatch::Thumbnail(t) => view.thumbnail = t.clone(),
            PreviewPatch::Dimensions(d) => view.dimensions = *d,
            PreviewPatch::Error(e) => view.error = e.clone(),
        }
    }

    fn set_transform(&mut self, node: NodeId, offset: Option<(f64, f64)>) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.transform = offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepend_moves_existing_node() {
        let mut s = MemorySurface::new();
        let a = s.create_node(&[]);
        let b = s.create_node(&[]);
        s.append(a);
        s.append(b);
        s.prepend(b);
        assert_eq!(s.list(), &[b, a]);
        assert_eq!(s.bounding_rect(a).top, 40.0);
        assert_eq!(s.bounding_rect(NodeId(99)), Rect::default());
    }

    #[test]
    fn class_toggling() {
        let mut s = MemorySurface::new();
        s.toggle_class(&ElementRef::Root, "is-drag-over", true);
        assert!(s.has_class(&ElementRef::Root, "is-drag-over"));
        s.toggle_class(&ElementRef::Root, "is-drag-over", false);
        assert!(!s.has_class(&ElementRef::Root, "is-drag-over"));
    }

    #[test]
    fn remove_drops_node() {
        let mut s = MemorySurface::new();
        let a = s.create_node(&["x"]);
        s.append(a);
        s.remove(a);
        assert!(s.list().is_empty());
        assert!(s.content(a).is_none());
        assert!(s.classes(&ElementRef::Node(a)).is_empty());
    }
}
