//! Static wrapper state refreshed on every render: root and container
//! classes, input attributes and the drag target.

use crate::config::{AgentConfig, Draggable, Sortable};
use crate::surface::{ElementRef, InputAttributes, RenderSurface};

/// Snapshot of everything the wrapper classes depend on.
#[derive(Debug, Clone, Copy)]
pub struct WrapperState<'a> {
    pub config: &'a AgentConfig,
    pub count: usize,
    pub dragging: bool,
    pub sorting: bool,
    pub sorting_active: bool,
}

impl WrapperState<'_> {
    pub fn drag_valid(&self) -> bool {
        self.config.accepts_drop(self.count)
    }

    pub fn root_classes(&self) -> Vec<String> {
        let config = self.config;
        let mut classes = vec![format!("theme-{}", config.theme)];
        classes.push(
            if config.is_sortable() {
                "is-sortable-enabled"
            } else {
                "is-sortable-disabled"
            }
            .into(),
        );
        match config.sortable {
            Sortable::Hold => classes.push("is-sortable-hold".into()),
            Sortable::Handle => classes.push("is-sortable-handle".into()),
            Sortable::Immediate => classes.push("is-sortable-immediately".into()),
            Sortable::Off => {}
        }
        let flags = [
            (self.sorting, "is-sorting"),
            (self.sorting_active, "is-sorting-active"),
            (self.dragging, "is-drag-over"),
            (config.disabled, "is-disabled"),
            (config.readonly, "is-readonly"),
            (self.drag_valid(), "is-drag-valid"),
        ];
        classes.extend(
            flags
                .into_iter()
                .filter(|(on, _)| *on)
                .map(|(_, class)| class.to_string()),
        );
        classes
    }

    pub fn container_classes(&self) -> Vec<String> {
        let config = self.config;
        let mut classes: Vec<String> = ["grid-block-wrapper", "vue-file-agent", "file-input-wrapper"]
            .into_iter()
            .map(String::from)
            .collect();
        if config.compact {
            classes.push("is-compact".into());
        }
        if config.has_multiple() {
            classes.push("has-multiple".into());
        } else {
            classes.push("is-single".into());
        }
        if !config.meta {
            classes.push("no-meta".into());
        }
        classes
    }

    /// Writes root, container and drag-target classes.
    ///
    /// The drag classes go on last: when the drag target is the root, the
    /// root class reset would otherwise wipe them.
    pub fn paint(&self, surface: &mut dyn RenderSurface) {
        surface.set_classes(&ElementRef::Root, &self.root_classes());
        surface.set_classes(&ElementRef::Container, &self.container_classes());
        if let Some(target) = drag_target(self.config) {
            let valid = self.drag_valid();
            surface.toggle_class(&target, "file-agent-drag-over", self.dragging);
            surface.toggle_class(&target, "file-agent-drag-valid", self.dragging && valid);
            surface.toggle_class(&target, "file-agent-drag-invalid", self.dragging && !valid);
        }
    }

    pub fn input_attributes(&self) -> InputAttributes {
        let config = self.config;
        InputAttributes {
            disabled: config.disabled
                || (config.has_multiple() && !config.can_add_more(self.count)),
            multiple: config.has_multiple(),
            accept: config
                .accept
                .as_deref()
                .filter(|a| !a.is_empty())
                .unwrap_or("*")
                .to_string(),
            capture: config.capture.clone(),
        }
    }
}

/// Element that receives drag events, if dragging is enabled.
pub fn drag_target(config: &AgentConfig) -> Option<ElementRef> {
    match &config.draggable {
        Draggable::Off => None,
        Draggable::Root => Some(ElementRef::Root),
        Draggable::Element(selector) => Some(ElementRef::Selector(selector.clone())),
    }
}
