//! Transition driver: animates one reconciliation pass.
//!
//! A pass hands the driver three node partitions (added, removed, kept with
//! the "add file" anchor last) and the geometry snapshot taken before any
//! node moved. Removed nodes stay on the surface until the driver settles
//! them, either right away or when the host reports the end of the exit
//! animation through [`FileAgent::transition_end`](crate::FileAgent::transition_end).

use crate::config::Theme;
use crate::surface::{ElementRef, NodeId, Rect, RenderSurface};

/// Position of a list child before the pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildRect {
    pub node: NodeId,
    pub rect: Rect,
}

/// Translation that puts a moved node back at its old position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipOffset {
    pub node: NodeId,
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
    /// Reused nodes followed by the anchor.
    pub kept: Vec<NodeId>,
    /// Geometry before the pass.
    pub first: Vec<ChildRect>,
    pub theme: Theme,
}

impl TransitionPlan {
    /// No node entered or left.
    pub fn is_static(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Invert offsets (`first - last`) of kept nodes that moved.
    pub fn flip_offsets(&self, surface: &dyn RenderSurface) -> Vec<FlipOffset> {
        self.kept
            .iter()
            .filter_map(|node| {
                let first = self.first.iter().find(|c| c.node == *node)?.rect;
                let last = surface.bounding_rect(*node);
                let dx = first.left - last.left;
                let dy = first.top - last.top;
                (dx != 0.0 || dy != 0.0).then_some(FlipOffset {
                    node: *node,
                    dx,
                    dy,
                })
            })
            .collect()
    }
}

/// Animates a pass. Implementations must not call back into the agent.
pub trait TransitionDriver: Send + Sync {
    /// Starts the transitions. Returns the removed nodes that are already
    /// done and can be dropped now; the rest wait for `settle`.
    fn apply(&self, surface: &mut dyn RenderSurface, plan: &TransitionPlan) -> Vec<NodeId>;

    /// Called when the host reports that `node` finished its transition.
    fn settle(&self, _surface: &mut dyn RenderSurface, _node: NodeId) {}
}

/// No animation: removals complete immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantTransitions;

impl TransitionDriver for InstantTransitions {
    fn apply(&self, _surface: &mut dyn RenderSurface, plan: &TransitionPlan) -> Vec<NodeId> {
        plan.removed.clone()
    }
}

/// FLIP animation via theme-prefixed classes (`grid-box-*`, `list-box-*`).
///
/// Entering nodes get `<p>-enter`, leaving nodes `<p>-leave-to`, and moved
/// nodes an invert transform plus `<p>-move`. `settle` strips them all.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlipTransitions;

impl FlipTransitions {
    fn prefix(theme: Theme) -> &'static str {
        match theme {
            Theme::Default => "grid-box",
            Theme::List => "list-box",
        }
    }

    fn classes(theme: Theme) -> [String; 3] {
        let p = Self::prefix(theme);
        [format!("{p}-enter"), format!("{p}-leave-to"), format!("{p}-move")]
    }
}

impl TransitionDriver for FlipTransitions {
    fn apply(&self, surface: &mut dyn RenderSurface, plan: &TransitionPlan) -> Vec<NodeId> {
        let [enter, leave, moving] = Self::classes(plan.theme);

        for node in &plan.added {
            surface.toggle_class(&ElementRef::Node(*node), &enter, true);
        }
        for node in &plan.removed {
            surface.toggle_class(&ElementRef::Node(*node), &leave, true);
        }
        for offset in plan.flip_offsets(surface) {
            surface.set_transform(offset.node, Some((offset.dx, offset.dy)));
            surface.toggle_class(&ElementRef::Node(offset.node), &moving, true);
        }
        Vec::new()
    }

    fn settle(&self, surface: &mut dyn RenderSurface, node: NodeId) {
        for theme in [Theme::Default, Theme::List] {
            for class in Self::classes(theme) {
                surface.toggle_class(&ElementRef::Node(node), &class, false);
            }
        }
        surface.set_transform(node, None);
    }
}
