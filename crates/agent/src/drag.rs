//! Drag-over tracking.
//!
//! Browsers fire `dragenter`/`dragleave` for every child element crossed,
//! so a plain flag would flicker. The tracker counts nesting depth and
//! only leaves the dragging state once the depth is back to zero.

/// Visible drag state of the widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    DraggingValid,
    DraggingInvalid,
}

#[derive(Debug, Default)]
pub struct DragTracker {
    depth: usize,
    dragging: bool,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the dragging flag changed.
    pub fn enter(&mut self) -> bool {
        self.depth += 1;
        self.set_dragging(true)
    }

    pub fn over(&mut self) -> bool {
        self.set_dragging(true)
    }

    pub fn leave(&mut self) -> bool {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.set_dragging(false)
        } else {
            false
        }
    }

    /// A drop ends the drag regardless of nesting.
    pub fn drop_reset(&mut self) -> bool {
        self.depth = 0;
        self.set_dragging(false)
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn state(&self, valid: bool) -> DragState {
        match (self.dragging, valid) {
            (false, _) => DragState::Idle,
            (true, true) => DragState::DraggingValid,
            (true, false) => DragState::DraggingInvalid,
        }
    }

    fn set_dragging(&mut self, dragging: bool) -> bool {
        let changed = self.dragging != dragging;
        self.dragging = dragging;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_enter_leave_ends_idle() {
        let mut t = DragTracker::new();
        assert!(t.enter());
        assert!(!t.enter());
        assert!(!t.leave());
        assert_eq!(t.state(true), DragState::DraggingValid);
        assert!(t.leave());
        assert_eq!(t.state(true), DragState::Idle);
    }

    #[test]
    fn drop_resets_depth() {
        let mut t = DragTracker::new();
        t.enter();
        t.enter();
        assert!(t.drop_reset());
        assert_eq!(t.depth(), 0);
        assert!(!t.is_dragging());
    }

    #[test]
    fn stray_leave_does_not_underflow() {
        let mut t = DragTracker::new();
        t.over();
        assert!(t.leave());
        assert_eq!(t.depth(), 0);
        t.enter();
        assert_eq!(t.state(false), DragState::DraggingInvalid);
    }
}
