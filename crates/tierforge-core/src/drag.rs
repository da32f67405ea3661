//! Drag Session
//!
//! One state machine behind both input paths: native HTML5 drag-and-drop
//! calls [`DragSession::begin`] directly, while the pointer-capture path
//! (touch, pen) goes through [`DragSession::press`] and only starts once the
//! pointer travelled past [`DRAG_THRESHOLD_PX`].
//!
//! ```text
//! Idle --press--> Pending --pointer_moved(>5px)--> Dragging
//!   ^                |                                 |
//!   +---- cancel ----+------ commit / cancel ----------+
//! ```
//!
//! Previews are visual only. Nothing reaches the state store until `commit`
//! hands back the event to emit.

use crate::event::Event;
use crate::layout::{self, Point};
use crate::models::{Container, ItemId, TierId};

/// Pointer travel before a pressed element becomes a drag
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

/// What is being dragged
#[derive(Debug, Clone, PartialEq)]
pub enum DragSource {
    Item {
        item_id: ItemId,
        /// `None` when the source container could not be determined
        from: Option<Container>,
        /// Position in `from`
        index: Option<usize>,
        /// Selected ids moving together (visual order), empty for a lone item
        group: Vec<ItemId>,
    },
    Tier {
        tier_id: TierId,
        index: usize,
    },
}

impl DragSource {
    pub fn item(item_id: impl Into<String>, from: Container, index: usize) -> Self {
        DragSource::Item {
            item_id: item_id.into(),
            from: Some(from),
            index: Some(index),
            group: Vec::new(),
        }
    }

    pub fn tier(tier_id: impl Into<String>, index: usize) -> Self {
        DragSource::Tier {
            tier_id: tier_id.into(),
            index,
        }
    }

    /// Attach the current multi-selection. Ignored unless it holds the
    /// dragged item and at least one other.
    pub fn with_group(mut self, selection: Vec<ItemId>) -> Self {
        if let DragSource::Item { item_id, group, .. } = &mut self {
            if selection.len() > 1 && selection.contains(item_id) {
                *group = selection;
            }
        }
        self
    }

    pub fn id(&self) -> &str {
        match self {
            DragSource::Item { item_id, .. } => item_id,
            DragSource::Tier { tier_id, .. } => tier_id,
        }
    }
}

/// Where a drop would land
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Insertion index in a container, measured without the dragged item
    Slot { container: Container, index: usize },
    /// Insert-before slot in the tier order (0..=len)
    TierSlot(usize),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Pending {
        source: DragSource,
        origin: Point,
    },
    Dragging {
        source: DragSource,
        target: Option<DropTarget>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DragSession {
    phase: DragPhase,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, DragPhase::Idle)
    }

    pub fn source(&self) -> Option<&DragSource> {
        match &self.phase {
            DragPhase::Idle => None,
            DragPhase::Pending { source, .. } | DragPhase::Dragging { source, .. } => Some(source),
        }
    }

    /// Current preview target; `None` while no preview is shown.
    pub fn target(&self) -> Option<&DropTarget> {
        match &self.phase {
            DragPhase::Dragging { target, .. } => target.as_ref(),
            _ => None,
        }
    }

    /// Pointer went down on a draggable element.
    pub fn press(&mut self, source: DragSource, origin: Point) {
        self.phase = DragPhase::Pending { source, origin };
    }

    /// Returns true when this movement turned a press into a drag.
    pub fn pointer_moved(&mut self, point: Point) -> bool {
        let DragPhase::Pending { source, origin } = &self.phase else {
            return false;
        };
        if origin.distance(point) < DRAG_THRESHOLD_PX {
            return false;
        }
        tracing::debug!(source = source.id(), "drag threshold crossed");
        self.phase = DragPhase::Dragging {
            source: source.clone(),
            target: None,
        };
        true
    }

    /// Start immediately (native `dragstart`).
    pub fn begin(&mut self, source: DragSource) {
        tracing::debug!(source = source.id(), "drag started");
        self.phase = DragPhase::Dragging { source, target: None };
    }

    /// Update the preview. Targets of the wrong kind and drops that would
    /// change nothing clear the preview instead. Returns true when the
    /// preview changed.
    pub fn hover(&mut self, target: DropTarget) -> bool {
        let DragPhase::Dragging { source, target: current } = &mut self.phase else {
            return false;
        };
        let next = match (&*source, target) {
            (DragSource::Item { from, index, .. }, DropTarget::Slot { container, index: slot }) => {
                let same_container = from.as_ref() == Some(&container);
                if same_container && layout::preview_is_noop(slot, *index) {
                    None
                } else {
                    Some(DropTarget::Slot { container, index: slot })
                }
            }
            (DragSource::Tier { index, .. }, DropTarget::TierSlot(slot)) => {
                if layout::tier_slot_is_noop(slot, *index) {
                    None
                } else {
                    Some(DropTarget::TierSlot(slot))
                }
            }
            _ => None,
        };
        if *current == next {
            return false;
        }
        *current = next;
        true
    }

    /// Pointer left every drop zone. Returns true when a preview was cleared.
    pub fn leave(&mut self) -> bool {
        match &mut self.phase {
            DragPhase::Dragging { target, .. } => target.take().is_some(),
            _ => false,
        }
    }

    /// Finish the gesture and return the event to emit, if the drop does
    /// anything. Always returns the session to idle.
    pub fn commit(&mut self) -> Option<Event> {
        let DragPhase::Dragging { source, target } = std::mem::take(&mut self.phase) else {
            return None;
        };
        let event = match (source, target?) {
            (
                DragSource::Item { item_id, from, group, .. },
                DropTarget::Slot { container, index },
            ) => {
                if group.len() > 1 {
                    Event::ItemsMoved {
                        item_ids: group,
                        to_tier: container,
                        position: index,
                    }
                } else {
                    Event::ItemMoved {
                        item_id,
                        from_tier: from,
                        to_tier: container,
                        position: index,
                    }
                }
            }
            (DragSource::Tier { tier_id, .. }, DropTarget::TierSlot(slot)) => Event::TierReordered {
                tier_id,
                target_index: slot,
            },
            _ => return None,
        };
        tracing::debug!(event = event.kind().name(), "drag committed");
        Some(event)
    }

    /// Abort (pointercancel, Escape, drop outside). Returns true when a
    /// gesture was in progress.
    pub fn cancel(&mut self) -> bool {
        let was_active = !self.is_idle();
        if was_active {
            tracing::debug!("drag cancelled");
        }
        self.phase = DragPhase::Idle;
        was_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(container: &str, index: usize) -> DropTarget {
        DropTarget::Slot {
            container: Container::from(container),
            index,
        }
    }

    #[test]
    fn test_press_needs_threshold() {
        let mut session = DragSession::new();
        session.press(DragSource::item("i1", Container::Unranked, 0), Point::new(10.0, 10.0));
        assert!(!session.pointer_moved(Point::new(12.0, 13.0)));
        assert!(!session.is_dragging());
        assert!(session.pointer_moved(Point::new(16.0, 10.0)));
        assert!(session.is_dragging());
        // Already dragging
        assert!(!session.pointer_moved(Point::new(30.0, 10.0)));
    }

    #[test]
    fn test_click_without_movement_commits_nothing() {
        let mut session = DragSession::new();
        session.press(DragSource::item("i1", Container::Unranked, 0), Point::default());
        assert_eq!(session.commit(), None);
        assert!(session.is_idle());
    }

    #[test]
    fn test_commit_item_move() {
        let mut session = DragSession::new();
        session.begin(DragSource::item("i2", Container::Unranked, 1));
        assert!(session.hover(slot("s", 0)));
        assert!(!session.hover(slot("s", 0)));

        let event = session.commit();
        assert_eq!(
            event,
            Some(Event::ItemMoved {
                item_id: "i2".into(),
                from_tier: Some(Container::Unranked),
                to_tier: Container::tier("s"),
                position: 0,
            })
        );
        assert!(session.is_idle());
        assert!(session.target().is_none());
    }

    #[test]
    fn test_hover_in_place_is_suppressed() {
        let mut session = DragSession::new();
        session.begin(DragSource::item("i2", Container::tier("a"), 1));
        assert!(!session.hover(slot("a", 1)));
        assert!(session.target().is_none());
        assert!(session.hover(slot("a", 0)));
        // Returning to the origin clears the preview again
        assert!(session.hover(slot("a", 1)));
        assert_eq!(session.commit(), None);
    }

    #[test]
    fn test_group_drag_moves_selection() {
        let mut session = DragSession::new();
        let source = DragSource::item("i1", Container::Unranked, 0)
            .with_group(vec!["i1".into(), "i3".into()]);
        session.begin(source);
        session.hover(slot("s", 0));
        assert_eq!(
            session.commit(),
            Some(Event::ItemsMoved {
                item_ids: vec!["i1".into(), "i3".into()],
                to_tier: Container::tier("s"),
                position: 0,
            })
        );
    }

    #[test]
    fn test_group_ignored_when_item_not_selected() {
        let source = DragSource::item("i2", Container::Unranked, 0)
            .with_group(vec!["i1".into(), "i3".into()]);
        match source {
            DragSource::Item { group, .. } => assert!(group.is_empty()),
            DragSource::Tier { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_tier_reorder() {
        let mut session = DragSession::new();
        session.begin(DragSource::tier("t3", 2));
        assert!(!session.hover(DropTarget::TierSlot(3)));
        assert!(!session.hover(slot("s", 0)), "item slots are not tier targets");
        assert!(session.hover(DropTarget::TierSlot(0)));
        assert_eq!(
            session.commit(),
            Some(Event::TierReordered {
                tier_id: "t3".into(),
                target_index: 0,
            })
        );
    }

    #[test]
    fn test_cancel_and_leave_clear_preview() {
        let mut session = DragSession::new();
        session.begin(DragSource::item("i1", Container::Unranked, 0));
        session.hover(slot("s", 0));
        assert!(session.leave());
        assert!(!session.leave());
        session.hover(slot("s", 0));
        assert!(session.cancel());
        assert!(session.is_idle());
        assert!(!session.cancel());
        assert_eq!(session.commit(), None);
    }
}
