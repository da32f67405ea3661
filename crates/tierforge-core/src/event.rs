//! Domain Events
//!
//! Every user intention and cross-component notification is one variant of
//! [`Event`]. Components never call each other directly; they emit events on
//! the [`EventBus`](crate::bus::EventBus).

use crate::drag::{DragSource, DropTarget};
use crate::models::{Container, Game, Item, ItemId, PresetState, SheetConfig, Tier, TierId, TierList};

/// All events flowing through the bus
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // ========================
    // State events
    // ========================
    ItemMoved {
        item_id: ItemId,
        /// `None` when the drag source could not be determined
        from_tier: Option<Container>,
        to_tier: Container,
        position: usize,
    },
    /// Moves a multi-selection as one history step
    ItemsMoved {
        item_ids: Vec<ItemId>,
        to_tier: Container,
        position: usize,
    },
    TierAdded {
        tier: Tier,
    },
    TierRemoved {
        tier_id: TierId,
    },
    TierUpdated {
        tier: Tier,
    },
    TierReordered {
        tier_id: TierId,
        /// Slot in the current tier order (0..=len), "insert before the tier at this slot"
        target_index: usize,
    },
    TierMoveUp {
        tier_id: TierId,
    },
    TierMoveDown {
        tier_id: TierId,
    },
    /// Moves every item of a tier back to the unranked pool
    TierCleared {
        tier_id: TierId,
    },
    /// Moves every ranked item back to the unranked pool
    TiersReset,
    ItemsLoaded {
        items: Vec<Item>,
    },
    TierListLoaded {
        tier_list: TierList,
    },
    GameLoaded {
        game: Game,
    },
    SheetSelected {
        sheet: SheetConfig,
    },
    FilterChanged {
        filter_id: String,
        values: Vec<String>,
    },
    FiltersCleared,
    SearchChanged {
        query: String,
    },
    SelectionChanged {
        item_ids: Vec<ItemId>,
    },
    SelectionCleared,
    ItemClicked {
        item_id: ItemId,
        multi_select: bool,
        range_select: bool,
    },
    Undo,
    Redo,
    /// Shared lists open read-only; structural events are ignored meanwhile
    ReadOnlyChanged {
        read_only: bool,
    },
    /// Sharing flags of the loaded list changed on the server
    ShareUpdated {
        is_public: bool,
        share_code: String,
    },

    // ========================
    // Intents (handled by the engine)
    // ========================
    GameSwitch {
        game_id: String,
    },
    SheetSwitch {
        sheet_id: String,
    },
    PresetSwitch {
        preset_id: String,
    },
    PresetCreate {
        name: Option<String>,
    },
    PresetRename {
        preset_id: String,
        name: String,
    },
    PresetDelete {
        preset_id: String,
    },
    ShareToggled {
        is_public: bool,
    },
    SharedOpened {
        share_code: String,
    },

    // ========================
    // Notifications
    // ========================
    DragStarted {
        source: DragSource,
    },
    DragPreview {
        target: Option<DropTarget>,
    },
    DragEnded {
        committed: bool,
    },
    AutoSaveStarted,
    AutoSaveSucceeded {
        tier_list_id: String,
    },
    AutoSaveFailed {
        message: String,
    },
    PresetsChanged {
        state: PresetState,
    },
    LoadFailed {
        message: String,
    },
}

/// Fieldless mirror of [`Event`], used as subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    ItemMoved,
    ItemsMoved,
    TierAdded,
    TierRemoved,
    TierUpdated,
    TierReordered,
    TierMoveUp,
    TierMoveDown,
    TierCleared,
    TiersReset,
    ItemsLoaded,
    TierListLoaded,
    GameLoaded,
    SheetSelected,
    FilterChanged,
    FiltersCleared,
    SearchChanged,
    SelectionChanged,
    SelectionCleared,
    ItemClicked,
    Undo,
    Redo,
    ReadOnlyChanged,
    ShareUpdated,
    GameSwitch,
    SheetSwitch,
    PresetSwitch,
    PresetCreate,
    PresetRename,
    PresetDelete,
    ShareToggled,
    SharedOpened,
    DragStarted,
    DragPreview,
    DragEnded,
    AutoSaveStarted,
    AutoSaveSucceeded,
    AutoSaveFailed,
    PresetsChanged,
    LoadFailed,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ItemMoved { .. } => EventKind::ItemMoved,
            Event::ItemsMoved { .. } => EventKind::ItemsMoved,
            Event::TierAdded { .. } => EventKind::TierAdded,
            Event::TierRemoved { .. } => EventKind::TierRemoved,
            Event::TierUpdated { .. } => EventKind::TierUpdated,
            Event::TierReordered { .. } => EventKind::TierReordered,
            Event::TierMoveUp { .. } => EventKind::TierMoveUp,
            Event::TierMoveDown { .. } => EventKind::TierMoveDown,
            Event::TierCleared { .. } => EventKind::TierCleared,
            Event::TiersReset => EventKind::TiersReset,
            Event::ItemsLoaded { .. } => EventKind::ItemsLoaded,
            Event::TierListLoaded { .. } => EventKind::TierListLoaded,
            Event::GameLoaded { .. } => EventKind::GameLoaded,
            Event::SheetSelected { .. } => EventKind::SheetSelected,
            Event::FilterChanged { .. } => EventKind::FilterChanged,
            Event::FiltersCleared => EventKind::FiltersCleared,
            Event::SearchChanged { .. } => EventKind::SearchChanged,
            Event::SelectionChanged { .. } => EventKind::SelectionChanged,
            Event::SelectionCleared => EventKind::SelectionCleared,
            Event::ItemClicked { .. } => EventKind::ItemClicked,
            Event::Undo => EventKind::Undo,
            Event::Redo => EventKind::Redo,
            Event::ReadOnlyChanged { .. } => EventKind::ReadOnlyChanged,
            Event::ShareUpdated { .. } => EventKind::ShareUpdated,
            Event::GameSwitch { .. } => EventKind::GameSwitch,
            Event::SheetSwitch { .. } => EventKind::SheetSwitch,
            Event::PresetSwitch { .. } => EventKind::PresetSwitch,
            Event::PresetCreate { .. } => EventKind::PresetCreate,
            Event::PresetRename { .. } => EventKind::PresetRename,
            Event::PresetDelete { .. } => EventKind::PresetDelete,
            Event::ShareToggled { .. } => EventKind::ShareToggled,
            Event::SharedOpened { .. } => EventKind::SharedOpened,
            Event::DragStarted { .. } => EventKind::DragStarted,
            Event::DragPreview { .. } => EventKind::DragPreview,
            Event::DragEnded { .. } => EventKind::DragEnded,
            Event::AutoSaveStarted => EventKind::AutoSaveStarted,
            Event::AutoSaveSucceeded { .. } => EventKind::AutoSaveSucceeded,
            Event::AutoSaveFailed { .. } => EventKind::AutoSaveFailed,
            Event::PresetsChanged { .. } => EventKind::PresetsChanged,
            Event::LoadFailed { .. } => EventKind::LoadFailed,
        }
    }

    /// Events that change the tier sequence and therefore land in history
    pub fn is_structural(&self) -> bool {
        matches!(
            self.kind(),
            EventKind::ItemMoved
                | EventKind::ItemsMoved
                | EventKind::TierAdded
                | EventKind::TierRemoved
                | EventKind::TierUpdated
                | EventKind::TierReordered
                | EventKind::TierMoveUp
                | EventKind::TierMoveDown
                | EventKind::TierCleared
                | EventKind::TiersReset
        )
    }
}

impl Event {
    /// False for intents and notifications, which never reach the reducer.
    pub fn affects_state(&self) -> bool {
        !matches!(
            self.kind(),
            EventKind::GameSwitch
                | EventKind::SheetSwitch
                | EventKind::PresetSwitch
                | EventKind::PresetCreate
                | EventKind::PresetRename
                | EventKind::PresetDelete
                | EventKind::ShareToggled
                | EventKind::SharedOpened
                | EventKind::DragStarted
                | EventKind::DragPreview
                | EventKind::DragEnded
                | EventKind::AutoSaveStarted
                | EventKind::AutoSaveSucceeded
                | EventKind::AutoSaveFailed
                | EventKind::PresetsChanged
                | EventKind::LoadFailed
        )
    }
}

impl EventKind {
    /// Name used in logs and history labels
    pub fn name(self) -> &'static str {
        match self {
            EventKind::ItemMoved => "ITEM_MOVED",
            EventKind::ItemsMoved => "ITEMS_MOVED",
            EventKind::TierAdded => "TIER_ADDED",
            EventKind::TierRemoved => "TIER_REMOVED",
            EventKind::TierUpdated => "TIER_UPDATED",
            EventKind::TierReordered => "TIER_REORDERED",
            EventKind::TierMoveUp => "TIER_MOVE_UP",
            EventKind::TierMoveDown => "TIER_MOVE_DOWN",
            EventKind::TierCleared => "TIER_CLEARED",
            EventKind::TiersReset => "TIERS_RESET",
            EventKind::ItemsLoaded => "ITEMS_LOADED",
            EventKind::TierListLoaded => "TIERLIST_LOADED",
            EventKind::GameLoaded => "GAME_LOADED",
            EventKind::SheetSelected => "SHEET_SELECTED",
            EventKind::FilterChanged => "FILTER_CHANGED",
            EventKind::FiltersCleared => "FILTERS_CLEARED",
            EventKind::SearchChanged => "SEARCH_CHANGED",
            EventKind::SelectionChanged => "SELECTION_CHANGED",
            EventKind::SelectionCleared => "SELECTION_CLEARED",
            EventKind::ItemClicked => "ITEM_CLICKED",
            EventKind::Undo => "UNDO",
            EventKind::Redo => "REDO",
            EventKind::ReadOnlyChanged => "READ_ONLY_CHANGED",
            EventKind::ShareUpdated => "SHARE_UPDATED",
            EventKind::GameSwitch => "GAME_SWITCH",
            EventKind::SheetSwitch => "SHEET_SWITCH",
            EventKind::PresetSwitch => "PRESET_SWITCH",
            EventKind::PresetCreate => "PRESET_CREATE",
            EventKind::PresetRename => "PRESET_RENAME",
            EventKind::PresetDelete => "PRESET_DELETE",
            EventKind::ShareToggled => "SHARE_TOGGLED",
            EventKind::SharedOpened => "SHARED_OPENED",
            EventKind::DragStarted => "DRAG_START",
            EventKind::DragPreview => "DRAG_PREVIEW",
            EventKind::DragEnded => "DRAG_END",
            EventKind::AutoSaveStarted => "autosave:start",
            EventKind::AutoSaveSucceeded => "autosave:success",
            EventKind::AutoSaveFailed => "autosave:error",
            EventKind::PresetsChanged => "presets:changed",
            EventKind::LoadFailed => "load:error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let event = Event::ItemMoved {
            item_id: "i1".into(),
            from_tier: Some(Container::Unranked),
            to_tier: Container::tier("s"),
            position: 0,
        };
        assert_eq!(event.kind(), EventKind::ItemMoved);
        assert_eq!(event.kind().name(), "ITEM_MOVED");
        assert_eq!(Event::AutoSaveFailed { message: String::new() }.kind().name(), "autosave:error");
    }

    #[test]
    fn test_structural_events() {
        assert!(Event::TierMoveUp { tier_id: "s".into() }.is_structural());
        assert!(Event::TiersReset.is_structural());
        assert!(!Event::Undo.is_structural());
        assert!(!Event::SearchChanged { query: "x".into() }.is_structural());
        assert!(Event::SearchChanged { query: "x".into() }.affects_state());
        assert!(!Event::DragEnded { committed: true }.affects_state());
    }
}
