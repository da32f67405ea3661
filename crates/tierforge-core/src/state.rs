//! Application State
//!
//! [`AppState`] is the aggregate root and [`reduce`] its only transition
//! function. Every branch either applies a complete change and returns
//! `true`, or leaves the board untouched and returns `false`. Missing
//! prerequisites (no tier list, unknown tier) are silent no-ops. Item moves
//! record history before applying, so a move onto the item's own position
//! still leaves an undo step while returning `false`.
//!
//! # Partition invariant
//!
//! Every id of the loaded item map sits in exactly one place: one tier's
//! sequence or the unranked pool. Tiers may additionally carry ids the item
//! map does not know (items removed server side); those are kept untouched
//! so a later reload does not lose placements.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::rc::Rc;

use crate::event::{Event, EventKind};
use crate::history::{History, Snapshot};
use crate::models::{Container, Game, Item, ItemId, ItemMap, SheetConfig, Tier, TierList, UNRANKED};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub game: Option<Rc<Game>>,
    pub sheet: Option<SheetConfig>,
    pub items: Rc<ItemMap>,
    pub tier_list: Option<TierList>,
    /// Unranked pool in display order
    pub unranked: Vec<ItemId>,
    pub selection: BTreeSet<ItemId>,
    /// Last single or toggle click, start of a range selection
    pub selection_anchor: Option<ItemId>,
    /// Active values per filter id; absent or empty means "any"
    pub filters: BTreeMap<String, Vec<String>>,
    pub search: String,
    pub history: History,
    pub read_only: bool,
}

impl AppState {
    pub fn with_history_cap(cap: usize) -> Self {
        Self {
            history: History::new(cap),
            ..Default::default()
        }
    }

    pub fn tiers(&self) -> &[Tier] {
        self.tier_list.as_ref().map(|tl| tl.tiers.as_slice()).unwrap_or(&[])
    }

    pub fn tier_index(&self, tier_id: &str) -> Option<usize> {
        self.tiers().iter().position(|t| t.id == tier_id)
    }

    /// Where an item currently sits
    pub fn container_of(&self, item_id: &str) -> Option<(Container, usize)> {
        for tier in self.tiers() {
            if let Some(i) = tier.items.iter().position(|id| id == item_id) {
                return Some((Container::tier(tier.id.clone()), i));
            }
        }
        self.unranked
            .iter()
            .position(|id| id == item_id)
            .map(|i| (Container::Unranked, i))
    }

    /// Item ids of a container in display order
    pub fn container_items(&self, container: &Container) -> &[ItemId] {
        match container {
            Container::Unranked => &self.unranked,
            Container::Tier(id) => self
                .tiers()
                .iter()
                .find(|t| &t.id == id)
                .map(|t| t.items.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Tiers top to bottom, then the unranked pool
    pub fn visual_order(&self) -> impl Iterator<Item = &ItemId> {
        self.tiers()
            .iter()
            .flat_map(|t| t.items.iter())
            .chain(self.unranked.iter())
    }

    /// Selected ids in visual order
    pub fn ordered_selection(&self) -> Vec<ItemId> {
        self.visual_order()
            .filter(|id| self.selection.contains(*id))
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.tiers(), &self.unranked)
    }

    /// Ids of the item map that are placed zero or several times
    pub fn partition_violations(&self) -> Vec<ItemId> {
        let mut counts: BTreeMap<&str, usize> = self.items.ids().map(|id| (id.as_str(), 0)).collect();
        for id in self.visual_order() {
            if let Some(count) = counts.get_mut(id.as_str()) {
                *count += 1;
            }
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count != 1)
            .map(|(id, _)| id.to_string())
            .collect()
    }

    fn tier_mut(&mut self, tier_id: &str) -> Option<&mut Tier> {
        self.tier_list
            .as_mut()?
            .tiers
            .iter_mut()
            .find(|t| t.id == tier_id)
    }

    /// History point before a structural change. False when there is no
    /// tier list to change or the view is read-only.
    fn begin_mutation(&mut self, action: EventKind) -> bool {
        if self.read_only || self.tier_list.is_none() {
            return false;
        }
        let snapshot = self.snapshot();
        self.history.record(snapshot, action.name());
        true
    }

    /// Append ids leaving a tier to the pool. Ids the item map does not
    /// know are dropped; the pool only holds loaded items.
    fn return_to_pool(&mut self, ids: Vec<ItemId>) {
        let items = Rc::clone(&self.items);
        self.unranked.extend(ids.into_iter().filter(|id| items.contains(id)));
    }

    /// Unranked = loaded ids minus every placed id, in item map order.
    fn recompute_unranked(&mut self) {
        let placed: HashSet<&str> = self
            .tiers()
            .iter()
            .flat_map(|t| t.items.iter().map(String::as_str))
            .collect();
        let unranked = self
            .items
            .ids()
            .filter(|id| !placed.contains(id.as_str()))
            .cloned()
            .collect();
        self.unranked = unranked;
    }

    /// Keep a restored pool order where it is still valid and append
    /// whatever else is unplaced.
    fn restore_unranked(&mut self, restored: Vec<ItemId>) {
        let mut seen: HashSet<ItemId> = self
            .tiers()
            .iter()
            .flat_map(|t| t.items.iter().cloned())
            .collect();
        let mut unranked: Vec<ItemId> = restored
            .into_iter()
            .filter(|id| self.items.contains(id) && seen.insert(id.clone()))
            .collect();
        unranked.extend(self.items.ids().filter(|id| !seen.contains(*id)).cloned());
        self.unranked = unranked;
    }

    fn restore(&mut self, snapshot: Snapshot) {
        if let Some(tier_list) = self.tier_list.as_mut() {
            tier_list.tiers = snapshot.tiers;
        }
        self.restore_unranked(snapshot.unranked);
    }

    fn prune_selection(&mut self) {
        let items = Rc::clone(&self.items);
        self.selection.retain(|id| items.contains(id));
        if self
            .selection_anchor
            .as_ref()
            .is_some_and(|id| !items.contains(id))
        {
            self.selection_anchor = None;
        }
    }
}

/// Apply one event. Returns whether the state changed.
pub fn reduce(state: &mut AppState, event: &Event) -> bool {
    match event {
        Event::ItemMoved {
            item_id,
            to_tier,
            position,
            ..
        } => move_items(state, std::slice::from_ref(item_id), to_tier, *position, EventKind::ItemMoved),
        Event::ItemsMoved {
            item_ids,
            to_tier,
            position,
        } => move_items(state, item_ids, to_tier, *position, EventKind::ItemsMoved),
        Event::TierAdded { tier } => add_tier(state, tier),
        Event::TierRemoved { tier_id } => remove_tier(state, tier_id),
        Event::TierUpdated { tier } => update_tier(state, tier),
        Event::TierReordered { tier_id, target_index } => {
            reorder_tier(state, tier_id, *target_index, EventKind::TierReordered)
        }
        Event::TierMoveUp { tier_id } => match state.tier_index(tier_id) {
            Some(index) if index > 0 => reorder_tier(state, tier_id, index - 1, EventKind::TierMoveUp),
            _ => false,
        },
        Event::TierMoveDown { tier_id } => match state.tier_index(tier_id) {
            Some(index) if index + 1 < state.tiers().len() => {
                reorder_tier(state, tier_id, index + 2, EventKind::TierMoveDown)
            }
            _ => false,
        },
        Event::TierCleared { tier_id } => clear_tier(state, tier_id),
        Event::TiersReset => reset_tiers(state),
        Event::ItemsLoaded { items } => load_items(state, items),
        Event::TierListLoaded { tier_list } => load_tier_list(state, tier_list),
        Event::GameLoaded { game } => {
            let cap = state.history.cap();
            *state = AppState {
                game: Some(Rc::new(game.clone())),
                ..AppState::with_history_cap(cap)
            };
            true
        }
        Event::SheetSelected { sheet } => {
            state.sheet = Some(sheet.clone());
            state.items = Rc::default();
            state.tier_list = None;
            state.unranked.clear();
            state.selection.clear();
            state.selection_anchor = None;
            state.history.clear();
            state.read_only = false;
            true
        }
        Event::FilterChanged { filter_id, values } => set_filter(state, filter_id, values),
        Event::FiltersCleared => {
            if state.filters.is_empty() {
                return false;
            }
            state.filters.clear();
            true
        }
        Event::SearchChanged { query } => {
            if state.search == *query {
                return false;
            }
            state.search = query.clone();
            true
        }
        Event::SelectionChanged { item_ids } => {
            let selection: BTreeSet<ItemId> = item_ids
                .iter()
                .filter(|id| state.items.contains(id))
                .cloned()
                .collect();
            if selection == state.selection {
                return false;
            }
            state.selection_anchor = item_ids.iter().rev().find(|id| selection.contains(*id)).cloned();
            state.selection = selection;
            true
        }
        Event::SelectionCleared => {
            if state.selection.is_empty() && state.selection_anchor.is_none() {
                return false;
            }
            state.selection.clear();
            state.selection_anchor = None;
            true
        }
        Event::ItemClicked {
            item_id,
            multi_select,
            range_select,
        } => click_item(state, item_id, *multi_select, *range_select),
        Event::Undo => {
            if state.read_only || state.tier_list.is_none() {
                return false;
            }
            let current = state.snapshot();
            match state.history.undo(current) {
                Some(snapshot) => {
                    state.restore(snapshot);
                    true
                }
                None => false,
            }
        }
        Event::Redo => {
            if state.read_only || state.tier_list.is_none() {
                return false;
            }
            match state.history.redo() {
                Some(snapshot) => {
                    state.restore(snapshot);
                    true
                }
                None => false,
            }
        }
        Event::ReadOnlyChanged { read_only } => {
            if state.read_only == *read_only {
                return false;
            }
            state.read_only = *read_only;
            true
        }
        Event::ShareUpdated { is_public, share_code } => match state.tier_list.as_mut() {
            Some(tl) if tl.is_public != *is_public || tl.share_code != *share_code => {
                tl.is_public = *is_public;
                tl.share_code = share_code.clone();
                true
            }
            _ => false,
        },

        Event::GameSwitch { .. }
        | Event::SheetSwitch { .. }
        | Event::PresetSwitch { .. }
        | Event::PresetCreate { .. }
        | Event::PresetRename { .. }
        | Event::PresetDelete { .. }
        | Event::ShareToggled { .. }
        | Event::SharedOpened { .. }
        | Event::DragStarted { .. }
        | Event::DragPreview { .. }
        | Event::DragEnded { .. }
        | Event::AutoSaveStarted
        | Event::AutoSaveSucceeded { .. }
        | Event::AutoSaveFailed { .. }
        | Event::PresetsChanged { .. }
        | Event::LoadFailed { .. } => false,
    }
}

fn move_items(state: &mut AppState, item_ids: &[ItemId], to: &Container, position: usize, action: EventKind) -> bool {
    if let Container::Tier(tier_id) = to {
        if state.tier_index(tier_id).is_none() {
            return false;
        }
    }

    let mut seen = HashSet::new();
    let moving: Vec<ItemId> = item_ids
        .iter()
        .filter(|id| state.items.contains(id) && seen.insert(id.as_str()))
        .cloned()
        .collect();
    if moving.is_empty() {
        return false;
    }

    // History is recorded first, even for a drop where the items already are.
    let before = state.snapshot();
    if !state.begin_mutation(action) {
        return false;
    }
    let moving_set: HashSet<&str> = moving.iter().map(String::as_str).collect();
    if let Some(tier_list) = state.tier_list.as_mut() {
        for tier in &mut tier_list.tiers {
            tier.items.retain(|id| !moving_set.contains(id.as_str()));
        }
    }
    state.unranked.retain(|id| !moving_set.contains(id.as_str()));

    let destination = match to {
        Container::Unranked => Some(&mut state.unranked),
        Container::Tier(tier_id) => state.tier_mut(tier_id).map(|t| &mut t.items),
    };
    if let Some(items) = destination {
        let at = position.min(items.len());
        items.splice(at..at, moving);
    }

    // Unchanged board: nothing to render or save.
    !(state.tiers() == before.tiers.as_slice() && state.unranked == before.unranked)
}

fn add_tier(state: &mut AppState, tier: &Tier) -> bool {
    if tier.id.is_empty() || tier.id == UNRANKED || state.tier_index(&tier.id).is_some() {
        return false;
    }
    if !state.begin_mutation(EventKind::TierAdded) {
        return false;
    }

    // A new tier may only claim items that are still unranked.
    let mut tier = tier.clone();
    let mut claimed = HashSet::new();
    tier.items
        .retain(|id| state.unranked.contains(id) && claimed.insert(id.clone()));
    state.unranked.retain(|id| !claimed.contains(id));

    if let Some(tier_list) = state.tier_list.as_mut() {
        tier_list.tiers.push(tier);
        tier_list.tiers.sort_by_key(|t| t.order);
    }
    true
}

fn remove_tier(state: &mut AppState, tier_id: &str) -> bool {
    let Some(index) = state.tier_index(tier_id) else {
        return false;
    };
    if !state.begin_mutation(EventKind::TierRemoved) {
        return false;
    }
    if let Some(tier_list) = state.tier_list.as_mut() {
        let removed = tier_list.tiers.remove(index);
        state.return_to_pool(removed.items);
    }
    true
}

fn update_tier(state: &mut AppState, tier: &Tier) -> bool {
    let Some(index) = state.tier_index(&tier.id) else {
        return false;
    };
    let current = &state.tiers()[index];
    if current.name == tier.name && current.color == tier.color && current.order == tier.order {
        return false;
    }
    if !state.begin_mutation(EventKind::TierUpdated) {
        return false;
    }
    if let Some(tier_list) = state.tier_list.as_mut() {
        let target = &mut tier_list.tiers[index];
        let reorder = target.order != tier.order;
        target.name = tier.name.clone();
        target.color = tier.color.clone();
        target.order = tier.order;
        if reorder {
            tier_list.tiers.sort_by_key(|t| t.order);
        }
    }
    true
}

/// Move `tier_id` to the insert-before slot `target_index` (0..=len), then
/// renumber `order` to match positions.
fn reorder_tier(state: &mut AppState, tier_id: &str, target_index: usize, action: EventKind) -> bool {
    let Some(from) = state.tier_index(tier_id) else {
        return false;
    };
    let target = target_index.min(state.tiers().len());
    let to = if target > from { target - 1 } else { target };
    if to == from || !state.begin_mutation(action) {
        return false;
    }
    if let Some(tier_list) = state.tier_list.as_mut() {
        let tier = tier_list.tiers.remove(from);
        tier_list.tiers.insert(to, tier);
        for (order, tier) in tier_list.tiers.iter_mut().enumerate() {
            tier.order = order as i32;
        }
    }
    true
}

fn clear_tier(state: &mut AppState, tier_id: &str) -> bool {
    match state.tier_list.as_ref().and_then(|tl| tl.tier(tier_id)) {
        Some(tier) if !tier.items.is_empty() => {}
        _ => return false,
    }
    if !state.begin_mutation(EventKind::TierCleared) {
        return false;
    }
    let items = state
        .tier_mut(tier_id)
        .map(|tier| std::mem::take(&mut tier.items))
        .unwrap_or_default();
    state.return_to_pool(items);
    true
}

fn reset_tiers(state: &mut AppState) -> bool {
    if state.tiers().iter().all(|t| t.items.is_empty()) {
        return false;
    }
    if !state.begin_mutation(EventKind::TiersReset) {
        return false;
    }
    if let Some(tier_list) = state.tier_list.as_mut() {
        for tier in &mut tier_list.tiers {
            tier.items.clear();
        }
    }
    state.recompute_unranked();
    true
}

fn load_items(state: &mut AppState, items: &[Item]) -> bool {
    state.items = Rc::new(ItemMap::from_items(items.iter().cloned()));
    state.recompute_unranked();
    state.prune_selection();
    tracing::debug!(count = state.items.len(), unranked = state.unranked.len(), "items loaded");
    true
}

fn load_tier_list(state: &mut AppState, tier_list: &TierList) -> bool {
    let mut tier_list = tier_list.clone();
    tier_list.tiers.sort_by_key(|t| t.order);

    // First occurrence wins when an id is listed in several tiers.
    let mut seen_tiers = HashSet::new();
    let mut seen_items = HashSet::new();
    tier_list.tiers.retain(|t| t.id != UNRANKED && seen_tiers.insert(t.id.clone()));
    for tier in &mut tier_list.tiers {
        tier.items.retain(|id| seen_items.insert(id.clone()));
    }

    tracing::debug!(id = %tier_list.id, tiers = tier_list.tiers.len(), "tier list loaded");
    state.tier_list = Some(tier_list);
    state.history.clear();
    state.recompute_unranked();
    true
}

fn set_filter(state: &mut AppState, filter_id: &str, values: &[String]) -> bool {
    if values.is_empty() {
        return state.filters.remove(filter_id).is_some();
    }
    if state.filters.get(filter_id).map(Vec::as_slice) == Some(values) {
        return false;
    }
    state.filters.insert(filter_id.to_string(), values.to_vec());
    true
}

fn click_item(state: &mut AppState, item_id: &str, multi_select: bool, range_select: bool) -> bool {
    if !state.items.contains(item_id) {
        return false;
    }
    let before = (state.selection.clone(), state.selection_anchor.clone());

    let range = if range_select {
        state.selection_anchor.as_deref().and_then(|anchor| {
            let order: Vec<&ItemId> = state.visual_order().collect();
            let a = order.iter().position(|id| id.as_str() == anchor)?;
            let b = order.iter().position(|id| id.as_str() == item_id)?;
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            Some(order[lo..=hi].iter().map(|id| (*id).clone()).collect::<Vec<_>>())
        })
    } else {
        None
    };

    match range {
        Some(range) => {
            if !multi_select {
                state.selection.clear();
            }
            state.selection.extend(range);
        }
        None if multi_select => {
            if !state.selection.remove(item_id) {
                state.selection.insert(item_id.to_string());
            }
            state.selection_anchor = Some(item_id.to_string());
        }
        None => {
            state.selection.clear();
            state.selection.insert(item_id.to_string());
            state.selection_anchor = Some(item_id.to_string());
        }
    }

    (state.selection.clone(), state.selection_anchor.clone()) != before
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> AppState {
        let mut state = AppState::default();
        let items: Vec<Item> = ["i1", "i2", "i3"].iter().map(|id| Item::new(*id, *id)).collect();
        let mut tier_list = TierList::new("tl", "g", "sh", "Mine");
        tier_list.tiers = vec![Tier::new("s", "S", "#f00", 0), Tier::new("a", "A", "#0f0", 1)];
        reduce(&mut state, &Event::TierListLoaded { tier_list });
        reduce(&mut state, &Event::ItemsLoaded { items });
        state
    }

    fn moved(item: &str, to: &str, position: usize) -> Event {
        Event::ItemMoved {
            item_id: item.into(),
            from_tier: None,
            to_tier: Container::from(to),
            position,
        }
    }

    fn ids(list: &[ItemId]) -> Vec<&str> {
        list.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_move_then_undo_redo() {
        let mut state = board();
        assert!(reduce(&mut state, &moved("i2", "s", 0)));
        assert_eq!(ids(&state.tiers()[0].items), vec!["i2"]);
        assert_eq!(ids(&state.unranked), vec!["i1", "i3"]);

        assert!(reduce(&mut state, &Event::Undo));
        assert!(state.tiers()[0].items.is_empty());
        assert_eq!(ids(&state.unranked), vec!["i1", "i2", "i3"]);

        assert!(reduce(&mut state, &Event::Redo));
        assert_eq!(ids(&state.tiers()[0].items), vec!["i2"]);
        assert_eq!(ids(&state.unranked), vec!["i1", "i3"]);
        assert!(state.partition_violations().is_empty());
    }

    #[test]
    fn test_move_clamps_position() {
        let mut state = board();
        reduce(&mut state, &moved("i1", "s", 0));
        reduce(&mut state, &moved("i3", "s", 99));
        assert_eq!(ids(&state.tiers()[0].items), vec!["i1", "i3"]);
    }

    #[test]
    fn test_move_within_container() {
        let mut state = board();
        assert!(reduce(&mut state, &moved("i3", "unranked", 0)));
        assert_eq!(ids(&state.unranked), vec!["i3", "i1", "i2"]);

        // Undo restores the previous pool order
        reduce(&mut state, &Event::Undo);
        assert_eq!(ids(&state.unranked), vec!["i1", "i2", "i3"]);
    }

    #[test]
    fn test_move_guards() {
        let mut state = board();
        assert!(!reduce(&mut state, &moved("i1", "nope", 0)));
        assert!(!reduce(&mut state, &moved("ghost", "s", 0)));
        assert!(!state.history.can_undo());

        let mut empty = AppState::default();
        assert!(!reduce(&mut empty, &moved("i1", "s", 0)));
    }

    #[test]
    fn test_move_to_own_position_records_undo_step() {
        let mut state = board();
        reduce(&mut state, &moved("i1", "s", 0));
        reduce(&mut state, &moved("i2", "s", 1));
        let tiers = state.tiers().to_vec();
        assert!(!reduce(&mut state, &moved("i2", "s", 1)));
        assert_eq!(state.tiers(), tiers.as_slice());
        assert_eq!(state.history.len(), 3);

        // Undo steps back over the unchanged move, not the one before it.
        assert!(reduce(&mut state, &Event::Undo));
        assert_eq!(state.tiers(), tiers.as_slice());
        assert!(reduce(&mut state, &Event::Undo));
        assert_eq!(ids(&state.tiers()[0].items), vec!["i1"]);
    }

    #[test]
    fn test_items_moved_keeps_given_order() {
        let mut state = board();
        let event = Event::ItemsMoved {
            item_ids: vec!["i3".into(), "i1".into(), "i3".into()],
            to_tier: Container::tier("a"),
            position: 0,
        };
        assert!(reduce(&mut state, &event));
        assert_eq!(ids(&state.tiers()[1].items), vec!["i3", "i1"]);
        assert_eq!(state.history.len(), 1);
        assert!(state.partition_violations().is_empty());
    }

    #[test]
    fn test_tier_reorder_scenario() {
        let mut state = board();
        let tier_list = TierList {
            tiers: vec![
                Tier::new("t1", "1", "#111", 0),
                Tier::new("t2", "2", "#222", 1),
                Tier::new("t3", "3", "#333", 2),
            ],
            ..TierList::new("tl", "g", "sh", "x")
        };
        reduce(&mut state, &Event::TierListLoaded { tier_list });
        assert!(reduce(
            &mut state,
            &Event::TierReordered {
                tier_id: "t3".into(),
                target_index: 0,
            }
        ));
        let order: Vec<(&str, i32)> = state.tiers().iter().map(|t| (t.id.as_str(), t.order)).collect();
        assert_eq!(order, vec![("t3", 0), ("t1", 1), ("t2", 2)]);
    }

    #[test]
    fn test_move_up_down_bounds() {
        let mut state = board();
        assert!(!reduce(&mut state, &Event::TierMoveUp { tier_id: "s".into() }));
        assert!(!reduce(&mut state, &Event::TierMoveDown { tier_id: "a".into() }));
        assert!(reduce(&mut state, &Event::TierMoveDown { tier_id: "s".into() }));
        let ids: Vec<&str> = state.tiers().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "s"]);
        assert_eq!(state.history.undo_label(), Some("TIER_MOVE_DOWN"));
    }

    #[test]
    fn test_reorder_to_own_slot_is_noop() {
        let mut state = board();
        for slot in [0, 1] {
            assert!(!reduce(
                &mut state,
                &Event::TierReordered {
                    tier_id: "s".into(),
                    target_index: slot,
                }
            ));
        }
        assert!(!state.history.can_undo());
    }

    #[test]
    fn test_add_and_remove_tier() {
        let mut state = board();
        reduce(&mut state, &moved("i1", "a", 0));

        let tier = Tier::new("x", "X", "#abc", 1).with_items(&["i2", "i1", "ghost"]);
        assert!(reduce(&mut state, &Event::TierAdded { tier }));
        let order: Vec<&str> = state.tiers().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["s", "a", "x"]);
        assert_eq!(ids(&state.tier_list.as_ref().unwrap().tier("x").unwrap().items), vec!["i2"]);
        assert!(state.partition_violations().is_empty());

        // Duplicate and reserved ids are rejected
        assert!(!reduce(&mut state, &Event::TierAdded { tier: Tier::new("x", "X", "#abc", 9) }));
        assert!(!reduce(&mut state, &Event::TierAdded { tier: Tier::new(UNRANKED, "U", "#abc", 9) }));

        assert!(reduce(&mut state, &Event::TierRemoved { tier_id: "a".into() }));
        assert_eq!(ids(&state.unranked), vec!["i3", "i1"]);
        assert!(!reduce(&mut state, &Event::TierRemoved { tier_id: "a".into() }));
        assert!(state.partition_violations().is_empty());
    }

    #[test]
    fn test_update_tier_keeps_items() {
        let mut state = board();
        reduce(&mut state, &moved("i1", "s", 0));
        let mut tier = Tier::new("s", "Super", "#000", 0);
        assert!(reduce(&mut state, &Event::TierUpdated { tier: tier.clone() }));
        assert_eq!(state.tiers()[0].name, "Super");
        assert_eq!(ids(&state.tiers()[0].items), vec!["i1"]);
        assert!(!reduce(&mut state, &Event::TierUpdated { tier: tier.clone() }));

        tier.order = 5;
        assert!(reduce(&mut state, &Event::TierUpdated { tier }));
        assert_eq!(state.tiers()[1].id, "s");
    }

    #[test]
    fn test_clear_and_reset() {
        let mut state = board();
        reduce(&mut state, &moved("i1", "s", 0));
        reduce(&mut state, &moved("i3", "a", 0));

        assert!(reduce(&mut state, &Event::TierCleared { tier_id: "s".into() }));
        assert_eq!(ids(&state.unranked), vec!["i2", "i1"]);
        assert!(!reduce(&mut state, &Event::TierCleared { tier_id: "s".into() }));

        assert!(reduce(&mut state, &Event::TiersReset));
        assert_eq!(ids(&state.unranked), vec!["i1", "i2", "i3"]);
        assert!(!reduce(&mut state, &Event::TiersReset));
    }

    #[test]
    fn test_tier_list_load_dedupes_and_clears_history() {
        let mut state = board();
        reduce(&mut state, &moved("i1", "s", 0));
        assert!(state.history.can_undo());

        let mut tier_list = TierList::new("tl2", "g", "sh", "Other");
        tier_list.tiers = vec![
            Tier::new("b", "B", "#00f", 1).with_items(&["i1", "i2"]),
            Tier::new("s", "S", "#f00", 0).with_items(&["i2", "orphan"]),
        ];
        reduce(&mut state, &Event::TierListLoaded { tier_list });

        assert!(!state.history.can_undo());
        assert_eq!(state.tiers()[0].id, "s");
        assert_eq!(ids(&state.tiers()[0].items), vec!["i2", "orphan"]);
        assert_eq!(ids(&state.tiers()[1].items), vec!["i1"]);
        assert_eq!(ids(&state.unranked), vec!["i3"]);
        assert!(state.partition_violations().is_empty());
    }

    #[test]
    fn test_unknown_ids_never_reach_the_pool() {
        let mut state = board();
        let mut tier_list = TierList::new("tl2", "g", "sh", "Other");
        tier_list.tiers = vec![
            Tier::new("s", "S", "#f00", 0).with_items(&["i1", "orphan"]),
            Tier::new("a", "A", "#0f0", 1).with_items(&["gone", "i2"]),
        ];
        reduce(&mut state, &Event::TierListLoaded { tier_list });
        assert_eq!(ids(&state.unranked), vec!["i3"]);

        assert!(reduce(&mut state, &Event::TierCleared { tier_id: "s".into() }));
        assert_eq!(ids(&state.unranked), vec!["i3", "i1"]);
        assert!(reduce(&mut state, &Event::TierRemoved { tier_id: "a".into() }));
        assert_eq!(ids(&state.unranked), vec!["i3", "i1", "i2"]);
        assert!(state.partition_violations().is_empty());
    }

    #[test]
    fn test_selection_scenario() {
        let mut state = board();
        let click = |id: &str, multi: bool| Event::ItemClicked {
            item_id: id.into(),
            multi_select: multi,
            range_select: false,
        };
        reduce(&mut state, &click("i1", false));
        assert_eq!(state.selection, BTreeSet::from(["i1".to_string()]));
        reduce(&mut state, &click("i2", true));
        assert_eq!(state.selection, BTreeSet::from(["i1".to_string(), "i2".to_string()]));
        reduce(&mut state, &click("i1", true));
        assert_eq!(state.selection, BTreeSet::from(["i2".to_string()]));
        assert!(!reduce(&mut state, &click("ghost", false)));
    }

    #[test]
    fn test_range_selection_follows_visual_order() {
        let mut state = board();
        reduce(&mut state, &moved("i3", "s", 0));
        // Visual order: i3 (S), i1, i2 (unranked)
        let click = |id: &str, multi: bool, range: bool| Event::ItemClicked {
            item_id: id.into(),
            multi_select: multi,
            range_select: range,
        };
        reduce(&mut state, &click("i3", false, false));
        reduce(&mut state, &click("i1", false, true));
        assert_eq!(state.ordered_selection(), vec!["i3".to_string(), "i1".to_string()]);
        assert_eq!(state.selection_anchor.as_deref(), Some("i3"));

        // Without an anchor, range falls back to single select
        reduce(&mut state, &Event::SelectionCleared);
        reduce(&mut state, &click("i2", false, true));
        assert_eq!(state.ordered_selection(), vec!["i2".to_string()]);
    }

    #[test]
    fn test_items_reload_prunes_selection() {
        let mut state = board();
        reduce(
            &mut state,
            &Event::SelectionChanged {
                item_ids: vec!["i1".into(), "i3".into()],
            },
        );
        reduce(
            &mut state,
            &Event::ItemsLoaded {
                items: vec![Item::new("i1", "i1")],
            },
        );
        assert_eq!(state.ordered_selection(), vec!["i1".to_string()]);
        assert_eq!(state.selection_anchor, None);
    }

    #[test]
    fn test_read_only_blocks_structural_changes() {
        let mut state = board();
        reduce(&mut state, &Event::ReadOnlyChanged { read_only: true });
        assert!(!reduce(&mut state, &moved("i1", "s", 0)));
        assert!(!reduce(&mut state, &Event::TiersReset));
        assert!(!reduce(&mut state, &Event::Undo));
        // Search still works
        assert!(reduce(&mut state, &Event::SearchChanged { query: "fire".into() }));
    }

    #[test]
    fn test_game_loaded_resets_but_keeps_cap() {
        let mut state = AppState::with_history_cap(7);
        reduce(&mut state, &Event::SearchChanged { query: "x".into() });
        let game: Game = serde_json::from_str(r#"{"id":"g","name":"G"}"#).unwrap();
        reduce(&mut state, &Event::GameLoaded { game });
        assert_eq!(state.search, "");
        assert_eq!(state.history.cap(), 7);
        assert_eq!(state.game.as_ref().unwrap().id, "g");
    }

    #[test]
    fn test_filters() {
        let mut state = board();
        assert!(reduce(
            &mut state,
            &Event::FilterChanged {
                filter_id: "school".into(),
                values: vec!["Pyro".into()],
            }
        ));
        assert!(!reduce(
            &mut state,
            &Event::FilterChanged {
                filter_id: "school".into(),
                values: vec!["Pyro".into()],
            }
        ));
        assert!(reduce(
            &mut state,
            &Event::FilterChanged {
                filter_id: "school".into(),
                values: vec![],
            }
        ));
        assert!(!reduce(&mut state, &Event::FiltersCleared));
    }

    #[test]
    fn test_notifications_do_not_change_state() {
        let mut state = board();
        let before = state.clone();
        assert!(!reduce(&mut state, &Event::AutoSaveStarted));
        assert!(!reduce(&mut state, &Event::GameSwitch { game_id: "x".into() }));
        assert_eq!(state, before);
    }
}
