//! Drag and drop glue
//!
//! Native HTML5 drags (mouse) and pointer-capture drags (touch, pen) both
//! drive the session in [`DndSignals`]. Drop targets are resolved from
//! pointer coordinates against the rendered zones, so both paths preview
//! and commit the same way.
//!
//! Zones are marked up as:
//! - `[data-container="<tier id>|unranked"]` around `[data-item-id]` cards
//! - `.tier-list` around `.tier-row` elements for tier reordering

use leptos::prelude::*;
use leptos_dragdrop::DndSignals;
use tierforge_core::layout::{insertion_index, tier_slot_at, Point, Rect};
use tierforge_core::payload::{
    decode, encode_item, encode_tier, DragPayload, ItemPayload, TierPayload, TransferChannel, ITEM_FORMAT, TEXT_FORMAT,
};
use tierforge_core::view_model::drop_position;
use tierforge_core::{Container, DragSource, DropTarget, Event, ItemId};
use web_sys::DragEvent;

use crate::context::EngineHandle;
use crate::dom;

/// `DataTransfer` as a [`TransferChannel`]
pub struct DataTransferChannel<'a>(pub &'a web_sys::DataTransfer);

impl TransferChannel for DataTransferChannel<'_> {
    fn set_data(&mut self, format: &str, data: &str) {
        if let Err(err) = self.0.set_data(format, data) {
            tracing::debug!(?err, format, "setData failed");
        }
    }

    fn get_data(&self, format: &str) -> Option<String> {
        self.0.get_data(format).ok().filter(|data| !data.is_empty())
    }

    fn has_format(&self, format: &str) -> bool {
        self.0
            .types()
            .iter()
            .any(|t| t.as_string().as_deref() == Some(format))
    }
}

/// Ids that leave their place when `source` is dropped
pub fn moving_ids(source: &DragSource) -> Vec<ItemId> {
    match source {
        DragSource::Item { item_id, group, .. } if group.is_empty() => vec![item_id.clone()],
        DragSource::Item { group, .. } => group.clone(),
        DragSource::Tier { .. } => Vec::new(),
    }
}

/// Cards the placeholder may be inserted before, nearest first: the
/// container with the moving ids taken out, from the drop index on.
pub fn placeholder_anchors(items: &[ItemId], moving: &[ItemId], index: usize) -> Vec<ItemId> {
    items
        .iter()
        .filter(|id| !moving.contains(id))
        .skip(index)
        .cloned()
        .collect()
}

/// Drop target under `point`, if any
pub fn resolve_target(engine: EngineHandle, point: Point, source: &DragSource) -> Option<DropTarget> {
    let hit = dom::element_at(point)?;
    match source {
        DragSource::Tier { .. } => {
            let board = dom::closest(&hit, ".tier-list")?;
            let rows: Vec<Rect> = dom::query_all(&board, ".tier-row").iter().map(dom::rect).collect();
            Some(DropTarget::TierSlot(tier_slot_at(&rows, point.y)))
        }
        DragSource::Item { .. } => {
            // Over a tier's label or controls counts as over its cards.
            let zone = dom::closest(&hit, "[data-container]").or_else(|| {
                dom::closest(&hit, ".tier-row").and_then(|row| row.query_selector("[data-container]").ok().flatten())
            })?;
            let container = Container::from(zone.get_attribute("data-container")?);
            let index = item_slot(engine, &zone, &container, point, &moving_ids(source));
            Some(DropTarget::Slot { container, index })
        }
    }
}

/// Container position under `point`. Rects are measured over the rendered
/// cards only; hidden items keep their place.
fn item_slot(engine: EngineHandle, zone: &web_sys::Element, container: &Container, point: Point, moving: &[ItemId]) -> usize {
    let mut visible = Vec::new();
    let mut rects = Vec::new();
    for card in dom::query_all(zone, "[data-item-id]") {
        let Some(id) = card.get_attribute("data-item-id") else {
            continue;
        };
        if !moving.contains(&id) {
            rects.push(dom::rect(&card));
        }
        visible.push(id);
    }
    let visible_index = insertion_index(&rects, point);
    let state = engine.state();
    drop_position(state.container_items(container), &visible, moving, visible_index)
}

/// Move the preview to whatever is under `point`.
pub fn preview(engine: EngineHandle, dnd: DndSignals, point: Point, source: &DragSource) {
    let before = dnd.target.get_untracked();
    match resolve_target(engine, point, source) {
        Some(target) => dnd.hover(target),
        None => dnd.leave(),
    }
    let after = dnd.target.get_untracked();
    if before != after {
        engine.emit(Event::DragPreview { target: after });
    }
}

fn begin(engine: EngineHandle, dnd: DndSignals, source: DragSource) {
    dnd.begin(source.clone());
    engine.emit(Event::DragStarted { source });
}

/// Emit the drop (if any) and close the gesture.
pub fn finish(engine: EngineHandle, event: Option<Event>) {
    let committed = event.is_some();
    if let Some(event) = event {
        engine.emit(event);
    }
    engine.emit(Event::DragEnded { committed });
}

// ========================
// Native drag events
// ========================

/// `dragstart` on a card
pub fn start_item_drag(engine: EngineHandle, dnd: DndSignals, ev: &DragEvent, source: DragSource) {
    if let (Some(dt), DragSource::Item { item_id, from, .. }) = (ev.data_transfer(), &source) {
        let payload = ItemPayload {
            item_id: item_id.clone(),
            from: from.clone(),
        };
        encode_item(&mut DataTransferChannel(&dt), &payload);
        dt.set_effect_allowed("move");
    }
    begin(engine, dnd, source);
}

/// `dragstart` on a tier handle
pub fn start_tier_drag(engine: EngineHandle, dnd: DndSignals, ev: &DragEvent, tier_id: String, index: usize) {
    if let Some(dt) = ev.data_transfer() {
        encode_tier(&mut DataTransferChannel(&dt), &TierPayload { tier_id: tier_id.clone() });
        dt.set_effect_allowed("move");
    }
    begin(engine, dnd, DragSource::tier(tier_id, index));
}

/// `dragover` anywhere on the board. Only a resolvable target accepts the drop.
pub fn drag_over(engine: EngineHandle, dnd: DndSignals, ev: &DragEvent) {
    let point = dom::point(ev.client_x(), ev.client_y());
    match dnd.dragging.get_untracked() {
        Some(source) => {
            preview(engine, dnd, point, &source);
            if dnd.target.get_untracked().is_some() {
                ev.prevent_default();
                if let Some(dt) = ev.data_transfer() {
                    dt.set_drop_effect("move");
                }
            }
        }
        None => {
            // Payload values are hidden during dragover; the formats are not.
            let foreign = ev.data_transfer().is_some_and(|dt| {
                let channel = DataTransferChannel(&dt);
                channel.has_format(ITEM_FORMAT) || channel.has_format(TEXT_FORMAT)
            });
            if foreign && dom::element_at(point).and_then(|el| dom::closest(&el, "[data-container]")).is_some() {
                ev.prevent_default();
            }
        }
    }
}

/// `drop` anywhere on the board
pub fn drop_on_board(engine: EngineHandle, dnd: DndSignals, ev: &DragEvent) {
    ev.prevent_default();
    let point = dom::point(ev.client_x(), ev.client_y());

    let source = match dnd.dragging.get_untracked() {
        Some(source) => source,
        None => {
            // Started outside this page; all we have is the payload.
            let payload = ev.data_transfer().and_then(|dt| decode(&DataTransferChannel(&dt)));
            let source = match payload {
                Some(DragPayload::Item(p)) => DragSource::Item {
                    item_id: p.item_id,
                    from: p.from,
                    index: None,
                    group: Vec::new(),
                },
                Some(DragPayload::Tier(p)) => match engine.state().tier_index(&p.tier_id) {
                    Some(index) => DragSource::tier(p.tier_id, index),
                    None => return,
                },
                None => return,
            };
            begin(engine, dnd, source.clone());
            source
        }
    };
    preview(engine, dnd, point, &source);
    finish(engine, dnd.commit());
}

/// `dragend` on the dragged element. After a drop the session is already
/// idle; otherwise the drag ended outside every zone.
pub fn drag_end(engine: EngineHandle, dnd: DndSignals) {
    if dnd.cancel() {
        engine.emit(Event::DragEnded { committed: false });
    }
}

/// Drop preview inside one card zone
pub struct Placeholder {
    el: Option<web_sys::Element>,
}

impl Placeholder {
    pub fn new() -> Self {
        Self {
            el: dom::element("div", "card-placeholder"),
        }
    }

    pub fn show(&self, parent: &web_sys::Element, anchor: Option<&web_sys::Element>) {
        let Some(el) = &self.el else {
            return;
        };
        let anchor: Option<&web_sys::Node> = anchor.map(|a| a.as_ref());
        if let Err(err) = parent.insert_before(el, anchor) {
            tracing::debug!(?err, "placeholder insert failed");
        }
    }

    pub fn hide(&self) {
        if let Some(el) = &self.el {
            el.remove();
        }
    }
}
