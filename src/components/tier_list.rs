//! Tier List Component
//!
//! The board: tier rows in order plus the add/reset toolbar. Dragging a
//! tier label reorders rows; the insertion marker sits before the row at
//! the target slot, or after the last row.

use leptos::prelude::*;
use leptos_dragdrop::DndSignals;
use tierforge_core::view_model::BoardView;
use tierforge_core::{DragSource, DropTarget, Event, Tier};

use super::TierRow;
use crate::context::{use_engine, use_state_slice};

const NEW_TIER_COLOR: &str = "#9e9e9e";

#[component]
pub fn TierList(board: ReadSignal<BoardView>) -> impl IntoView {
    let engine = use_engine();
    let dnd = expect_context::<DndSignals>();
    let has_list = use_state_slice(|s| s.tier_list.is_some());
    let read_only = Memo::new(move |_| board.with(|b| b.read_only));
    let tier_ids = Memo::new(move |_| board.with(|b| b.tiers.iter().map(|t| t.id.clone()).collect::<Vec<_>>()));

    let list_class = move || {
        let slots = tier_ids.with(Vec::len);
        match (dnd.dragging.get(), dnd.target.get()) {
            (Some(DragSource::Tier { .. }), Some(DropTarget::TierSlot(slot))) if slot == slots => "tier-list drop-end",
            _ => "tier-list",
        }
    };

    let add_tier = move |_| {
        let state = engine.state();
        let order = state.tiers().iter().map(|t| t.order).max().map_or(0, |o| o + 1);
        let id = format!("tier-{}", js_sys::Date::now() as u64);
        engine.emit(Event::TierAdded {
            tier: Tier::new(id, "New", NEW_TIER_COLOR, order),
        });
    };

    view! {
        <section class="board">
            <Show
                when=move || has_list.get()
                fallback=|| view! { <div class="board-empty">"Loading tier list…"</div> }
            >
                <div class=list_class>
                    <For
                        each=move || tier_ids.get()
                        key=|id| id.clone()
                        children=move |id| view! { <TierRow tier_id=id board=board /> }
                    />
                </div>
                <Show when=move || !read_only.get()>
                    <div class="board-toolbar">
                        <button class="add-tier-btn" on:click=add_tier>"+ Add tier"</button>
                        <button
                            class="reset-btn"
                            title="Move every item back to the pool"
                            disabled=move || board.with(|b| b.ranked_count == 0)
                            on:click=move |_| engine.emit(Event::TiersReset)
                        >
                            "Reset"
                        </button>
                    </div>
                </Show>
            </Show>
        </section>
    }
}
