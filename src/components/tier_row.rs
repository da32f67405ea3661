//! Tier Row Component
//!
//! One tier: a draggable label (double-click to rename), its cards, and
//! the editing controls.

use leptos::prelude::*;
use leptos_dragdrop::{make_on_pointerdown, DndSignals};
use tierforge_core::view_model::BoardView;
use tierforge_core::{Container, DragSource, DropTarget, Event, Tier};

use super::{CardList, DeleteConfirmButton};
use crate::context::use_engine;
use crate::dnd;

#[component]
pub fn TierRow(tier_id: String, board: ReadSignal<BoardView>) -> impl IntoView {
    let engine = use_engine();
    let dnd = expect_context::<DndSignals>();
    let editing = RwSignal::new(false);

    let id = tier_id.clone();
    let tier = Memo::new(move |_| board.with(|b| b.tier(&id).cloned()));
    let id = tier_id.clone();
    let index = Memo::new(move |_| board.with(|b| b.tiers.iter().position(|t| t.id == id).unwrap_or_default()));
    let read_only = Memo::new(move |_| board.with(|b| b.read_only));

    let cards = Signal::derive(move || tier.with(|t| t.as_ref().map(|t| t.cards.clone()).unwrap_or_default()));
    let name = move || tier.with(|t| t.as_ref().map(|t| t.name.clone()).unwrap_or_default());
    let color = move || tier.with(|t| t.as_ref().map(|t| t.color.clone()).unwrap_or_default());

    // Emits only when something actually changed
    let update = move |name: Option<String>, color: Option<String>| {
        let Some(current) = tier.get_untracked() else {
            return;
        };
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| current.name.clone());
        let color = color.unwrap_or_else(|| current.color.clone());
        if name == current.name && color == current.color {
            return;
        }
        engine.emit(Event::TierUpdated {
            tier: Tier::new(current.id, name, color, current.order),
        });
    };

    let id = tier_id.clone();
    let row_class = move || {
        let mut class = String::from("tier-row");
        match (dnd.dragging.get(), dnd.target.get()) {
            (Some(DragSource::Tier { tier_id, .. }), target) => {
                if tier_id == id {
                    class.push_str(" dragging");
                }
                if target == Some(DropTarget::TierSlot(index.get())) {
                    class.push_str(" drop-before");
                }
            }
            (Some(DragSource::Item { .. }), Some(DropTarget::Slot { container, .. })) if container.as_str() == id => {
                class.push_str(" drop-target");
            }
            _ => {}
        }
        class
    };

    let id = tier_id.clone();
    let on_dragstart = move |ev: web_sys::DragEvent| {
        if read_only.get_untracked() || editing.get_untracked() {
            ev.prevent_default();
            return;
        }
        dnd::start_tier_drag(engine, dnd, &ev, id.clone(), index.get_untracked());
    };
    let id = tier_id.clone();
    let on_pointerdown = make_on_pointerdown(dnd, move || {
        (!read_only.get_untracked() && !editing.get_untracked())
            .then(|| DragSource::tier(id.clone(), index.get_untracked()))
    });

    let (up_id, down_id, clear_id, remove_id) = (tier_id.clone(), tier_id.clone(), tier_id.clone(), tier_id.clone());

    view! {
        <div class=row_class data-tier-id=tier_id.clone()>
            <div
                class="tier-label"
                style=move || format!("background-color: {};", color())
                draggable=move || if read_only.get() { "false" } else { "true" }
                on:dragstart=on_dragstart
                on:dragend=move |_| dnd::drag_end(engine, dnd)
                on:pointerdown=on_pointerdown
                on:dblclick=move |_| {
                    if !read_only.get_untracked() {
                        editing.set(true);
                    }
                }
            >
                <Show
                    when=move || editing.get()
                    fallback=move || view! { <span class="tier-name">{name}</span> }
                >
                    <input
                        class="tier-name-input"
                        prop:value=name
                        autofocus=true
                        on:keydown=move |ev| match ev.key().as_str() {
                            "Enter" => {
                                update(Some(event_target_value(&ev)), None);
                                editing.set(false);
                            }
                            "Escape" => editing.set(false),
                            _ => {}
                        }
                        on:blur=move |ev| {
                            update(Some(event_target_value(&ev)), None);
                            editing.set(false);
                        }
                    />
                </Show>
            </div>

            <CardList
                container=Container::tier(tier_id.clone())
                cards=cards
                read_only=read_only
                class="tier-items"
            />

            <Show when=move || !read_only.get()>
                <div class="tier-controls">
                    <input
                        type="color"
                        class="tier-color"
                        title="Tier color"
                        prop:value=color
                        on:change=move |ev| update(None, Some(event_target_value(&ev)))
                    />
                    <button
                        class="tier-btn"
                        title="Move up"
                        disabled=move || index.get() == 0
                        on:click={
                            let id = up_id.clone();
                            move |_| engine.emit(Event::TierMoveUp { tier_id: id.clone() })
                        }
                    >
                        "▲"
                    </button>
                    <button
                        class="tier-btn"
                        title="Move down"
                        disabled=move || { index.get() + 1 >= board.with(|b| b.tiers.len()) }
                        on:click={
                            let id = down_id.clone();
                            move |_| engine.emit(Event::TierMoveDown { tier_id: id.clone() })
                        }
                    >
                        "▼"
                    </button>
                    <button
                        class="tier-btn"
                        title="Send items back to the pool"
                        disabled=move || cards.with(Vec::is_empty)
                        on:click={
                            let id = clear_id.clone();
                            move |_| engine.emit(Event::TierCleared { tier_id: id.clone() })
                        }
                    >
                        "⟲"
                    </button>
                    <DeleteConfirmButton
                        button_class="tier-delete-btn"
                        title="Remove tier"
                        on_confirm={
                            let id = remove_id.clone();
                            Callback::new(move |_| engine.emit(Event::TierRemoved { tier_id: id.clone() }))
                        }
                    />
                </div>
            </Show>
        </div>
    }
}
