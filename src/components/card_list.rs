//! Card List Component
//!
//! One drop zone of cards (a tier's items or the unranked pool). Cards are
//! kept in a [`KeyedList`] so that an update only creates, removes and
//! moves what actually changed. The zone also hosts the drop placeholder.

use leptos::prelude::*;
use leptos_dragdrop::DndSignals;
use tierforge_core::reconcile::{Component, KeyedList};
use tierforge_core::view_model::CardView;
use tierforge_core::{Container, DropTarget, ItemId};

use super::item_card::{CardEnv, CardNode, CardProps};
use super::tooltip::TooltipSignal;
use crate::context::use_engine;
use crate::dnd::{moving_ids, placeholder_anchors, Placeholder};
use crate::dom::{self, ElementHost};

#[component]
pub fn CardList(
    container: Container,
    #[prop(into)] cards: Signal<Vec<CardView>>,
    #[prop(into)] read_only: Signal<bool>,
    #[prop(optional, into)] class: String,
) -> impl IntoView {
    let engine = use_engine();
    let dnd = expect_context::<DndSignals>();
    let env = CardEnv {
        engine,
        dnd,
        tooltip: expect_context::<TooltipSignal>(),
    };

    let host_ref = NodeRef::<leptos::html::Div>::new();
    let list = StoredValue::new_local(KeyedList::<ItemId, CardNode>::new());
    let placeholder = StoredValue::new_local(Placeholder::new());

    // Reconcile cards
    Effect::new(move |_| {
        let cards = cards.get();
        let read_only = read_only.get();
        let Some(el) = host_ref.get() else {
            return;
        };
        let mut host = ElementHost::new(el.into());
        let desired: Vec<(ItemId, CardProps)> = cards
            .into_iter()
            .map(|card| (card.item.id.clone(), CardProps { card, read_only }))
            .collect();
        list.update_value(|list| {
            let patch = list.try_update(&mut host, desired, |_, props| CardNode::new(env, props));
            if !patch.is_empty() {
                tracing::trace!(
                    created = patch.create.len(),
                    removed = patch.destroy.len(),
                    moved = patch.moves.len(),
                    "cards reconciled"
                );
            }
        });
    });

    // Placeholder
    let zone = container.clone();
    Effect::new(move |_| {
        let target = dnd.target.get();
        let source = dnd.dragging.get();
        let Some(el) = host_ref.get() else {
            return;
        };
        let parent: web_sys::Element = el.into();
        match (target, source) {
            (Some(DropTarget::Slot { container, index }), Some(source)) if container == zone => {
                let state = engine.state();
                let anchors = placeholder_anchors(state.container_items(&zone), &moving_ids(&source), index);
                let anchor = list.with_value(|list| {
                    anchors
                        .iter()
                        .find_map(|id| list.get(id).map(|card| card.node().clone()))
                });
                placeholder.with_value(|p| p.show(&parent, anchor.as_ref()));
            }
            _ => placeholder.with_value(Placeholder::hide),
        }
    });

    // Fade the cards being dragged
    Effect::new(move |_| {
        let moving = dnd.dragging.get().map(|s| moving_ids(&s)).unwrap_or_default();
        cards.track();
        list.with_value(|list| {
            for (id, card) in list.iter() {
                dom::toggle_class(card.node(), "dragging", moving.contains(id));
            }
        });
    });

    view! {
        <div
            node_ref=host_ref
            class=format!("card-zone {class}")
            data-container=container.as_str().to_string()
        ></div>
    }
}
