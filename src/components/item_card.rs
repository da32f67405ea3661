//! Item Card
//!
//! Cards are plain elements owned by a keyed list. New props are applied
//! in place, so a card keeps its node (and focus, and hover) across
//! reorders. Listeners are removed when the card is destroyed.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos_dragdrop::{make_on_pointerdown, DndSignals};
use tierforge_core::reconcile::Component;
use tierforge_core::view_model::CardView;
use tierforge_core::{DragSource, Event};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use super::tooltip::TooltipSignal;
use crate::context::EngineHandle;
use crate::{dnd, dom};

#[derive(Debug, Clone, PartialEq)]
pub struct CardProps {
    pub card: CardView,
    pub read_only: bool,
}

/// What every card handler needs
#[derive(Clone, Copy)]
pub struct CardEnv {
    pub engine: EngineHandle,
    pub dnd: DndSignals,
    pub tooltip: TooltipSignal,
}

type Listener = Closure<dyn FnMut(web_sys::Event)>;

pub struct CardNode {
    el: web_sys::Element,
    icon: web_sys::Element,
    label: web_sys::Element,
    props: Rc<RefCell<CardProps>>,
    listeners: Vec<(&'static str, Listener)>,
}

impl CardNode {
    pub fn new(env: CardEnv, props: &CardProps) -> Option<Self> {
        let el = dom::element("div", "item-card")?;
        let icon = dom::element("img", "item-icon")?;
        let label = dom::element("span", "item-name")?;
        el.append_child(&icon).ok()?;
        el.append_child(&label).ok()?;
        el.set_attribute("data-item-id", &props.card.item.id).ok()?;

        let mut node = Self {
            el,
            icon,
            label,
            props: Rc::new(RefCell::new(props.clone())),
            listeners: Vec::new(),
        };
        node.render(props, None);
        node.listen(env);
        Some(node)
    }

    fn drag_source(props: &CardProps, env: CardEnv) -> DragSource {
        let card = &props.card;
        DragSource::item(card.item.id.clone(), card.container.clone(), card.index)
            .with_group(env.engine.state().ordered_selection())
    }

    /// Write what changed since `prev`
    fn render(&self, next: &CardProps, prev: Option<&CardProps>) {
        let item = &next.card.item;
        dom::toggle_class(&self.el, "selected", next.card.selected);
        dom::toggle_class(&self.el, "dimmed", next.card.dimmed);
        let _ = self
            .el
            .set_attribute("draggable", if next.read_only { "false" } else { "true" });

        if prev.map_or(true, |p| p.card.item.icon != item.icon) {
            if item.icon.is_empty() {
                let _ = self.icon.remove_attribute("src");
            } else {
                let _ = self.icon.set_attribute("src", &item.icon);
            }
            dom::toggle_class(&self.icon, "hidden", item.icon.is_empty());
        }
        if prev.map_or(true, |p| p.card.item.name != item.name) {
            let _ = self.icon.set_attribute("alt", &item.name);
            self.label.set_text_content(Some(&item.name));
        }
    }

    fn on(&mut self, event: &'static str, handler: impl FnMut(web_sys::Event) + 'static) {
        let listener = Listener::new(handler);
        let added = self
            .el
            .add_event_listener_with_callback(event, listener.as_ref().unchecked_ref());
        if added.is_ok() {
            self.listeners.push((event, listener));
        }
    }

    fn listen(&mut self, env: CardEnv) {
        let props = Rc::clone(&self.props);
        self.on("click", move |ev| {
            // The click that ends a touch drag is not a selection.
            if env.dnd.drag_just_ended.get_untracked() {
                return;
            }
            let Some(mouse) = ev.dyn_ref::<web_sys::MouseEvent>() else {
                return;
            };
            let item_id = props.borrow().card.item.id.clone();
            env.engine.emit(Event::ItemClicked {
                item_id,
                multi_select: mouse.ctrl_key() || mouse.meta_key(),
                range_select: mouse.shift_key(),
            });
        });

        let props = Rc::clone(&self.props);
        self.on("dragstart", move |ev| {
            let Some(drag) = ev.dyn_ref::<web_sys::DragEvent>() else {
                return;
            };
            let props = props.borrow();
            if props.read_only {
                ev.prevent_default();
                return;
            }
            env.tooltip.hide();
            dnd::start_item_drag(env.engine, env.dnd, drag, Self::drag_source(&props, env));
        });

        self.on("dragend", move |_| dnd::drag_end(env.engine, env.dnd));

        let props = Rc::clone(&self.props);
        let on_pointerdown = make_on_pointerdown(env.dnd, move || {
            let props = props.borrow();
            (!props.read_only).then(|| Self::drag_source(&props, env))
        });
        self.on("pointerdown", move |ev| {
            if let Ok(pointer) = ev.dyn_into::<web_sys::PointerEvent>() {
                on_pointerdown(pointer);
            }
        });

        let props = Rc::clone(&self.props);
        let el = self.el.clone();
        self.on("mouseenter", move |_| {
            if env.dnd.is_idle() {
                env.tooltip.show(props.borrow().card.item.clone(), dom::rect(&el));
            }
        });
        self.on("mouseleave", move |_| env.tooltip.hide());
    }

    fn detach(&mut self) {
        for (event, listener) in self.listeners.drain(..) {
            let _ = self
                .el
                .remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref());
        }
    }
}

impl Component for CardNode {
    type Props = CardProps;
    type Node = web_sys::Element;

    fn node(&self) -> &web_sys::Element {
        &self.el
    }

    fn update_props(&mut self, props: &CardProps) {
        let prev = self.props.replace(props.clone());
        if prev != *props {
            self.render(props, Some(&prev));
        }
    }

    fn destroy(&mut self) {
        self.detach();
    }
}

impl Drop for CardNode {
    fn drop(&mut self) {
        self.detach();
    }
}
