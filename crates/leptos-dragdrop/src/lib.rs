//! Leptos DragDrop Utilities
//!
//! Pointer-capture drag and drop for touch and pen input. Mouse drags go
//! through native HTML5 drag events in the app; both paths feed the same
//! [`DragSession`], so previews and drops behave identically.
//!
//! A press only becomes a drag once the pointer travels past the session's
//! threshold, which keeps taps working as clicks.

use leptos::prelude::*;
use tierforge_core::layout::Point;
use tierforge_core::{DragSession, DragSource, DropTarget, Event};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// How long clicks are swallowed after a drag ends, in ms
const CLICK_SUPPRESS_MS: i32 = 100;

/// DnD state: the session plus signals mirroring it for the view
#[derive(Clone, Copy)]
pub struct DndSignals {
    session: StoredValue<DragSession>,
    /// What is being dragged, once the gesture became a drag
    pub dragging: RwSignal<Option<DragSource>>,
    /// Current preview target
    pub target: RwSignal<Option<DropTarget>>,
    /// True briefly after a drag so the trailing click is ignored
    pub drag_just_ended: RwSignal<bool>,
}

pub fn create_dnd_signals() -> DndSignals {
    DndSignals {
        session: StoredValue::new(DragSession::new()),
        dragging: RwSignal::new(None),
        target: RwSignal::new(None),
        drag_just_ended: RwSignal::new(false),
    }
}

impl DndSignals {
    /// Copy the session's state into the signals
    fn sync(&self) {
        let (source, target) = self.session.with_value(|s| {
            let source = s.is_dragging().then(|| s.source().cloned()).flatten();
            (source, s.target().cloned())
        });
        if self.dragging.get_untracked() != source {
            self.dragging.set(source);
        }
        if self.target.get_untracked() != target {
            self.target.set(target);
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.with_value(DragSession::is_dragging)
    }

    pub fn is_idle(&self) -> bool {
        self.session.with_value(DragSession::is_idle)
    }

    /// Start immediately (native `dragstart`)
    pub fn begin(&self, source: DragSource) {
        self.session.update_value(|s| s.begin(source));
        self.sync();
    }

    /// Update the preview
    pub fn hover(&self, target: DropTarget) {
        if self.session.try_update_value(|s| s.hover(target)).unwrap_or(false) {
            self.sync();
        }
    }

    pub fn leave(&self) {
        if self.session.try_update_value(DragSession::leave).unwrap_or(false) {
            self.sync();
        }
    }

    /// Finish the gesture; returns the event to emit for a real drop
    pub fn commit(&self) -> Option<Event> {
        let was_dragging = self.is_dragging();
        let event = self.session.try_update_value(DragSession::commit).flatten();
        if was_dragging {
            end_drag(self);
        } else {
            self.sync();
        }
        event
    }

    /// Abort the gesture (Escape, pointercancel, drop outside)
    pub fn cancel(&self) -> bool {
        let was_dragging = self.is_dragging();
        let active = self.session.try_update_value(DragSession::cancel).unwrap_or(false);
        if was_dragging {
            end_drag(self);
        } else {
            self.sync();
        }
        active
    }
}

/// Clear drag state and swallow the click that follows the release
pub fn end_drag(dnd: &DndSignals) {
    dnd.sync();
    dnd.drag_just_ended.set(true);

    if let Some(win) = web_sys::window() {
        let clear = dnd.drag_just_ended;
        let cb = Closure::<dyn FnMut()>::new(move || {
            clear.set(false);
        });
        let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            CLICK_SUPPRESS_MS,
        );
        cb.forget();
    }
}

fn point(ev: &web_sys::PointerEvent) -> Point {
    Point::new(ev.client_x() as f64, ev.client_y() as f64)
}

/// Create pointerdown handler for a draggable element. Mouse presses are
/// left to native drag and drop; touch and pen presses start a pending
/// gesture and capture the pointer.
pub fn make_on_pointerdown<F>(dnd: DndSignals, source: F) -> impl Fn(web_sys::PointerEvent) + Clone + 'static
where
    F: Fn() -> Option<DragSource> + Clone + 'static,
{
    move |ev: web_sys::PointerEvent| {
        if ev.pointer_type() == "mouse" || !ev.is_primary() {
            return;
        }
        // Ignore if target is a control
        if let Some(target) = ev.target() {
            if target.dyn_ref::<web_sys::HtmlInputElement>().is_some()
                || target.dyn_ref::<web_sys::HtmlButtonElement>().is_some()
                || target.dyn_ref::<web_sys::HtmlSelectElement>().is_some()
            {
                return;
            }
        }
        let Some(drag_source) = source() else {
            return;
        };
        dnd.session.update_value(|s| s.press(drag_source, point(&ev)));

        if let Some(element) = ev.current_target().and_then(|t| t.dyn_into::<web_sys::Element>().ok()) {
            let _ = element.set_pointer_capture(ev.pointer_id());
        }
    }
}

/// Bind document-level pointer handlers.
///
/// `resolve` maps a pointer position to the drop target under it (or
/// `None` outside every zone). `emit` receives the gesture notifications
/// (`DragStarted`, `DragPreview`, `DragEnded`) and the event of a
/// committed drop, in that order.
pub fn bind_global_pointer_handlers<R, E>(dnd: DndSignals, resolve: R, emit: E)
where
    R: Fn(Point, &DragSource) -> Option<DropTarget> + 'static,
    E: Fn(Event) + Clone + 'static,
{
    let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };

    let emit_move = emit.clone();
    let on_pointermove = Closure::<dyn FnMut(web_sys::PointerEvent)>::new(move |ev: web_sys::PointerEvent| {
        if dnd.is_idle() {
            return;
        }
        let at = point(&ev);
        let started = dnd.session.try_update_value(|s| s.pointer_moved(at)).unwrap_or(false);
        let Some(source) = dnd.session.with_value(|s| s.is_dragging().then(|| s.source().cloned()).flatten()) else {
            return;
        };
        ev.prevent_default();
        if started {
            dnd.sync();
            emit_move(Event::DragStarted { source: source.clone() });
        }

        let before = dnd.target.get_untracked();
        match resolve(at, &source) {
            Some(target) => dnd.hover(target),
            None => dnd.leave(),
        }
        let after = dnd.target.get_untracked();
        if before != after {
            emit_move(Event::DragPreview { target: after });
        }
    });

    let emit_up = emit.clone();
    let on_pointerup = Closure::<dyn FnMut(web_sys::PointerEvent)>::new(move |_ev: web_sys::PointerEvent| {
        if dnd.is_idle() {
            return;
        }
        // A press that never became a drag is a tap; the click fires naturally.
        let was_dragging = dnd.is_dragging();
        let event = dnd.commit();
        if !was_dragging {
            return;
        }
        let committed = event.is_some();
        tracing::debug!(committed, "pointer drag released");
        if let Some(event) = event {
            emit_up(event);
        }
        emit_up(Event::DragEnded { committed });
    });

    let on_pointercancel = Closure::<dyn FnMut(web_sys::PointerEvent)>::new(move |_ev: web_sys::PointerEvent| {
        let was_dragging = dnd.is_dragging();
        if dnd.cancel() && was_dragging {
            emit(Event::DragEnded { committed: false });
        }
    });

    let _ = doc.add_event_listener_with_callback("pointermove", on_pointermove.as_ref().unchecked_ref());
    let _ = doc.add_event_listener_with_callback("pointerup", on_pointerup.as_ref().unchecked_ref());
    let _ = doc.add_event_listener_with_callback("pointercancel", on_pointercancel.as_ref().unchecked_ref());
    on_pointermove.forget();
    on_pointerup.forget();
    on_pointercancel.forget();
}
