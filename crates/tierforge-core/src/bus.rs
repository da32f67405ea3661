//! Event Bus
//!
//! Typed publish/subscribe hub. Emission is synchronous and re-entrant:
//! the handler set is captured before any handler runs, so handlers may
//! subscribe, unsubscribe or emit further events while being invoked.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::event::{Event, EventKind};

type Handler = Rc<dyn Fn(&Event)>;

struct Entry {
    id: u64,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    next_id: Cell<u64>,
    by_kind: RefCell<HashMap<EventKind, Vec<Entry>>>,
    all: RefCell<Vec<Entry>>,
}

impl BusInner {
    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn remove(&self, kind: Option<EventKind>, id: u64) {
        match kind {
            Some(kind) => {
                let mut by_kind = self.by_kind.borrow_mut();
                if let Some(entries) = by_kind.get_mut(&kind) {
                    entries.retain(|e| e.id != id);
                    if entries.is_empty() {
                        by_kind.remove(&kind);
                    }
                }
            }
            None => self.all.borrow_mut().retain(|e| e.id != id),
        }
    }
}

/// Handle to a shared event bus. Clones refer to the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<BusInner>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one event kind. Handlers of the same kind run in
    /// registration order.
    pub fn on(&self, kind: EventKind, handler: impl Fn(&Event) + 'static) -> Subscription {
        let id = self.inner.next_id();
        self.inner
            .by_kind
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(Entry { id, handler: Rc::new(handler) });
        self.subscription(Some(kind), id)
    }

    /// Subscribe to every event. Runs after the kind-specific handlers.
    pub fn on_all(&self, handler: impl Fn(&Event) + 'static) -> Subscription {
        let id = self.inner.next_id();
        self.inner
            .all
            .borrow_mut()
            .push(Entry { id, handler: Rc::new(handler) });
        self.subscription(None, id)
    }

    pub fn emit(&self, event: Event) {
        let kind = event.kind();
        tracing::trace!(event = kind.name(), "emit");

        // Capture handlers first; no borrow is held while they run.
        let handlers: Vec<Handler> = {
            let by_kind = self.inner.by_kind.borrow();
            let all = self.inner.all.borrow();
            by_kind
                .get(&kind)
                .into_iter()
                .flatten()
                .chain(all.iter())
                .map(|e| Rc::clone(&e.handler))
                .collect()
        };

        for handler in handlers {
            handler(&event);
        }
    }

    /// Number of registered handlers across all kinds
    pub fn handler_count(&self) -> usize {
        let by_kind: usize = self.inner.by_kind.borrow().values().map(Vec::len).sum();
        by_kind + self.inner.all.borrow().len()
    }

    fn subscription(&self, kind: Option<EventKind>, id: u64) -> Subscription {
        let weak: Weak<BusInner> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.remove(kind, id);
            }
        })
    }
}

/// RAII guard for a registered handler. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    /// Unsubscribe now. Calling it again is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Keep the handler registered for the lifetime of its source.
    pub fn forget(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&'static str) -> Box<dyn Fn(&Event)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = Rc::clone(&log);
        let make = move |tag: &'static str| -> Box<dyn Fn(&Event)> {
            let log = Rc::clone(&log_clone);
            Box::new(move |e: &Event| log.borrow_mut().push(format!("{tag}:{}", e.kind().name())))
        };
        (log, make)
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let _a = bus.on(EventKind::Undo, make("a"));
        let _all = bus.on_all(make("all"));
        let _b = bus.on(EventKind::Undo, make("b"));

        bus.emit(Event::Undo);
        assert_eq!(*log.borrow(), vec!["a:UNDO", "b:UNDO", "all:UNDO"]);

        bus.emit(Event::Redo);
        assert_eq!(log.borrow().last().unwrap(), "all:REDO");
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let mut sub = bus.on(EventKind::Undo, make("a"));
        assert_eq!(bus.handler_count(), 1);

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(bus.handler_count(), 0);

        bus.emit(Event::Undo);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_drop_unsubscribes_and_forget_keeps() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        {
            let _sub = bus.on(EventKind::Undo, make("dropped"));
        }
        bus.on(EventKind::Undo, make("kept")).forget();

        bus.emit(Event::Undo);
        assert_eq!(*log.borrow(), vec!["kept:UNDO"]);
    }

    #[test]
    fn test_nested_emit_from_handler() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let inner_bus = bus.clone();
        bus.on(EventKind::Undo, move |_| inner_bus.emit(Event::Redo)).forget();
        bus.on_all(make("all")).forget();

        bus.emit(Event::Undo);
        // The nested emission completes before the outer one reaches on_all.
        assert_eq!(*log.borrow(), vec!["all:REDO", "all:UNDO"]);
    }

    #[test]
    fn test_handler_set_is_captured_at_emission() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let bus_clone = bus.clone();
        let count_clone = Rc::clone(&count);
        bus.on(EventKind::Undo, move |_| {
            let count = Rc::clone(&count_clone);
            bus_clone
                .on(EventKind::Undo, move |_| count.set(count.get() + 1))
                .forget();
        })
        .forget();

        bus.emit(Event::Undo);
        assert_eq!(count.get(), 0, "handler added mid-emission must not run");
        bus.emit(Event::Undo);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_subscription_outliving_bus() {
        let bus = EventBus::new();
        let mut sub = bus.on_all(|_| {});
        drop(bus);
        sub.unsubscribe();
    }
}
