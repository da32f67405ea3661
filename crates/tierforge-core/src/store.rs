//! State Manager
//!
//! Single source of truth. Listens to every bus event, runs [`reduce`] and,
//! when something changed, re-evaluates each selector subscription. A
//! callback only fires when its selected value differs from the last one it
//! saw.
//!
//! States are shared as `Rc<AppState>` snapshots; a dispatch copies on
//! write, so a snapshot handed out earlier never changes under its holder.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::bus::{EventBus, Subscription};
use crate::event::Event;
use crate::history::DEFAULT_HISTORY_CAP;
use crate::state::{reduce, AppState};

type Equals<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// Per-subscription options
pub struct SubscribeOptions<T> {
    /// Replaces `PartialEq` when deciding whether the value changed
    pub equals: Option<Equals<T>>,
    /// Invoke the callback once right away with the current value
    pub immediate: bool,
}

impl<T> Default for SubscribeOptions<T> {
    fn default() -> Self {
        Self {
            equals: None,
            immediate: false,
        }
    }
}

impl<T> SubscribeOptions<T> {
    pub fn immediate() -> Self {
        Self {
            immediate: true,
            ..Self::default()
        }
    }

    pub fn with_equals(mut self, equals: impl Fn(&T, &T) -> bool + 'static) -> Self {
        self.equals = Some(Rc::new(equals));
        self
    }
}

trait Watcher {
    fn check(&self, state: &AppState);
}

struct SelectorWatcher<T, S, C> {
    selector: S,
    callback: C,
    equals: Equals<T>,
    last: RefCell<T>,
}

impl<T, S, C> Watcher for SelectorWatcher<T, S, C>
where
    T: Clone,
    S: Fn(&AppState) -> T,
    C: Fn(&T, &T),
{
    fn check(&self, state: &AppState) {
        let next = (self.selector)(state);
        if (self.equals)(&self.last.borrow(), &next) {
            return;
        }
        let prev = self.last.replace(next.clone());
        // No borrow is held here: the callback may dispatch again.
        (self.callback)(&next, &prev);
    }
}

struct Registered {
    id: u64,
    active: Rc<Cell<bool>>,
    watcher: Rc<dyn Watcher>,
}

struct Inner {
    state: RefCell<Rc<AppState>>,
    watchers: RefCell<Vec<Registered>>,
    next_id: Cell<u64>,
}

/// Clonable handle; clones share one store.
#[derive(Clone)]
pub struct StateManager {
    inner: Rc<Inner>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

impl fmt::Debug for StateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateManager")
            .field("watchers", &self.watcher_count())
            .finish_non_exhaustive()
    }
}

impl StateManager {
    pub fn new(history_cap: usize) -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(Rc::new(AppState::with_history_cap(history_cap))),
                watchers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Current immutable snapshot
    pub fn get_state(&self) -> Rc<AppState> {
        Rc::clone(&self.inner.state.borrow())
    }

    /// Route every bus event through `dispatch`.
    pub fn attach(&self, bus: &EventBus) -> Subscription {
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        bus.on_all(move |event| {
            if let Some(inner) = weak.upgrade() {
                StateManager { inner }.dispatch(event);
            }
        })
    }

    /// Apply one event. Returns whether the state changed; watchers have
    /// been notified by the time this returns.
    pub fn dispatch(&self, event: &Event) -> bool {
        if !event.affects_state() {
            return false;
        }
        let changed = {
            let mut state = self.inner.state.borrow_mut();
            reduce(Rc::make_mut(&mut *state), event)
        };
        if changed {
            tracing::debug!(event = event.kind().name(), "state changed");
            self.notify();
        }
        changed
    }

    /// Watch a derived value. `callback(new, previous)` runs whenever the
    /// selected value changes.
    pub fn subscribe<T, S, C>(&self, selector: S, callback: C, options: SubscribeOptions<T>) -> Subscription
    where
        T: Clone + PartialEq + 'static,
        S: Fn(&AppState) -> T + 'static,
        C: Fn(&T, &T) + 'static,
    {
        let initial = selector(&self.get_state());
        if options.immediate {
            callback(&initial, &initial);
        }

        let watcher = SelectorWatcher {
            selector,
            callback,
            equals: options.equals.unwrap_or_else(|| Rc::new(|a: &T, b: &T| a == b)),
            last: RefCell::new(initial),
        };

        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let active = Rc::new(Cell::new(true));
        self.inner.watchers.borrow_mut().push(Registered {
            id,
            active: Rc::clone(&active),
            watcher: Rc::new(watcher),
        });

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            active.set(false);
            if let Some(inner) = weak.upgrade() {
                inner.watchers.borrow_mut().retain(|w| w.id != id);
            }
        })
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.borrow().len()
    }

    pub fn can_undo(&self) -> bool {
        self.get_state().history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.get_state().history.can_redo()
    }

    /// Serialized tier sequence of the current state
    pub fn tiers_fingerprint(&self) -> String {
        tiers_fingerprint(&self.get_state())
    }

    fn notify(&self) {
        let watchers: Vec<(Rc<Cell<bool>>, Rc<dyn Watcher>)> = self
            .inner
            .watchers
            .borrow()
            .iter()
            .map(|w| (Rc::clone(&w.active), Rc::clone(&w.watcher)))
            .collect();

        for (active, watcher) in watchers {
            // A callback earlier in this pass may have unsubscribed it.
            if !active.get() {
                continue;
            }
            // Re-read per watcher: an earlier callback may have dispatched.
            let state = self.get_state();
            watcher.check(&state);
        }
    }
}

/// Content fingerprint used to skip saves of unchanged tiers
pub fn tiers_fingerprint(state: &AppState) -> String {
    serde_json::to_string(state.tiers()).unwrap_or_default()
}
