//! Auto Save
//!
//! Debounced persistence of the tier sequence. [`AutoSaveMachine`] holds the
//! pure bookkeeping (one save in flight at most, a pending flag, the
//! fingerprint of the last persisted tiers); [`AutoSave`] wires it to the
//! store, the bus, the backend and a timer.
//!
//! ```text
//! mutation -> (re)start debounce -> fire -> begin()
//!                                            |-- Skip      (unchanged since last save)
//!                                            |-- Deferred  (save in flight, pending = true)
//!                                            `-- Start     -> update_tier_list -> finish()
//!                                                                                  `-- pending? schedule again
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::api::PersistenceApi;
use crate::bus::{EventBus, Subscription};
use crate::event::Event;
use crate::models::UpdateTierList;
use crate::runtime::{Runtime, TimerHandle};
use crate::store::{tiers_fingerprint, StateManager, SubscribeOptions};

pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_secs(2);

/// Outcome of asking the machine to save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Begin {
    Start,
    /// Another save is running; it will re-schedule when done
    Deferred,
    /// Tiers match the last persisted fingerprint
    Skip,
}

/// Coarse status for the header indicator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoSaveMachine {
    saving: bool,
    pending_save: bool,
    last_saved: Option<String>,
    last_error: Option<String>,
}

impl AutoSaveMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, fingerprint: &str) -> Begin {
        if self.saving {
            self.pending_save = true;
            return Begin::Deferred;
        }
        if self.last_saved.as_deref() == Some(fingerprint) {
            return Begin::Skip;
        }
        self.saving = true;
        Begin::Start
    }

    /// Record the result of the save started by `begin`. Returns true when
    /// a request arrived meanwhile and another save should be scheduled.
    pub fn finish(&mut self, result: Result<String, String>) -> bool {
        self.saving = false;
        match result {
            Ok(fingerprint) => {
                self.last_saved = Some(fingerprint);
                self.last_error = None;
            }
            Err(message) => self.last_error = Some(message),
        }
        std::mem::take(&mut self.pending_save)
    }

    /// The save finished for a list that is no longer loaded; only the
    /// in-flight bookkeeping is cleared.
    pub fn finish_stale(&mut self) -> bool {
        self.saving = false;
        std::mem::take(&mut self.pending_save)
    }

    /// The tiers with this fingerprint are known to match the server
    /// (a freshly loaded list).
    pub fn mark_saved(&mut self, fingerprint: String) {
        self.last_saved = Some(fingerprint);
        self.last_error = None;
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn has_pending(&self) -> bool {
        self.pending_save
    }

    pub fn is_dirty(&self, fingerprint: &str) -> bool {
        self.last_saved.as_deref() != Some(fingerprint)
    }

    pub fn status(&self) -> SaveStatus {
        if self.saving {
            SaveStatus::Saving
        } else if let Some(message) = &self.last_error {
            SaveStatus::Error(message.clone())
        } else if self.last_saved.is_some() {
            SaveStatus::Saved
        } else {
            SaveStatus::Idle
        }
    }
}

/// What the driver watches: which list, its tiers, and whether it is editable
#[derive(Debug, Clone, PartialEq, Eq)]
struct Watched {
    list_id: Option<String>,
    fingerprint: String,
    read_only: bool,
}

struct Inner {
    store: StateManager,
    bus: EventBus,
    api: Rc<dyn PersistenceApi>,
    runtime: Rc<dyn Runtime>,
    delay: Duration,
    machine: RefCell<AutoSaveMachine>,
    timer: RefCell<Option<TimerHandle>>,
    watch: RefCell<Option<Subscription>>,
}

/// Clonable handle; clones drive the same saver.
#[derive(Clone)]
pub struct AutoSave {
    inner: Rc<Inner>,
}

impl AutoSave {
    pub fn new(
        store: StateManager,
        bus: EventBus,
        api: Rc<dyn PersistenceApi>,
        runtime: Rc<dyn Runtime>,
        delay: Duration,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                store,
                bus,
                api,
                runtime,
                delay,
                machine: RefCell::new(AutoSaveMachine::new()),
                timer: RefCell::new(None),
                watch: RefCell::new(None),
            }),
        }
    }

    /// Start watching the store. Calling it twice replaces the watch.
    pub fn start(&self) {
        let weak = Rc::downgrade(&self.inner);
        let subscription = self.inner.store.subscribe(
            |state| Watched {
                list_id: state.tier_list.as_ref().map(|tl| tl.id.clone()),
                fingerprint: tiers_fingerprint(state),
                read_only: state.read_only,
            },
            move |next: &Watched, prev: &Watched| {
                if let Some(inner) = weak.upgrade() {
                    AutoSave { inner }.on_change(next, prev);
                }
            },
            SubscribeOptions::default(),
        );
        *self.inner.watch.borrow_mut() = Some(subscription);
    }

    pub fn stop(&self) {
        self.inner.watch.borrow_mut().take();
        self.inner.timer.borrow_mut().take();
    }

    /// Drop a scheduled save without running it.
    pub fn cancel(&self) {
        self.inner.timer.borrow_mut().take();
    }

    /// Save now instead of waiting for the debounce. Returns true when a
    /// save was started.
    pub fn flush(&self) -> bool {
        self.inner.timer.borrow_mut().take();
        self.save_now()
    }

    pub fn status(&self) -> SaveStatus {
        self.inner.machine.borrow().status()
    }

    pub fn is_saving(&self) -> bool {
        self.inner.machine.borrow().is_saving()
    }

    /// Whether the current tiers differ from what was last persisted
    pub fn is_dirty(&self) -> bool {
        let fingerprint = self.inner.store.tiers_fingerprint();
        self.inner.machine.borrow().is_dirty(&fingerprint)
    }

    pub fn has_scheduled(&self) -> bool {
        self.inner.timer.borrow().is_some()
    }

    fn on_change(&self, next: &Watched, prev: &Watched) {
        if next.list_id != prev.list_id {
            // A different list was loaded: it is what the server has.
            self.inner.timer.borrow_mut().take();
            self.inner.machine.borrow_mut().mark_saved(next.fingerprint.clone());
            return;
        }
        if next.read_only || next.list_id.is_none() || next.fingerprint == prev.fingerprint {
            return;
        }
        self.schedule();
    }

    fn schedule(&self) {
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        let handle = self.inner.runtime.schedule(
            self.inner.delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let autosave = AutoSave { inner };
                    autosave.inner.timer.borrow_mut().take();
                    autosave.save_now();
                }
            }),
        );
        // Replacing the handle cancels the previous debounce.
        let previous = self.inner.timer.borrow_mut().replace(handle);
        drop(previous);
    }

    fn save_now(&self) -> bool {
        let state = self.inner.store.get_state();
        if state.read_only {
            return false;
        }
        let Some(tier_list) = state.tier_list.as_ref() else {
            return false;
        };

        let fingerprint = tiers_fingerprint(&state);
        match self.inner.machine.borrow_mut().begin(&fingerprint) {
            Begin::Start => {}
            Begin::Deferred => {
                tracing::debug!("save in flight, deferring");
                return false;
            }
            Begin::Skip => return false,
        }

        self.inner.bus.emit(Event::AutoSaveStarted);
        let id = tier_list.id.clone();
        let tiers = tier_list.tiers.clone();
        let this = self.clone();
        self.inner.runtime.spawn_local(Box::pin(async move {
            let result = this.inner.api.update_tier_list(&id, UpdateTierList::tiers(tiers)).await;
            this.complete(id, fingerprint, result.map(|_| ()).map_err(|e| e.to_string()));
        }));
        true
    }

    fn complete(&self, id: String, fingerprint: String, result: Result<(), String>) {
        let current = self.inner.store.get_state().tier_list.as_ref().is_some_and(|tl| tl.id == id);
        let reschedule = {
            let mut machine = self.inner.machine.borrow_mut();
            if current {
                machine.finish(result.clone().map(|()| fingerprint))
            } else {
                machine.finish_stale()
            }
        };

        match result {
            Ok(()) => {
                tracing::debug!(%id, "auto-save succeeded");
                self.inner.bus.emit(Event::AutoSaveSucceeded { tier_list_id: id });
            }
            Err(message) => {
                tracing::warn!(%id, %message, "auto-save failed");
                self.inner.bus.emit(Event::AutoSaveFailed { message });
            }
        }

        if reschedule {
            self.schedule();
        }
    }
}

impl std::fmt::Debug for AutoSave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoSave")
            .field("machine", &*self.inner.machine.borrow())
            .field("scheduled", &self.has_scheduled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_skips_unchanged() {
        let mut machine = AutoSaveMachine::new();
        machine.mark_saved("a".into());
        assert_eq!(machine.begin("a"), Begin::Skip);
        assert_eq!(machine.begin("b"), Begin::Start);
        assert_eq!(machine.status(), SaveStatus::Saving);
    }

    #[test]
    fn test_machine_defers_while_saving() {
        let mut machine = AutoSaveMachine::new();
        assert_eq!(machine.begin("a"), Begin::Start);
        assert_eq!(machine.begin("b"), Begin::Deferred);
        assert!(machine.has_pending());

        assert!(machine.finish(Ok("a".into())));
        assert!(!machine.has_pending());
        assert!(machine.is_dirty("b"));
        assert_eq!(machine.begin("b"), Begin::Start);
        assert!(!machine.finish(Ok("b".into())));
        assert_eq!(machine.status(), SaveStatus::Saved);
    }

    #[test]
    fn test_machine_failure_keeps_dirty() {
        let mut machine = AutoSaveMachine::new();
        machine.begin("a");
        assert!(!machine.finish(Err("offline".into())));
        assert_eq!(machine.status(), SaveStatus::Error("offline".into()));
        assert_eq!(machine.begin("a"), Begin::Start);
    }

    #[test]
    fn test_machine_stale_finish_keeps_fingerprint() {
        let mut machine = AutoSaveMachine::new();
        machine.begin("old");
        machine.mark_saved("new".into());
        assert!(!machine.finish_stale());
        assert!(!machine.is_saving());
        assert!(!machine.is_dirty("new"));
    }
}
