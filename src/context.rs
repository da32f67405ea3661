//! Application Context
//!
//! The engine lives in a local `StoredValue` provided via Leptos context.
//! [`use_state_slice`] turns a store selector into a signal.

use std::rc::Rc;

use leptos::prelude::*;
use tierforge_core::{AppState, Event, SubscribeOptions, TierContext, TierEngine};

/// Copyable handle to the engine and its context
#[derive(Clone, Copy)]
pub struct EngineHandle {
    engine: StoredValue<TierEngine, LocalStorage>,
}

impl EngineHandle {
    pub fn new(engine: TierEngine) -> Self {
        Self {
            engine: StoredValue::new_local(engine),
        }
    }

    pub fn engine(&self) -> TierEngine {
        self.engine.get_value()
    }

    pub fn context(&self) -> TierContext {
        self.engine.with_value(|e| e.context().clone())
    }

    pub fn emit(&self, event: Event) {
        tracing::trace!(event = event.kind().name(), "ui event");
        self.engine.with_value(|e| e.context().emit(event));
    }

    pub fn state(&self) -> Rc<AppState> {
        self.engine.with_value(|e| e.context().get_state())
    }
}

pub fn use_engine() -> EngineHandle {
    expect_context::<EngineHandle>()
}

/// Signal mirroring `selector(state)`. It only changes when the selected
/// value does; the subscription ends with the calling component.
pub fn use_state_slice<T, S>(selector: S) -> ReadSignal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    S: Fn(&AppState) -> T + 'static,
{
    let handle = use_engine();
    let ctx = handle.context();
    let (value, set_value) = signal(selector(&ctx.get_state()));
    let subscription = ctx.state.subscribe(
        selector,
        move |next: &T, _prev: &T| set_value.set(next.clone()),
        SubscribeOptions::default(),
    );
    // Dropped (and unsubscribed) when the owner is disposed.
    StoredValue::new_local(subscription);
    value
}
