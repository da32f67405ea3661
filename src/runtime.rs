//! Browser runtime
//!
//! Timers via `gloo-timers`, tasks via `wasm_bindgen_futures`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gloo_timers::callback::Timeout;
use tierforge_core::runtime::LocalTask;
use tierforge_core::{Runtime, TimerHandle};

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserRuntime;

impl Runtime for BrowserRuntime {
    fn spawn_local(&self, task: LocalTask) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle {
        // Cancelling takes the callback out; the JS timer still fires but finds nothing.
        let slot: Rc<RefCell<Option<Box<dyn FnOnce()>>>> = Rc::new(RefCell::new(Some(callback)));
        let pending = Rc::clone(&slot);
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        let _ = Timeout::new(millis, move || {
            let callback = pending.borrow_mut().take();
            if let Some(callback) = callback {
                callback();
            }
        })
        .forget();

        TimerHandle::new(move || {
            slot.borrow_mut().take();
        })
    }
}
