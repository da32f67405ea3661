//! Timers and local tasks
//!
//! The core never touches an event loop directly. The browser build plugs in
//! `gloo-timers` and `wasm-bindgen-futures`; [`ManualRuntime`] drives the
//! same code deterministically from tests.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::time::Duration;

pub type LocalTask = Pin<Box<dyn Future<Output = ()>>>;

pub trait Runtime {
    /// Run a future on the current thread's event loop.
    fn spawn_local(&self, task: LocalTask);

    /// Call `callback` once after `delay`. Dropping the handle cancels it.
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle;
}

/// Pending timer; dropping it cancels the callback.
#[must_use = "dropping a TimerHandle cancels the timer"]
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

struct NoopWake;

impl Wake for NoopWake {
    fn wake(self: Arc<Self>) {}
}

struct Timer {
    id: u64,
    due: Duration,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct ManualInner {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    timers: RefCell<Vec<Timer>>,
    tasks: RefCell<Vec<LocalTask>>,
}

/// Single-threaded runtime with a virtual clock.
///
/// Tasks are polled by [`run_until_stalled`](Self::run_until_stalled);
/// timers fire only when [`advance`](Self::advance) moves the clock past
/// their deadline.
#[derive(Clone, Default)]
pub struct ManualRuntime {
    inner: Rc<ManualInner>,
}

impl ManualRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.inner.now.get()
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    /// Poll spawned tasks until none of them makes progress.
    pub fn run_until_stalled(&self) {
        let waker = Waker::from(Arc::new(NoopWake));
        let mut cx = Context::from_waker(&waker);

        loop {
            let tasks = std::mem::take(&mut *self.inner.tasks.borrow_mut());
            if tasks.is_empty() {
                return;
            }

            let mut completed = 0;
            let mut pending = Vec::new();
            for mut task in tasks {
                match task.as_mut().poll(&mut cx) {
                    Poll::Ready(()) => completed += 1,
                    Poll::Pending => pending.push(task),
                }
            }

            let mut queue = self.inner.tasks.borrow_mut();
            let spawned = !queue.is_empty();
            pending.append(&mut queue);
            *queue = pending;

            if completed == 0 && !spawned {
                return;
            }
        }
    }

    /// Move the clock forward, firing due timers in deadline order and
    /// running tasks after each one.
    pub fn advance(&self, by: Duration) {
        let target = self.inner.now.get() + by;
        self.run_until_stalled();

        loop {
            let next = {
                let mut timers = self.inner.timers.borrow_mut();
                let due = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(i, _)| i);
                due.map(|i| timers.remove(i))
            };
            let Some(timer) = next else {
                break;
            };
            self.inner.now.set(timer.due.max(self.inner.now.get()));
            (timer.callback)();
            self.run_until_stalled();
        }

        self.inner.now.set(target);
    }
}

impl Runtime for ManualRuntime {
    fn spawn_local(&self, task: LocalTask) {
        self.inner.tasks.borrow_mut().push(task);
    }

    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.timers.borrow_mut().push(Timer {
            id,
            due: self.inner.now.get() + delay,
            callback,
        });

        let weak: Weak<ManualInner> = Rc::downgrade(&self.inner);
        TimerHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.timers.borrow_mut().retain(|t| t.id != id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_fires_after_delay() {
        let runtime = ManualRuntime::new();
        let fired = Rc::new(Cell::new(false));
        let fired_clone = Rc::clone(&fired);
        let handle = runtime.schedule(Duration::from_secs(2), Box::new(move || fired_clone.set(true)));

        runtime.advance(Duration::from_millis(1999));
        assert!(!fired.get());
        runtime.advance(Duration::from_millis(1));
        assert!(fired.get());
        drop(handle);
        assert_eq!(runtime.pending_timers(), 0);
    }

    #[test]
    fn test_dropping_handle_cancels() {
        let runtime = ManualRuntime::new();
        let fired = Rc::new(Cell::new(false));
        let fired_clone = Rc::clone(&fired);
        let handle = runtime.schedule(Duration::from_secs(1), Box::new(move || fired_clone.set(true)));
        drop(handle);
        runtime.advance(Duration::from_secs(5));
        assert!(!fired.get());
    }

    #[test]
    fn test_tasks_run_and_may_spawn() {
        let runtime = ManualRuntime::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let log_clone = Rc::clone(&log);
        let inner_runtime = runtime.clone();
        runtime.spawn_local(Box::pin(async move {
            log_clone.borrow_mut().push("outer");
            let log = Rc::clone(&log_clone);
            inner_runtime.spawn_local(Box::pin(async move {
                log.borrow_mut().push("inner");
            }));
        }));

        runtime.run_until_stalled();
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
        assert_eq!(runtime.pending_tasks(), 0);
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let runtime = ManualRuntime::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut handles = Vec::new();
        for (name, ms) in [("late", 300), ("early", 100), ("mid", 200)] {
            let log = Rc::clone(&log);
            handles.push(runtime.schedule(
                Duration::from_millis(ms),
                Box::new(move || log.borrow_mut().push(name)),
            ));
        }
        runtime.advance(Duration::from_secs(1));
        assert_eq!(*log.borrow(), vec!["early", "mid", "late"]);
        assert_eq!(runtime.now(), Duration::from_secs(1));
    }
}
