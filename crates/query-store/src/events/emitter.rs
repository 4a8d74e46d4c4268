//! EventEmitter<T>: typed pub/sub with optional cancelable dispatch.
//!
//! Listeners are stored as `Arc<dyn Fn(&T) -> Flow>`. Emission works on a
//! snapshot of the listener list:
//!   - A listener removed *during* emission is still called in that round.
//!   - A listener added *during* emission is NOT called until the next emit.
//!
//! The lock is never held while a listener runs, so listeners may call
//! `on()`/`off()` or other store methods from inside a callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Returned by [`EventEmitter::on`]; pass to [`EventEmitter::off`].
pub type ListenerId = u64;

/// Closure type for event listeners.
pub type ListenerFn<T> = dyn Fn(&T) -> Flow + Send + Sync;

/// What a listener wants the emitting operation to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Continue,
    Cancel,
}

impl Flow {
    pub fn is_cancel(self) -> bool {
        self == Self::Cancel
    }
}

pub struct EventEmitter<T> {
    listeners: Mutex<Vec<(ListenerId, Arc<ListenerFn<T>>)>>,
    next_id: AtomicU64,
}

impl<T> EventEmitter<T> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register an observing listener. It can never cancel.
    pub fn on(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> ListenerId
    where
        T: 'static,
    {
        self.on_cancelable(move |event| {
            callback(event);
            Flow::Continue
        })
    }

    /// Register a listener whose [`Flow::Cancel`] vetoes events emitted
    /// through [`EventEmitter::emit_cancelable`]. For [`EventEmitter::emit`]
    /// the return value is ignored.
    pub fn on_cancelable(&self, callback: impl Fn(&T) -> Flow + Send + Sync + 'static) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove the listener identified by `id`. Unknown ids are ignored.
    pub fn off(&self, id: ListenerId) {
        self.listeners.lock().retain(|(lid, _)| *lid != id);
    }

    /// Emit `event` to every listener in registration order.
    pub fn emit(&self, event: &T) {
        for cb in self.snapshot() {
            cb(event);
        }
    }

    /// Emit `event` in registration order, stopping at the first listener
    /// that returns [`Flow::Cancel`].
    pub fn emit_cancelable(&self, event: &T) -> Flow {
        for cb in self.snapshot() {
            if cb(event).is_cancel() {
                return Flow::Cancel;
            }
        }
        Flow::Continue
    }

    fn snapshot(&self) -> Vec<Arc<ListenerFn<T>>> {
        self.listeners
            .lock()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect()
    }

    pub fn size(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}
