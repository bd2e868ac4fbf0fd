//! Process-wide shared dispatcher.
//!
//! The first construction fills a global slot; every later construction
//! returns that same instance and drops whatever config it was given.
//! [`SingletonDispatcher::destroy`] clears listeners and empties the slot, so
//! the next construction starts over with its own config.

use crate::bus::{json_dispatcher, BusEvent, EventBus, JsonDispatcher};
use pulse_core::listener::NextFn;
use pulse_core::{DispatcherConfig, ListenerHandle};
use serde_json::Value;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static INSTANCE: Mutex<Option<Arc<JsonDispatcher>>> = Mutex::new(None);

// The slot holds a plain Option, so a poisoned guard is still consistent.
fn slot() -> MutexGuard<'static, Option<Arc<JsonDispatcher>>> {
    INSTANCE.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone)]
pub struct SingletonDispatcher {
    inner: Arc<JsonDispatcher>,
}

impl SingletonDispatcher {
    pub fn new(config: Option<DispatcherConfig>) -> Self {
        let mut slot = slot();
        if let Some(existing) = slot.as_ref() {
            if let Some(discarded) = config {
                tracing::debug!(target: "pulse", ?discarded, "singleton already live, config ignored");
            }
            return Self {
                inner: Arc::clone(existing),
            };
        }
        let inner = Arc::new(json_dispatcher(config.unwrap_or_default()));
        *slot = Some(Arc::clone(&inner));
        Self { inner }
    }

    pub fn instance() -> Self {
        Self::new(None)
    }

    /// The live instance, if any, without creating one.
    pub fn current() -> Option<Self> {
        slot().as_ref().map(|inner| Self {
            inner: Arc::clone(inner),
        })
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_live(&self) -> bool {
        slot()
            .as_ref()
            .is_some_and(|held| Arc::ptr_eq(held, &self.inner))
    }

    /// Removes every listener, then frees the slot if it still points at
    /// this instance. A stale handle never evicts a newer singleton.
    pub fn destroy(&self) {
        self.inner.unsubscribe_all();
        let mut slot = slot();
        if slot
            .as_ref()
            .is_some_and(|held| Arc::ptr_eq(held, &self.inner))
        {
            *slot = None;
            tracing::debug!(target: "pulse", "singleton released");
        }
    }
}

impl Deref for SingletonDispatcher {
    type Target = JsonDispatcher;

    fn deref(&self) -> &JsonDispatcher {
        &self.inner
    }
}

impl fmt::Debug for SingletonDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonDispatcher")
            .field("instance", &Arc::as_ptr(&self.inner))
            .field("config", self.inner.config())
            .finish()
    }
}

impl EventBus for SingletonDispatcher {
    fn publish(&self, event: BusEvent) {
        self.inner.publish(event);
    }

    fn listen(&self, topic: &str, on_next: Box<NextFn<Value>>) -> ListenerHandle<Value> {
        self.inner.listen(topic, on_next)
    }

    fn unlisten(&self, listener: &ListenerHandle<Value>) {
        self.inner.unlisten(listener);
    }
}
