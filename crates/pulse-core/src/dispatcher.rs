//! Synchronous topic dispatcher.
//!
//! Listeners are kept per topic in subscription order. `emit` copies the
//! topic's sequence before walking it and releases the table lock first, so a
//! callback may subscribe, unsubscribe or emit on the same dispatcher. A
//! listener added mid-dispatch misses the in-flight payload; one removed
//! mid-dispatch still receives it if it was not reached yet.
//!
//! No public operation returns an error or unwinds into the caller. Failures
//! go to the trace sink and, where a listener is involved, to its `on_error`.

use crate::config::{DebugMode, DispatcherConfig};
use crate::error::{PulseError, PulseResult};
use crate::listener::ListenerHandle;
use crate::trace::{TraceEvent, TraceLevel, TraceSink, TracingSink};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

type ListenerTable<T> = HashMap<String, Vec<ListenerHandle<T>>>;
type PayloadFn<T> = dyn Fn(&T) -> String + Send + Sync;

pub struct Dispatcher<T> {
    listeners: Mutex<ListenerTable<T>>,
    config: DispatcherConfig,
    sink: Box<dyn TraceSink>,
    describe: Option<Box<PayloadFn<T>>>,
}

impl<T> Dispatcher<T> {
    pub fn new(config: DispatcherConfig) -> Self {
        Self::with_sink(config, TracingSink)
    }

    pub fn with_sink(config: DispatcherConfig, sink: impl TraceSink + 'static) -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            config,
            sink: Box::new(sink),
            describe: None,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn debug_mode(&self) -> DebugMode {
        self.config.debug
    }

    /// Appends `listener` to its topic and hands the same reference back.
    pub fn subscribe(&self, listener: ListenerHandle<T>) -> ListenerHandle<T> {
        match self.insert(&listener) {
            Ok(listeners) => self.debug(
                TraceLevel::Info,
                "subscribe",
                &TraceEvent::Subscribed {
                    topic: listener.topic().to_string(),
                    listener: listener.id(),
                    listeners,
                },
            ),
            Err(err) => {
                self.fail("subscribe error", &err);
                shielded(|| listener.notify_error(&err));
            }
        }
        listener
    }

    /// Removes the first registration of this exact handle. Unknown handles
    /// and unknown topics are ignored.
    pub fn unsubscribe(&self, listener: &ListenerHandle<T>) {
        match self.remove(listener) {
            Ok((removed, listeners)) => self.debug(
                TraceLevel::Info,
                "unsubscribe",
                &TraceEvent::Unsubscribed {
                    topic: listener.topic().to_string(),
                    listener: listener.id(),
                    listeners,
                    removed,
                },
            ),
            Err(err) => {
                self.fail("unsubscribe error", &err);
                shielded(|| listener.notify_error(&err));
            }
        }
    }

    pub fn unsubscribe_all_key(&self, topic: &str) {
        let removed = self
            .lock_table()
            .map(|mut table| table.remove(topic).map_or(0, |seq| seq.len()));
        match removed {
            Ok(removed) => self.debug(
                TraceLevel::Info,
                "unsubscribeAllKey",
                &TraceEvent::TopicCleared {
                    topic: topic.to_string(),
                    removed,
                },
            ),
            Err(err) => self.fail("unsubscribeAllKey error", &err),
        }
    }

    pub fn unsubscribe_all(&self) {
        let cleared = self.lock_table().map(|mut table| {
            let topics = table.len();
            table.clear();
            topics
        });
        match cleared {
            Ok(topics) => self.debug(
                TraceLevel::Info,
                "unsubscribeAll",
                &TraceEvent::Cleared { topics },
            ),
            Err(err) => self.fail("unsubscribeAll error", &err),
        }
    }

    /// Delivers `payload` to every listener on `topic`, in subscription
    /// order, before returning. Nothing is buffered: with no listeners the
    /// payload is dropped.
    ///
    /// A panicking `on_next` stops the rest of this dispatch. The panic is
    /// caught and traced at error level; it never reaches the caller, and
    /// neither does a panic from the trace sink.
    pub fn emit(&self, topic: &str, payload: T) {
        let outcome = self.snapshot(topic).and_then(|snapshot| {
            panic::catch_unwind(AssertUnwindSafe(|| {
                self.dispatch(topic, &payload, &snapshot)
            }))
            .map_err(|cause| PulseError::ListenerPanicked {
                topic: topic.to_string(),
                message: panic_message(cause.as_ref()),
            })
        });
        if let Err(err) = outcome {
            self.fail("emit error", &err);
        }
    }

    pub fn listener_count(&self, topic: &str) -> usize {
        self.lock_table()
            .map(|table| table.get(topic).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Topics that currently have at least one listener, in no fixed order.
    pub fn topics(&self) -> Vec<String> {
        self.lock_table()
            .map(|table| {
                table
                    .iter()
                    .filter(|(_, seq)| !seq.is_empty())
                    .map(|(topic, _)| topic.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_table()
            .map(|table| table.values().all(Vec::is_empty))
            .unwrap_or(true)
    }

    pub(crate) fn debug(&self, level: TraceLevel, action: &str, event: &TraceEvent) {
        if self.config.debug.allows(level) {
            shielded(|| self.sink.record(level, action, event));
        }
    }

    fn fail(&self, action: &str, err: &PulseError) {
        self.debug(
            TraceLevel::Error,
            action,
            &TraceEvent::Failed {
                error: err.to_string(),
            },
        );
    }

    fn dispatch(&self, topic: &str, payload: &T, snapshot: &[ListenerHandle<T>]) {
        for listener in snapshot {
            if self.config.debug.allows(TraceLevel::Info) {
                self.debug(
                    TraceLevel::Info,
                    "emit",
                    &TraceEvent::Delivered {
                        topic: topic.to_string(),
                        listener: listener.id(),
                        payload: self.describe_payload(payload),
                    },
                );
            }
            listener.deliver(payload);
        }
    }

    fn describe_payload(&self, payload: &T) -> String {
        match &self.describe {
            Some(describe) => describe(payload),
            None => std::any::type_name::<T>().to_string(),
        }
    }

    fn insert(&self, listener: &ListenerHandle<T>) -> PulseResult<usize> {
        if listener.topic().is_empty() {
            return Err(PulseError::EmptyTopic);
        }
        let mut table = self.lock_table()?;
        let seq = table.entry(listener.topic().to_string()).or_default();
        seq.push(Arc::clone(listener));
        Ok(seq.len())
    }

    /// Whether the handle was registered, and how many listeners the topic
    /// has afterwards.
    fn remove(&self, listener: &ListenerHandle<T>) -> PulseResult<(bool, usize)> {
        let mut table = self.lock_table()?;
        let Some(seq) = table.get_mut(listener.topic()) else {
            return Ok((false, 0));
        };
        let Some(pos) = seq.iter().position(|l| Arc::ptr_eq(l, listener)) else {
            return Ok((false, seq.len()));
        };
        seq.remove(pos);
        let remaining = seq.len();
        if remaining == 0 {
            table.remove(listener.topic());
        }
        Ok((true, remaining))
    }

    fn snapshot(&self, topic: &str) -> PulseResult<Vec<ListenerHandle<T>>> {
        let table = self.lock_table()?;
        Ok(table.get(topic).cloned().unwrap_or_default())
    }

    fn lock_table(&self) -> PulseResult<MutexGuard<'_, ListenerTable<T>>> {
        self.listeners.lock().map_err(|_| PulseError::LockPoisoned)
    }
}

impl<T: fmt::Debug + 'static> Dispatcher<T> {
    /// Shows payload values, rather than their type name, in `emit` traces.
    pub fn with_payload_trace(mut self) -> Self {
        self.describe = Some(Box::new(|payload: &T| format!("{payload:?}")));
        self
    }
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

// Sink and `on_error` are user code; whatever they throw stays here.
fn shielded(f: impl FnOnce()) {
    let _ = panic::catch_unwind(AssertUnwindSafe(f));
}

fn panic_message(cause: &(dyn Any + Send)) -> String {
    if let Some(msg) = cause.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = cause.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
