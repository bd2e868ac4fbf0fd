use crate::error::PulseError;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trace-only identifier. Registrations are matched by pointer, never by id.
pub type ListenerId = u64;

pub type NextFn<T> = dyn Fn(&T) + Send + Sync;
pub type ErrorFn = dyn Fn(&PulseError) + Send + Sync;

/// Shared handle returned by `subscribe` and accepted by `unsubscribe`.
pub type ListenerHandle<T> = Arc<Listener<T>>;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

pub struct Listener<T> {
    id: ListenerId,
    topic: String,
    on_next: Option<Box<NextFn<T>>>,
    on_error: Option<Box<ErrorFn>>,
}

impl<T> Listener<T> {
    pub fn new<F>(topic: impl Into<String>, on_next: F) -> ListenerHandle<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self::builder(topic).on_next(on_next).build()
    }

    pub fn builder(topic: impl Into<String>) -> ListenerBuilder<T> {
        ListenerBuilder {
            topic: topic.into(),
            on_next: None,
            on_error: None,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn has_next(&self) -> bool {
        self.on_next.is_some()
    }

    pub fn has_error(&self) -> bool {
        self.on_error.is_some()
    }

    /// Delivers `payload`, or reports [`PulseError::NextNotCallable`] to
    /// `on_error` when the listener was built without `on_next`.
    pub(crate) fn deliver(&self, payload: &T) {
        match &self.on_next {
            Some(next) => next(payload),
            None => self.notify_error(&PulseError::NextNotCallable),
        }
    }

    pub(crate) fn notify_error(&self, err: &PulseError) {
        if let Some(on_error) = &self.on_error {
            on_error(err);
        }
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("on_next", &self.has_next())
            .field("on_error", &self.has_error())
            .finish()
    }
}

pub struct ListenerBuilder<T> {
    topic: String,
    on_next: Option<Box<NextFn<T>>>,
    on_error: Option<Box<ErrorFn>>,
}

impl<T> ListenerBuilder<T> {
    pub fn on_next<F>(mut self, on_next: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_next = Some(Box::new(on_next));
        self
    }

    pub fn on_error<F>(mut self, on_error: F) -> Self
    where
        F: Fn(&PulseError) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(on_error));
        self
    }

    pub fn build(self) -> ListenerHandle<T> {
        Arc::new(Listener {
            id: NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed),
            topic: self.topic,
            on_next: self.on_next,
            on_error: self.on_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn identical_records_are_distinct_registrations() {
        let a: ListenerHandle<i32> = Listener::new("e", |_| {});
        let b: ListenerHandle<i32> = Listener::new("e", |_| {});
        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.topic(), b.topic());
    }

    #[test]
    fn missing_next_reports_to_on_error() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let listener: ListenerHandle<i32> = Listener::builder("e")
            .on_error(move |err| sink.lock().unwrap().push(err.to_string()))
            .build();

        assert!(!listener.has_next());
        listener.deliver(&1);

        assert_eq!(errors.lock().unwrap().as_slice(), ["on_next must be callable"]);
    }

    #[test]
    fn missing_both_callbacks_is_silent() {
        let listener: ListenerHandle<i32> = Listener::builder("e").build();
        listener.deliver(&1);
        assert!(!listener.has_error());
    }
}
