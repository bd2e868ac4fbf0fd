//! In-process publish/subscribe keyed by string topics.
//!
//! ```
//! use pulse_core::{Dispatcher, Listener};
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//!
//! let dispatcher = Dispatcher::default();
//! let listener = dispatcher.subscribe(Listener::new("ticks", move |n: &u32| {
//!     sink.lock().unwrap().push(*n);
//! }));
//! dispatcher.emit("ticks", 1);
//! dispatcher.unsubscribe(&listener);
//! dispatcher.emit("ticks", 2);
//!
//! assert_eq!(*seen.lock().unwrap(), vec![1]);
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod logging;
pub mod trace;

pub use config::{DebugMode, DispatcherConfig};
pub use dispatcher::Dispatcher;
pub use error::{PulseError, PulseResult};
pub use listener::{ErrorFn, Listener, ListenerBuilder, ListenerHandle, ListenerId, NextFn};
pub use trace::{TraceEvent, TraceLevel, TraceSink, TracingSink};
