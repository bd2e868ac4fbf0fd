//! Trace hook for dispatcher activity.
//!
//! The dispatcher decides *whether* to trace (see [`DebugMode::allows`]); a
//! [`TraceSink`] decides *where* the record goes. The default sink forwards to
//! `tracing`, so hosts pick formatting and output through their subscriber.
//!
//! [`DebugMode::allows`]: crate::config::DebugMode::allows

use crate::listener::ListenerId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceLevel {
    Info,
    Error,
}

impl TraceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceLevel::Info => "info",
            TraceLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Subscribed {
        topic: String,
        listener: ListenerId,
        listeners: usize,
    },
    Unsubscribed {
        topic: String,
        listener: ListenerId,
        listeners: usize,
        removed: bool,
    },
    TopicCleared {
        topic: String,
        removed: usize,
    },
    Cleared {
        topics: usize,
    },
    Delivered {
        topic: String,
        listener: ListenerId,
        payload: String,
    },
    Failed {
        error: String,
    },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::Subscribed {
                topic,
                listener,
                listeners,
            } => write!(f, "listener #{listener} joined '{topic}' ({listeners} total)"),
            TraceEvent::Unsubscribed {
                topic,
                listener,
                listeners,
                removed: true,
            } => write!(f, "listener #{listener} left '{topic}' ({listeners} left)"),
            TraceEvent::Unsubscribed {
                topic,
                listener,
                listeners,
                removed: false,
            } => write!(
                f,
                "listener #{listener} not on '{topic}' ({listeners} unchanged)"
            ),
            TraceEvent::TopicCleared { topic, removed } => {
                write!(f, "cleared '{topic}' ({removed} removed)")
            }
            TraceEvent::Cleared { topics } => write!(f, "cleared {topics} topics"),
            TraceEvent::Delivered {
                topic,
                listener,
                payload,
            } => write!(f, "'{topic}' -> listener #{listener} <{payload}>"),
            TraceEvent::Failed { error } => write!(f, "{error}"),
        }
    }
}

pub trait TraceSink: Send + Sync {
    fn record(&self, level: TraceLevel, action: &str, event: &TraceEvent);
}

impl<F> TraceSink for F
where
    F: Fn(TraceLevel, &str, &TraceEvent) + Send + Sync,
{
    fn record(&self, level: TraceLevel, action: &str, event: &TraceEvent) {
        self(level, action, event)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&self, level: TraceLevel, action: &str, event: &TraceEvent) {
        match level {
            TraceLevel::Info => tracing::info!(target: "pulse", action, "{}", event),
            TraceLevel::Error => tracing::error!(target: "pulse", action, "{}", event),
        }
    }
}
