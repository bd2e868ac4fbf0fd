use thiserror::Error;

pub type PulseResult<T> = Result<T, PulseError>;

#[derive(Debug, Error)]
pub enum PulseError {
    #[error("on_next must be callable")]
    NextNotCallable,
    #[error("listener topic must not be empty")]
    EmptyTopic,
    #[error("listener table lock poisoned")]
    LockPoisoned,
    #[error("listener on '{topic}' panicked: {message}")]
    ListenerPanicked { topic: String, message: String },
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}
