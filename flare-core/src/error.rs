use thiserror::Error;

/// Failure taxonomy shared by the relay and the orchestrator. None of these
/// is fatal to the process: validation failures are answered and dropped,
/// state failures are logged and ignored, transport and negotiation
/// failures trigger cleanup or a bounded retry.
#[derive(Debug, Clone, Error)]
pub enum SignalError {
    /// A required field was missing or empty on an inbound event.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The event was well-formed but inapplicable to the current state.
    #[error("inapplicable in current state: {0}")]
    State(String),

    /// Socket-level disconnect or timeout.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The peer connection reached the failed state.
    #[error("negotiation failed: {0}")]
    Negotiation(String),
}

impl SignalError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn negotiation(msg: impl Into<String>) -> Self {
        Self::Negotiation(msg.into())
    }
}
