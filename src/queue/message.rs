//! Received payloads and receive outcomes

use super::error::ReceiveError;

/// Payload exactly as the broker delivered it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub payload: Vec<u8>,
    /// Subject or queue the payload arrived on
    pub source: String,
}

impl RawMessage {
    pub fn new(payload: impl Into<Vec<u8>>, source: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            source: source.into(),
        }
    }
}

/// Result of one bounded wait for a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    Message(RawMessage),
    /// The wait ran its full timeout and nothing arrived
    Empty,
    /// The broker reported that no message is available right now
    TransientEmpty,
    Error(ReceiveError),
}

impl ReceiveOutcome {
    /// Short label used in log lines
    pub fn label(&self) -> &'static str {
        match self {
            ReceiveOutcome::Message(_) => "message",
            ReceiveOutcome::Empty => "empty",
            ReceiveOutcome::TransientEmpty => "transient-empty",
            ReceiveOutcome::Error(_) => "error",
        }
    }
}
