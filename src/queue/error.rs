//! Queue Error Types

use std::time::Duration;

/// Failure to establish a session
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectError {
    #[error("Failed to connect to {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    #[error("Authentication rejected by {endpoint}: {message}")]
    Authentication { endpoint: String, message: String },

    #[error("Queue '{queue}' is not available on {endpoint}: {message}")]
    QueueUnavailable {
        endpoint: String,
        queue: String,
        message: String,
    },
}

/// Failure while a session is receiving or settling a message
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ReceiveError {
    #[error("Broker error while receiving: {message}")]
    Broker { message: String },

    #[error("Receive did not return within {limit:?}")]
    Timeout { limit: Duration },

    #[error("Session is closed")]
    SessionClosed,

    #[error("Failed to settle message: {message}")]
    Settle { message: String },
}
