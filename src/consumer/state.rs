//! Loop states and the idle policy

use serde::Serialize;
use strum_macros::{Display, EnumString};

/// Where the consumption loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConsumerState {
    /// No session; either starting up or waiting out a backoff
    Disconnected,
    Connecting,
    /// A session is open and messages are being drained
    Receiving,
    /// Terminal. Every resource has been released.
    Stopped,
}

impl ConsumerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConsumerState::Stopped)
    }
}

/// What a receive that ran its full wait without a message means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IdlePolicy {
    /// The queue is drained: request shutdown and stop
    #[default]
    Stop,
    /// Keep waiting, exactly like a transient empty
    Wait,
}
