//! Timing knobs for the consumption loop

use super::state::IdlePolicy;
use crate::core::retry::BackoffPolicy;
use std::time::Duration;

/// Slack given to a transport on top of the wait timeout before a receive
/// is abandoned as hung
pub const DEFAULT_RECEIVE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerSettings {
    /// How long one receive waits for a message
    pub wait_timeout: Duration,
    /// Pause after each stored message before the next receive
    pub message_delay: Duration,
    /// Wait between failed connection cycles
    pub backoff: BackoffPolicy,
    pub idle_policy: IdlePolicy,
    pub receive_grace: Duration,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(10),
            message_delay: Duration::from_secs(10),
            backoff: BackoffPolicy::default(),
            idle_policy: IdlePolicy::default(),
            receive_grace: DEFAULT_RECEIVE_GRACE,
        }
    }
}

impl ConsumerSettings {
    /// Upper bound for a single receive call
    pub fn receive_limit(&self) -> Duration {
        self.wait_timeout + self.receive_grace
    }
}
