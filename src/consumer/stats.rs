//! Counters reported when the loop stops

use serde::Serialize;

/// What the loop did over its lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsumerReport {
    pub connect_attempts: u64,
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub backoff_waits: u64,
    pub messages_received: u64,
    pub documents_written: u64,
    pub persist_failures: u64,
    pub transient_empty: u64,
    pub idle_timeouts: u64,
    pub receive_errors: u64,
    pub panics: u64,
}

impl ConsumerReport {
    /// One-line summary for the shutdown log
    pub fn summary(&self) -> String {
        format!(
            "{} messages received, {} saved, {} not saved, {} sessions, {} reconnect waits",
            self.messages_received,
            self.documents_written,
            self.persist_failures,
            self.sessions_opened,
            self.backoff_waits
        )
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
