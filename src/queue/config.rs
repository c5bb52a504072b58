//! Endpoint addressing

use std::fmt;
use std::time::Duration;

/// Username/password pair for broker authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where and how to reach the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
    /// Network path to the queue; the durable consumer name for JetStream
    pub channel: String,
    /// Owning queue manager; the stream name for JetStream
    pub manager: String,
    /// Queue to drain; the filter subject for JetStream
    pub queue: String,
    pub credentials: Option<Credentials>,
    pub connect_timeout: Duration,
}

impl EndpointConfig {
    /// Server URL for the NATS client
    pub fn url(&self) -> String {
        format!("nats://{}:{}", self.host, self.port)
    }

    /// `manager@host(port)`, the form used in log lines
    pub fn describe(&self) -> String {
        format!("{}@{}({})", self.manager, self.host, self.port)
    }
}
