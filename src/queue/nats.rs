//! NATS JetStream transport
//!
//! Endpoint fields map onto JetStream as follows: `manager` names the
//! stream, `channel` names a durable pull consumer (created on first
//! connect), and `queue` is the consumer's filter subject.

use super::config::EndpointConfig;
use super::error::{ConnectError, ReceiveError};
use super::message::{RawMessage, ReceiveOutcome};
use super::traits::{QueueSession, QueueSource};
use async_nats::jetstream::{
    self,
    consumer::{pull, AckPolicy, PullConsumer},
    AckKind,
};
use async_nats::ConnectErrorKind;
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tokio::time::Instant;

/// A pull batch that ends this long before its deadline was cut short by the broker
const EARLY_END_TOLERANCE: Duration = Duration::from_millis(500);

/// Outcome of a pull batch that ended without delivering a message.
/// Running out the full wait means the queue is empty; ending early means
/// the broker cut the request short and it can be retried at once.
fn classify_batch_end(elapsed: Duration, timeout: Duration) -> ReceiveOutcome {
    if elapsed + EARLY_END_TOLERANCE < timeout {
        ReceiveOutcome::TransientEmpty
    } else {
        ReceiveOutcome::Empty
    }
}

/// Connects to a JetStream durable consumer
pub struct NatsQueueSource {
    endpoint: EndpointConfig,
}

impl NatsQueueSource {
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self { endpoint }
    }

    fn connect_error(&self, error: async_nats::ConnectError) -> ConnectError {
        let endpoint = self.endpoint.describe();
        let message = error.to_string();
        match error.kind() {
            ConnectErrorKind::Authentication | ConnectErrorKind::AuthorizationViolation => {
                ConnectError::Authentication { endpoint, message }
            }
            _ => ConnectError::Transport { endpoint, message },
        }
    }

    fn unavailable(&self, message: String) -> ConnectError {
        ConnectError::QueueUnavailable {
            endpoint: self.endpoint.describe(),
            queue: self.endpoint.queue.clone(),
            message,
        }
    }
}

#[async_trait]
impl QueueSource for NatsQueueSource {
    fn endpoint(&self) -> String {
        self.endpoint.describe()
    }

    async fn open(&self) -> Result<Box<dyn QueueSession>, ConnectError> {
        log::debug!(
            "Connecting to {} (stream '{}', consumer '{}', subject '{}')",
            self.endpoint.url(),
            self.endpoint.manager,
            self.endpoint.channel,
            self.endpoint.queue
        );

        let mut options = async_nats::ConnectOptions::new()
            .name(env!("CARGO_PKG_NAME"))
            .connection_timeout(self.endpoint.connect_timeout);
        if let Some(credentials) = &self.endpoint.credentials {
            options = options
                .user_and_password(credentials.username.clone(), credentials.password.clone());
        }

        let url = self.endpoint.url();
        let client = options
            .connect(url.as_str())
            .await
            .map_err(|e| self.connect_error(e))?;

        let context = jetstream::new(client.clone());
        let stream = context
            .get_stream(&self.endpoint.manager)
            .await
            .map_err(|e| self.unavailable(format!("stream '{}': {}", self.endpoint.manager, e)))?;

        let consumer: PullConsumer = stream
            .get_or_create_consumer(
                &self.endpoint.channel,
                pull::Config {
                    durable_name: Some(self.endpoint.channel.clone()),
                    filter_subject: self.endpoint.queue.clone(),
                    ack_policy: AckPolicy::Explicit,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| self.unavailable(format!("consumer '{}': {}", self.endpoint.channel, e)))?;

        Ok(Box::new(NatsSession {
            endpoint: self.endpoint.describe(),
            client: Some(client),
            consumer: Some(consumer),
            pending: None,
        }))
    }
}

/// Live JetStream session holding at most one unsettled message
pub struct NatsSession {
    endpoint: String,
    client: Option<async_nats::Client>,
    consumer: Option<PullConsumer>,
    pending: Option<jetstream::Message>,
}

#[async_trait]
impl QueueSession for NatsSession {
    async fn receive(&mut self, timeout: Duration) -> ReceiveOutcome {
        let consumer = match &self.consumer {
            Some(consumer) => consumer,
            None => return ReceiveOutcome::Error(ReceiveError::SessionClosed),
        };
        if self.pending.take().is_some() {
            log::warn!("Previous message was never settled; the broker will redeliver it");
        }

        let started = Instant::now();
        let mut batch = match consumer
            .batch()
            .max_messages(1)
            .expires(timeout)
            .messages()
            .await
        {
            Ok(batch) => batch,
            Err(e) => {
                return ReceiveOutcome::Error(ReceiveError::Broker {
                    message: e.to_string(),
                })
            }
        };

        match batch.next().await {
            Some(Ok(message)) => {
                let raw = RawMessage::new(message.payload.to_vec(), message.subject.to_string());
                self.pending = Some(message);
                ReceiveOutcome::Message(raw)
            }
            Some(Err(e)) => ReceiveOutcome::Error(ReceiveError::Broker {
                message: e.to_string(),
            }),
            None => classify_batch_end(started.elapsed(), timeout),
        }
    }

    async fn acknowledge(&mut self) -> Result<(), ReceiveError> {
        match self.pending.take() {
            Some(message) => message.ack().await.map_err(|e| ReceiveError::Settle {
                message: e.to_string(),
            }),
            None => Ok(()),
        }
    }

    async fn reject(&mut self) -> Result<(), ReceiveError> {
        match self.pending.take() {
            Some(message) => message
                .ack_with(AckKind::Nak(None))
                .await
                .map_err(|e| ReceiveError::Settle {
                    message: e.to_string(),
                }),
            None => Ok(()),
        }
    }

    async fn close(&mut self) {
        self.pending = None;
        self.consumer = None;
        if let Some(client) = self.client.take() {
            if let Err(e) = client.flush().await {
                log::debug!("Flush while closing session to {} failed: {}", self.endpoint, e);
            }
            log::info!("Disconnected from {}", self.endpoint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Credentials;

    fn unreachable_endpoint() -> EndpointConfig {
        EndpointConfig {
            // Port 1 on loopback is refused immediately
            host: "127.0.0.1".to_string(),
            port: 1,
            channel: "listener".to_string(),
            manager: "ORDERS".to_string(),
            queue: "orders.in".to_string(),
            credentials: Some(Credentials {
                username: "app".to_string(),
                password: "secret".to_string(),
            }),
            connect_timeout: Duration::from_secs(2),
        }
    }

    #[tokio::test]
    async fn test_open_against_closed_port_is_connect_error() {
        let source = NatsQueueSource::new(unreachable_endpoint());

        let err = match source.open().await {
            Ok(_) => panic!("nothing listens on port 1"),
            Err(e) => e,
        };

        assert!(
            matches!(err, ConnectError::Transport { .. }),
            "got {:?}",
            err
        );
        assert!(err.to_string().contains("ORDERS@127.0.0.1(1)"));
    }

    #[tokio::test]
    async fn test_closed_session_refuses_to_receive() {
        let mut session = NatsSession {
            endpoint: "ORDERS@127.0.0.1(1)".to_string(),
            client: None,
            consumer: None,
            pending: None,
        };

        session.close().await;
        session.close().await;

        assert_eq!(
            session.receive(Duration::from_millis(10)).await,
            ReceiveOutcome::Error(ReceiveError::SessionClosed)
        );
        assert!(session.acknowledge().await.is_ok());
        assert!(session.reject().await.is_ok());
    }

    #[test]
    fn test_batch_ending_early_is_transient() {
        let timeout = Duration::from_secs(10);

        assert_eq!(
            classify_batch_end(Duration::from_millis(20), timeout),
            ReceiveOutcome::TransientEmpty
        );
        assert_eq!(
            classify_batch_end(Duration::from_millis(9_499), timeout),
            ReceiveOutcome::TransientEmpty
        );
    }

    #[test]
    fn test_batch_running_out_the_wait_is_empty() {
        let timeout = Duration::from_secs(10);

        assert_eq!(classify_batch_end(timeout, timeout), ReceiveOutcome::Empty);
        assert_eq!(
            classify_batch_end(Duration::from_millis(9_500), timeout),
            ReceiveOutcome::Empty
        );
        assert_eq!(
            classify_batch_end(Duration::from_millis(10_050), timeout),
            ReceiveOutcome::Empty
        );
    }

    #[test]
    fn test_wait_shorter_than_tolerance_is_always_empty() {
        let timeout = Duration::from_millis(300);

        assert_eq!(classify_batch_end(Duration::ZERO, timeout), ReceiveOutcome::Empty);
        assert_eq!(
            classify_batch_end(Duration::from_millis(100), timeout),
            ReceiveOutcome::Empty
        );
    }

    #[test]
    fn test_source_describes_endpoint() {
        let source = NatsQueueSource::new(unreachable_endpoint());
        assert_eq!(source.endpoint(), "ORDERS@127.0.0.1(1)");
    }
}
