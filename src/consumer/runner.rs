//! The consumption loop itself

use super::settings::ConsumerSettings;
use super::state::{ConsumerState, IdlePolicy};
use super::stats::ConsumerReport;
use crate::core::retry::{sleep_unless_shutdown, WaitOutcome};
use crate::core::shutdown::ShutdownCoordinator;
use crate::document::{DocumentWriter, MessageMetadata};
use crate::queue::{
    ConnectError, QueueSession, QueueSource, RawMessage, ReceiveError, ReceiveOutcome,
};
use crate::sanitize::Sanitizer;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// How one connection cycle ended
enum CycleEnd {
    /// Shutdown was requested; the session (if any) is already closed
    Shutdown,
    Failed(CycleFailure),
}

#[derive(Debug, thiserror::Error)]
enum CycleFailure {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Error receiving message: {0}")]
    Receive(#[from] ReceiveError),

    #[error("Listener error: panic in connection cycle: {0}")]
    Panic(String),
}

/// Drains one queue into the document writer until shutdown
pub struct ConsumptionLoop {
    source: Arc<dyn QueueSource>,
    writer: DocumentWriter,
    sanitizer: Sanitizer,
    metadata: MessageMetadata,
    settings: ConsumerSettings,
    shutdown: ShutdownCoordinator,
    shutdown_rx: broadcast::Receiver<()>,
    state_tx: watch::Sender<ConsumerState>,
    report: ConsumerReport,
}

impl ConsumptionLoop {
    pub fn new(
        source: Arc<dyn QueueSource>,
        writer: DocumentWriter,
        sanitizer: Sanitizer,
        metadata: MessageMetadata,
        settings: ConsumerSettings,
        shutdown: &ShutdownCoordinator,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConsumerState::Disconnected);
        Self {
            source,
            writer,
            sanitizer,
            metadata,
            settings,
            shutdown: shutdown.clone(),
            shutdown_rx: shutdown.subscribe(),
            state_tx,
            report: ConsumerReport::default(),
        }
    }

    /// Observe state transitions while the loop runs
    pub fn subscribe_state(&self) -> watch::Receiver<ConsumerState> {
        self.state_tx.subscribe()
    }

    /// Run until shutdown, then report what happened.
    ///
    /// Connection and receive failures are never returned; they are logged
    /// and retried after the backoff delay.
    pub async fn run(mut self) -> ConsumerReport {
        let endpoint = self.source.endpoint();
        log::info!("Listening on {} (queue '{}')", endpoint, self.metadata.queue_name);

        let mut attempt: u64 = 0;
        loop {
            if self.shutdown.is_shutdown_requested() {
                break;
            }

            let opened_before = self.report.sessions_opened;
            self.set_state(ConsumerState::Connecting);
            self.report.connect_attempts += 1;

            let end = match AssertUnwindSafe(self.cycle()).catch_unwind().await {
                Ok(end) => end,
                Err(payload) => {
                    self.report.panics += 1;
                    CycleEnd::Failed(CycleFailure::Panic(panic_message(payload.as_ref())))
                }
            };
            self.set_state(ConsumerState::Disconnected);

            let failure = match end {
                CycleEnd::Shutdown => break,
                CycleEnd::Failed(failure) => failure,
            };
            log::error!("{}", failure);

            if self.report.sessions_opened > opened_before {
                attempt = 0;
            }
            attempt += 1;

            if self.shutdown.is_shutdown_requested() {
                break;
            }
            self.report.backoff_waits += 1;
            let waited = self
                .settings
                .backoff
                .wait("connection", attempt, &self.shutdown, &mut self.shutdown_rx)
                .await;
            if waited == WaitOutcome::Interrupted {
                break;
            }
        }

        self.set_state(ConsumerState::Stopped);
        log::info!("Consumer stopped: {}", self.report.summary());
        self.report
    }

    /// One connect plus as many receives as the session survives
    async fn cycle(&mut self) -> CycleEnd {
        let mut session = match self.source.open().await {
            Ok(session) => session,
            Err(e) => return CycleEnd::Failed(e.into()),
        };
        self.report.sessions_opened += 1;
        log::info!("Connected successfully to {}", self.source.endpoint());
        self.set_state(ConsumerState::Receiving);

        let end = self.drain(session.as_mut()).await;

        session.close().await;
        self.report.sessions_closed += 1;
        end
    }

    async fn drain(&mut self, session: &mut dyn QueueSession) -> CycleEnd {
        let limit = self.settings.receive_limit();
        loop {
            if self.shutdown.is_shutdown_requested() {
                log::info!("Shutdown requested; closing session");
                return CycleEnd::Shutdown;
            }

            // An in-flight receive is never cancelled by shutdown, only by the hang limit
            let receive = session.receive(self.settings.wait_timeout);
            let outcome = match tokio::time::timeout(limit, receive).await {
                Ok(outcome) => outcome,
                Err(_) => ReceiveOutcome::Error(ReceiveError::Timeout { limit }),
            };
            log::trace!("Receive returned {}", outcome.label());

            match outcome {
                ReceiveOutcome::Message(raw) => {
                    log::info!("Received a message.");
                    self.report.messages_received += 1;
                    if let Err(e) = self.store(session, raw).await {
                        self.report.receive_errors += 1;
                        return CycleEnd::Failed(e.into());
                    }
                    let delay = self.settings.message_delay;
                    // An interrupted delay is picked up by the shutdown check above
                    sleep_unless_shutdown(delay, &self.shutdown, &mut self.shutdown_rx).await;
                }
                ReceiveOutcome::Empty => {
                    self.report.idle_timeouts += 1;
                    match self.settings.idle_policy {
                        IdlePolicy::Stop => {
                            log::info!("No more messages available.");
                            self.shutdown.trigger_shutdown();
                            return CycleEnd::Shutdown;
                        }
                        IdlePolicy::Wait => log::info!("No messages available, retrying..."),
                    }
                }
                ReceiveOutcome::TransientEmpty => {
                    self.report.transient_empty += 1;
                    log::info!("No messages available, retrying...");
                }
                ReceiveOutcome::Error(e) => {
                    self.report.receive_errors += 1;
                    return CycleEnd::Failed(e.into());
                }
            }
        }
    }

    /// Persist one message and settle it with the broker.
    ///
    /// A stored message is acknowledged; one that could not be stored is
    /// rejected so the broker delivers it again.
    async fn store(
        &mut self,
        session: &mut dyn QueueSession,
        raw: RawMessage,
    ) -> Result<(), ReceiveError> {
        let cleaned = self.sanitizer.sanitize(&raw.payload);
        log::debug!(
            "Cleaned {} byte payload from '{}' to {} bytes",
            raw.payload.len(),
            raw.source,
            cleaned.len()
        );

        match self.writer.persist(&cleaned, &self.metadata).await {
            Ok(_) => {
                self.report.documents_written += 1;
                session.acknowledge().await
            }
            Err(e) => {
                self.report.persist_failures += 1;
                log::error!("Failed to save message, returning it to the queue: {}", e);
                session.reject().await
            }
        }
    }

    fn set_state(&self, state: ConsumerState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            log::debug!("Consumer state {} -> {}", previous, state);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
