//! Common test utilities and helpers
//!
//! A replaying queue source that hands out fixed payloads, and helpers for
//! building a listener that writes real files into a temporary directory.

#![allow(dead_code)]

use async_trait::async_trait;
use mqlistener::consumer::{ConsumerSettings, ConsumptionLoop, IdlePolicy};
use mqlistener::core::retry::BackoffPolicy;
use mqlistener::core::shutdown::ShutdownCoordinator;
use mqlistener::core::time::FixedClock;
use mqlistener::document::{DocumentWriter, FsDocumentSink, MessageMetadata};
use mqlistener::queue::{
    ConnectError, QueueSession, QueueSource, RawMessage, ReceiveError, ReceiveOutcome,
};
use mqlistener::sanitize::Sanitizer;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Settlement counters shared between a source and its sessions
#[derive(Default)]
pub struct Settlements {
    pub acknowledged: AtomicUsize,
    pub rejected: AtomicUsize,
    pub closed: AtomicUsize,
}

/// Refuses the first `refusals` connections, then serves `payloads` once
/// and reports `Empty` afterwards
pub struct ReplaySource {
    refusals: AtomicUsize,
    payloads: Mutex<VecDeque<Vec<u8>>>,
    pub settlements: Arc<Settlements>,
}

impl ReplaySource {
    pub fn new(refusals: usize, payloads: Vec<Vec<u8>>) -> Self {
        Self {
            refusals: AtomicUsize::new(refusals),
            payloads: Mutex::new(payloads.into()),
            settlements: Arc::new(Settlements::default()),
        }
    }
}

#[async_trait]
impl QueueSource for ReplaySource {
    fn endpoint(&self) -> String {
        "REPLAY@localhost(0)".to_string()
    }

    async fn open(&self) -> Result<Box<dyn QueueSession>, ConnectError> {
        let remaining = self.refusals.load(Ordering::SeqCst);
        if remaining > 0 {
            self.refusals.store(remaining - 1, Ordering::SeqCst);
            return Err(ConnectError::Transport {
                endpoint: self.endpoint(),
                message: "connection refused".to_string(),
            });
        }
        let payloads = std::mem::take(&mut *self.payloads.lock().unwrap());
        Ok(Box::new(ReplaySession {
            payloads,
            settlements: self.settlements.clone(),
        }))
    }
}

struct ReplaySession {
    payloads: VecDeque<Vec<u8>>,
    settlements: Arc<Settlements>,
}

#[async_trait]
impl QueueSession for ReplaySession {
    async fn receive(&mut self, timeout: Duration) -> ReceiveOutcome {
        match self.payloads.pop_front() {
            Some(payload) => ReceiveOutcome::Message(RawMessage::new(payload, "orders.in")),
            None => {
                tokio::time::sleep(timeout).await;
                ReceiveOutcome::Empty
            }
        }
    }

    async fn acknowledge(&mut self) -> Result<(), ReceiveError> {
        self.settlements.acknowledged.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reject(&mut self) -> Result<(), ReceiveError> {
        self.settlements.rejected.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) {
        self.settlements.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Short intervals so real-time tests finish quickly
pub fn fast_settings(idle_policy: IdlePolicy) -> ConsumerSettings {
    ConsumerSettings {
        wait_timeout: Duration::from_millis(50),
        message_delay: Duration::from_millis(5),
        backoff: BackoffPolicy::fixed(Duration::from_millis(10)),
        idle_policy,
        ..Default::default()
    }
}

/// A listener writing to `output_dir` with a clock frozen at `clock`
pub fn listener(
    source: Arc<ReplaySource>,
    output_dir: &Path,
    clock: FixedClock,
    settings: ConsumerSettings,
    shutdown: &ShutdownCoordinator,
) -> (ConsumptionLoop, DocumentWriter) {
    let writer = DocumentWriter::new(
        Arc::new(FsDocumentSink::new(output_dir)),
        Arc::new(clock),
    );
    let consumer = ConsumptionLoop::new(
        source,
        writer.clone(),
        Sanitizer::default(),
        MessageMetadata::text("ORDERS.IN"),
        settings,
        shutdown,
    );
    (consumer, writer)
}

/// File names in `dir`, sorted
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
