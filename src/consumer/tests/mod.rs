//! Consumption loop tests
//!
//! All tests run on a paused tokio clock, so backoff and delay waits finish
//! instantly while `Instant::elapsed` still reports the simulated time.


use super::{ConsumerSettings, ConsumptionLoop, IdlePolicy};
use crate::core::retry::BackoffPolicy;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::time::{Clock, FixedClock};
use crate::document::testing::MemoryDocumentSink;
use crate::document::{DocumentWriter, MessageMetadata};
use crate::queue::testing::{Connect, ScriptedSource};
use crate::sanitize::Sanitizer;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

pub(super) const WAIT: Duration = Duration::from_secs(1);
pub(super) const DELAY: Duration = Duration::from_secs(2);
pub(super) const BACKOFF: Duration = Duration::from_secs(5);

/// Clock that moves one second forward on every read so each stored
/// document gets its own file name
struct TickingClock(FixedClock);

impl Clock for TickingClock {
    fn now_utc(&self) -> DateTime<Utc> {
        let now = self.0.now_utc();
        self.0.advance(chrono::Duration::seconds(1));
        now
    }
}

pub(super) fn settings(idle_policy: IdlePolicy) -> ConsumerSettings {
    ConsumerSettings {
        wait_timeout: WAIT,
        message_delay: DELAY,
        backoff: BackoffPolicy::fixed(BACKOFF),
        idle_policy,
        ..Default::default()
    }
}

pub(super) struct Harness {
    pub shutdown: ShutdownCoordinator,
    pub source: ScriptedSource,
    pub sink: MemoryDocumentSink,
}

impl Harness {
    pub fn new(connects: Vec<Connect>) -> Self {
        let (shutdown, _) = ShutdownCoordinator::new();
        let source = ScriptedSource::new(connects, &shutdown);
        Self {
            shutdown,
            source,
            sink: MemoryDocumentSink::new(),
        }
    }

    /// Build a loop whose state is recorded at every receive
    pub fn consumer(&self, settings: ConsumerSettings) -> ConsumptionLoop {
        let writer = DocumentWriter::new(
            Arc::new(self.sink.clone()),
            Arc::new(TickingClock(FixedClock::at(2024, 3, 9, 14, 5, 7))),
        );
        let consumer = ConsumptionLoop::new(
            Arc::new(self.source.clone()),
            writer,
            Sanitizer::default(),
            MessageMetadata::text("ORDERS.IN"),
            settings,
            &self.shutdown,
        );
        self.source.probe_state(consumer.subscribe_state());
        consumer
    }
}
