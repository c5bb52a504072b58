//! Transport capabilities used by the consumer loop

use super::error::{ConnectError, ReceiveError};
use super::message::ReceiveOutcome;
use async_trait::async_trait;
use std::time::Duration;

/// Something the listener can connect to
#[async_trait]
pub trait QueueSource: Send + Sync {
    /// Human-readable endpoint description for log lines
    fn endpoint(&self) -> String;

    /// Connect and authenticate, returning a live session
    async fn open(&self) -> Result<Box<dyn QueueSession>, ConnectError>;
}

/// One live connection to the queue
///
/// The consumer settles every delivered message (acknowledge or reject)
/// before it asks for the next one.
#[async_trait]
pub trait QueueSession: Send {
    /// Wait up to `timeout` for the next message
    async fn receive(&mut self, timeout: Duration) -> ReceiveOutcome;

    /// Confirm the last delivered message was stored
    async fn acknowledge(&mut self) -> Result<(), ReceiveError> {
        Ok(())
    }

    /// Hand the last delivered message back for redelivery
    async fn reject(&mut self) -> Result<(), ReceiveError> {
        Ok(())
    }

    /// Release every resource held by the session. Idempotent and best effort.
    async fn close(&mut self);
}
