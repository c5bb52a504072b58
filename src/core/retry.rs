//! Backoff and shutdown-aware waiting
//!
//! The consumer never gives up on a failing endpoint; it waits a fixed
//! interval and tries again for as long as the process runs. Every
//! deliberate wait ends early when shutdown is requested.

use crate::core::shutdown::ShutdownCoordinator;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{sleep_until, Instant};

/// Fixed-interval backoff used between failed connection cycles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(10),
        }
    }
}

impl BackoffPolicy {
    /// Backoff that always waits `delay`
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait out the backoff after a failed attempt of `operation_name`
    pub async fn wait(
        &self,
        operation_name: &str,
        attempt: u64,
        shutdown: &ShutdownCoordinator,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> WaitOutcome {
        log::info!(
            "Retrying {} in {:?} (attempt {})...",
            operation_name,
            self.delay,
            attempt
        );
        sleep_unless_shutdown(self.delay, shutdown, shutdown_rx).await
    }
}

/// How a shutdown-aware wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full interval elapsed
    Elapsed,
    /// Shutdown was requested before or during the wait
    Interrupted,
}

/// Sleep for `duration` unless shutdown is (or becomes) requested.
pub async fn sleep_unless_shutdown(
    duration: Duration,
    shutdown: &ShutdownCoordinator,
    shutdown_rx: &mut broadcast::Receiver<()>,
) -> WaitOutcome {
    if shutdown.is_shutdown_requested() {
        return WaitOutcome::Interrupted;
    }

    let deadline = Instant::now() + duration;
    let mut notifications_open = true;
    loop {
        if notifications_open {
            tokio::select! {
                _ = sleep_until(deadline) => return WaitOutcome::Elapsed,
                received = shutdown_rx.recv() => {
                    if let Err(broadcast::error::RecvError::Closed) = received {
                        notifications_open = false;
                    }
                }
            }
        } else {
            sleep_until(deadline).await;
            return WaitOutcome::Elapsed;
        }

        // Stale or lagged notifications are ignored unless the flag is set
        if shutdown.is_shutdown_requested() {
            return WaitOutcome::Interrupted;
        }
    }
}
