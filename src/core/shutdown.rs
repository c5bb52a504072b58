//! Shutdown Coordination
//!
//! A one-way cancellation token shared between the consumer loop and the
//! control surface (OS signal handlers). The flag only ever moves from
//! `false` to `true`; the broadcast side wakes tasks parked in deliberate
//! sleeps so they can observe it promptly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Coordinates graceful shutdown across the application
///
/// Cloning yields another handle to the same flag.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator
    pub fn new() -> (Self, broadcast::Receiver<()>) {
        // Use a larger channel to avoid dropping bursts of shutdown signals
        let (shutdown_tx, shutdown_rx) = broadcast::channel(8);
        let shutdown_requested = Arc::new(AtomicBool::new(false));

        let coordinator = Self {
            shutdown_tx,
            shutdown_requested,
        };

        (coordinator, shutdown_rx)
    }

    /// Subscribe to shutdown notifications
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Trigger shutdown. Returns `true` only for the call that flipped the flag.
    pub fn trigger_shutdown(&self) -> bool {
        // Release pairs with the Acquire load in is_shutdown_requested()
        let first = !self.shutdown_requested.swap(true, Ordering::AcqRel);
        let _ = self.shutdown_tx.send(());
        first
    }

    /// Check if shutdown has been requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Install OS signal handlers that trigger this coordinator.
    ///
    /// Must be called from within a tokio runtime.
    pub fn install_signal_handlers(&self) {
        setup_signal_handlers(self.shutdown_tx.clone(), self.shutdown_requested.clone());
    }

    /// Guard execution of a future with shutdown coordination, providing access to coordinator
    ///
    /// Signal handlers are installed before the closure runs, so the closure
    /// only has to pass the coordinator on to whatever needs to observe it.
    pub async fn guard_with_coordinator<F, Fut, R, E>(future_fn: F) -> Result<R, E>
    where
        F: FnOnce(Self, broadcast::Receiver<()>) -> Fut,
        Fut: std::future::Future<Output = Result<R, E>>,
    {
        let (coordinator, shutdown_rx) = Self::new();
        coordinator.install_signal_handlers();
        future_fn(coordinator, shutdown_rx).await
    }
}

/// Set up signal handlers for graceful shutdown
fn setup_signal_handlers(shutdown_tx: broadcast::Sender<()>, shutdown_requested: Arc<AtomicBool>) {
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }

        use std::sync::atomic::AtomicUsize;
        use tokio::signal::unix::{signal, SignalKind};
        let signal_count = Arc::new(AtomicUsize::new(0));
        let signals = [
            ("SIGINT", SignalKind::interrupt()),
            ("SIGTERM", SignalKind::terminate()),
            ("SIGHUP", SignalKind::hangup()),
            ("SIGQUIT", SignalKind::quit()),
        ];

        for (name, kind) in signals {
            let tx = shutdown_tx.clone();
            let requested = shutdown_requested.clone();
            let sig_ctr = signal_count.clone();

            tokio::spawn(async move {
                let mut sig = match signal(kind) {
                    Ok(sig) => sig,
                    Err(e) => {
                        log::warn!("Unable to listen for {}: {}", name, e);
                        return;
                    }
                };
                // First delivery requests a graceful stop, a second one forces exit
                while sig.recv().await.is_some() {
                    let prev = sig_ctr.fetch_add(1, Ordering::AcqRel);
                    requested.store(true, Ordering::Release);
                    let _ = tx.send(());
                    if prev >= 1 {
                        log::warn!("{} received again; exiting immediately", name);
                        std::process::exit(130);
                    }
                    log::info!("{} received; shutting down listener", name);
                }
            });
        }
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("Ctrl-C received; shutting down listener");
                shutdown_requested.store(true, Ordering::Release);
                let _ = shutdown_tx.send(());
            }
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Ctrl-C received again; exiting immediately");
                std::process::exit(130);
            }
        });
    }
}
