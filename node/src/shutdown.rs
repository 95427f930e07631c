//! Shutdown and halt coordination for the node's tasks.
//!
//! Every task `select!`s on a receiver from [`ShutdownController::subscribe`].
//! Shutdown is triggered by an operator (signal or API) or by the ordering
//! task itself when it hits a fatal fault; the first reason recorded wins.

use std::sync::Mutex;

use tokio::signal;
use tokio::sync::broadcast;

/// Why the node stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HaltReason {
    /// Programmatic shutdown request.
    Requested,
    /// SIGINT or SIGTERM.
    Signal,
    /// Storage or executor fault; the node must not continue.
    Fatal(String),
}

pub struct ShutdownController {
    tx: broadcast::Sender<()>,
    reason: Mutex<Option<HaltReason>>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            reason: Mutex::new(None),
        }
    }

    /// Get a receiver that will be notified on shutdown.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        self.halt(HaltReason::Requested);
    }

    /// Record `reason` (unless one is already set) and notify every task.
    pub fn halt(&self, reason: HaltReason) {
        if let Ok(mut current) = self.reason.lock() {
            current.get_or_insert(reason);
        }
        let _ = self.tx.send(());
    }

    pub fn reason(&self) -> Option<HaltReason> {
        self.reason.lock().ok().and_then(|r| r.clone())
    }

    pub fn is_halted(&self) -> bool {
        self.reason().is_some()
    }

    /// Wait for SIGTERM or SIGINT, then trigger shutdown.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
            _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
        }

        self.halt(HaltReason::Signal);
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
