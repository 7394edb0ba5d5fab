//! Process-wide shutdown signal.
//!
//! Workers and the stdin listener request termination here; the dispatcher
//! reacts to it and decides the exit path.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Running,
    /// The operator asked to stop.
    Quit,
    /// A worker failed after saving what it had.
    Failed,
}

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<ShutdownReason>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ShutdownReason::Running);
        Self { tx: Arc::new(tx) }
    }

    /// Request termination. The first reason wins; later requests are ignored.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == ShutdownReason::Running && reason != ShutdownReason::Running {
                *current = reason;
                true
            } else {
                false
            }
        })
    }

    pub fn current(&self) -> ShutdownReason {
        *self.tx.borrow()
    }

    /// Resolve once termination has been requested.
    pub async fn requested(&self) -> ShutdownReason {
        let mut rx = self.tx.subscribe();
        let reason = match rx.wait_for(|r| *r != ShutdownReason::Running).await {
            Ok(reason) => *reason,
            // The sender lives in `self`, so the channel cannot close while we wait.
            Err(_) => ShutdownReason::Running,
        };
        reason
    }
}
