//! Node lifecycle: signal-driven shutdown with bounded subsystem draining.
//!
//! Stopping a mediator mid-flight can lose pooled transactions or leave the
//! contract GC between its snapshot and delete passes. Every background loop
//! therefore holds a [`DrainGuard`] for its lifetime: shutdown broadcasts the
//! stop signal, then [`ShutdownController::join`] waits until each guard has
//! dropped, bounding how long the process lingers while the pool drains its
//! head-event queue and the processor finishes its sweep.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::signal;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, info, warn};

/// Coordinates shutdown across the node's background loops.
pub struct ShutdownController {
    signal: broadcast::Sender<()>,
    done_tx: mpsc::UnboundedSender<&'static str>,
    done_rx: Mutex<mpsc::UnboundedReceiver<&'static str>>,
    tracked: AtomicUsize,
}

/// Held by a background loop for its lifetime; dropping it reports the
/// subsystem as drained.
pub struct DrainGuard {
    subsystem: &'static str,
    done: mpsc::UnboundedSender<&'static str>,
}

impl DrainGuard {
    pub fn subsystem(&self) -> &'static str {
        self.subsystem
    }
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        let _ = self.done.send(self.subsystem);
    }
}

impl ShutdownController {
    pub fn new() -> Self {
        let (signal, _) = broadcast::channel(1);
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            signal,
            done_tx,
            done_rx: Mutex::new(done_rx),
            tracked: AtomicUsize::new(0),
        }
    }

    /// Receiver for the stop signal. Loops select on it next to their main
    /// work and exit within one tick.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.signal.subscribe()
    }

    /// Track a named subsystem until its guard drops.
    pub fn track(&self, subsystem: &'static str) -> DrainGuard {
        self.tracked.fetch_add(1, Ordering::SeqCst);
        DrainGuard {
            subsystem,
            done: self.done_tx.clone(),
        }
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.signal.send(());
    }

    /// Wait until every tracked subsystem has drained, up to `timeout`.
    ///
    /// Returns `false` when one or more loops failed to stop in time; the
    /// caller decides whether to abandon them.
    pub async fn join(&self, timeout: Duration) -> bool {
        let mut remaining = self.tracked.swap(0, Ordering::SeqCst);
        let deadline = tokio::time::Instant::now() + timeout;
        let mut done_rx = self.done_rx.lock().await;
        while remaining > 0 {
            match tokio::time::timeout_at(deadline, done_rx.recv()).await {
                Ok(Some(subsystem)) => {
                    debug!(subsystem, "subsystem drained");
                    remaining -= 1;
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(remaining, "shutdown timed out waiting for subsystems");
                    return false;
                }
            }
        }
        true
    }

    /// Block until SIGINT or SIGTERM, then trigger shutdown.
    pub async fn wait_for_signal(&self) {
        let interrupted = async {
            let _ = signal::ctrl_c().await;
            "SIGINT"
        };

        #[cfg(unix)]
        let terminated = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut term) => {
                    term.recv().await;
                    "SIGTERM"
                }
                Err(_) => std::future::pending::<&'static str>().await,
            }
        };

        #[cfg(not(unix))]
        let terminated = std::future::pending::<&'static str>();

        let cause = tokio::select! {
            cause = interrupted => cause,
            cause = terminated => cause,
        };
        info!(cause, "stopping node");
        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn shutdown_notifies_every_subscriber() {
        let controller = ShutdownController::new();
        let mut rx1 = controller.subscribe();
        let mut rx2 = controller.subscribe();
        controller.shutdown();
        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn join_waits_for_tracked_subsystems() {
        let controller = Arc::new(ShutdownController::new());

        let guard = controller.track("txpool");
        let mut rx = controller.subscribe();
        tokio::spawn(async move {
            let _guard = guard;
            let _ = rx.recv().await;
        });

        controller.shutdown();
        assert!(controller.join(Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn join_reports_stuck_subsystems() {
        let controller = ShutdownController::new();
        let _stuck = controller.track("contract-gc");
        controller.shutdown();
        assert!(!controller.join(Duration::from_millis(50)).await);
    }

    #[tokio::test]
    async fn join_without_tracked_subsystems_is_immediate() {
        let controller = ShutdownController::new();
        controller.shutdown();
        assert!(controller.join(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn guard_names_its_subsystem() {
        let controller = ShutdownController::new();
        let guard = controller.track("txpool");
        assert_eq!(guard.subsystem(), "txpool");
    }
}
