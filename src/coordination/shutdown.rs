//! Graceful Shutdown Handler
//!
//! Holds the process-wide keep-running flag. Nothing is preempted: the sync
//! cycle checks the flag between accounts and the scheduler checks it while
//! waiting for the next cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// What asked the worker to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT / Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
    /// Requested from code (e.g. `run --once` finished)
    Internal,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "interrupt"),
            ShutdownSignal::Terminate => write!(f, "terminate"),
            ShutdownSignal::Internal => write!(f, "internal"),
        }
    }
}

/// Cooperative cancellation flag
#[derive(Debug, Default)]
pub struct GracefulShutdown {
    shutdown_requested: AtomicBool,
}

impl GracefulShutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        !self.is_shutdown_requested()
    }

    /// Request shutdown; later requests are ignored
    pub fn request_shutdown(&self, signal: ShutdownSignal) {
        if self.shutdown_requested.swap(true, Ordering::SeqCst) {
            warn!("Shutdown already requested, ignoring duplicate signal: {}", signal);
            return;
        }
        info!("Shutdown requested: {}", signal);
    }

    /// Sleep for `total`, re-checking the flag every `poll`.
    /// Returns `false` if shutdown was requested before the time was up.
    pub async fn sleep_while_running(&self, total: Duration, poll: Duration) -> bool {
        let poll = poll.max(Duration::from_millis(1));
        let mut remaining = total;

        while !remaining.is_zero() {
            if self.is_shutdown_requested() {
                return false;
            }
            let step = remaining.min(poll);
            tokio::time::sleep(step).await;
            remaining -= step;
        }

        self.is_running()
    }
}

/// Helper to install OS signal handlers
pub fn install_signal_handlers(shutdown: Arc<GracefulShutdown>) {
    let on_ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, finishing current account");
                on_ctrl_c.request_shutdown(ShutdownSignal::Interrupt);
            }
            Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("Received SIGTERM, finishing current account");
                    shutdown.request_shutdown(ShutdownSignal::Terminate);
                }
                Err(e) => error!("Failed to install SIGTERM handler: {}", e),
            }
        });
    }
}
