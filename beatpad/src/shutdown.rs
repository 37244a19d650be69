//! Graceful shutdown for the mining daemon.
//!
//! An OS signal raises the process-wide mining [`Interrupt`] so worker
//! threads and the beat wait return at their next poll. Nothing is killed;
//! the listener only waits out a short grace period.

use mining::Interrupt;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

pub struct ShutdownController {
    interrupt: Interrupt,
    grace: Duration,
}

impl ShutdownController {
    pub fn new(interrupt: Interrupt, grace: Duration) -> Self {
        Self { interrupt, grace }
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        self.interrupt.trigger();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.interrupt.is_triggered()
    }

    /// Trigger shutdown, then give in-flight workers the grace period to observe it.
    pub async fn shutdown_gracefully(&self) {
        self.shutdown();
        tokio::time::sleep(self.grace).await;
    }

    /// Wait for SIGTERM or SIGINT, then shut down gracefully.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    warn!("failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { info!("received SIGINT, shutting down"); }
            _ = terminate => { info!("received SIGTERM, shutting down"); }
        }

        self.shutdown_gracefully().await;
    }
}
