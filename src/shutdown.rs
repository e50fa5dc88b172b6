//! Graceful shutdown with tracked background tasks.
//!
//! The rate-limiter sweep runs as a tracked task; on SIGTERM/SIGINT the
//! coordinator signals it, waits up to the configured timeout, then aborts
//! anything still running.

use std::future::Future;
use std::time::Duration;

use tokio::signal;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Coordinates background task shutdown.
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    tasks: JoinSet<()>,
}

impl ShutdownCoordinator {
    /// Creates a new coordinator.
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            shutdown_tx,
            tasks: JoinSet::new(),
        }
    }

    /// Spawns a tracked background task that stops on the shutdown signal.
    pub fn spawn<F>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        self.tasks.spawn(async move {
            tokio::select! {
                _ = future => {
                    info!(task = name, "background task completed");
                }
                _ = shutdown_rx.recv() => {
                    info!(task = name, "background task stopped by shutdown");
                }
            }
        });
    }

    /// Signals shutdown and waits for tasks, aborting after `timeout`.
    pub async fn shutdown(mut self, timeout: Duration) {
        info!("initiating graceful shutdown");
        let _ = self.shutdown_tx.send(());

        let drained = tokio::time::timeout(timeout, async {
            while let Some(result) = self.tasks.join_next().await {
                if let Err(e) = result {
                    warn!(error = %e, "task failed during shutdown");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("shutdown timeout reached, aborting remaining tasks");
            self.tasks.abort_all();
        }
        info!("shutdown complete");
    }

    /// Number of tracked tasks still running.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for SIGTERM or SIGINT.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => error!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, initiating shutdown"),
        _ = terminate => info!("received SIGTERM, initiating shutdown"),
    }
}

/// Runs a server future until completion or a shutdown signal, then drains
/// background tasks.
pub async fn run_with_graceful_shutdown<F, E>(
    server_future: F,
    coordinator: ShutdownCoordinator,
    timeout: Duration,
) where
    F: Future<Output = Result<(), E>> + Send,
    E: std::fmt::Display,
{
    tokio::select! {
        result = server_future => {
            match result {
                Ok(()) => info!("server stopped normally"),
                Err(e) => error!(error = %e, "server error"),
            }
        }
        _ = wait_for_signal() => {}
    }

    coordinator.shutdown(timeout).await;
}
