//! Graceful shutdown for the hub.
//!
//! On a stop signal every connected client gets a shutdown notice with a
//! reconnect hint, then the hub closes every session so each write pump can
//! send its close frame and exit.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;

use crate::hub::{DeliveryReport, Hub};
use crate::websocket::ServerMessage;

/// Configuration for graceful shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Time given to write pumps to flush the notice before sessions are closed
    pub notice_grace: Duration,
    /// Suggested reconnect delay to send to clients
    pub reconnect_after_seconds: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            notice_grace: Duration::from_millis(500),
            reconnect_after_seconds: 5,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ShutdownResult {
    pub notice: DeliveryReport,
    pub sessions_closed: usize,
    pub duration: Duration,
}

/// Handles graceful shutdown of the hub
pub struct GracefulShutdown {
    hub: Arc<Hub>,
    config: ShutdownConfig,
}

impl GracefulShutdown {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self::with_config(hub, ShutdownConfig::default())
    }

    pub fn with_config(hub: Arc<Hub>, config: ShutdownConfig) -> Self {
        Self { hub, config }
    }

    /// Notify clients, wait out the grace period, then close every session
    #[tracing::instrument(
        name = "graceful_shutdown",
        skip(self),
        fields(active_sessions = self.hub.active_session_count())
    )]
    pub async fn execute(&self) -> ShutdownResult {
        let start = std::time::Instant::now();

        tracing::info!("Notifying clients of shutdown");
        let notice = self.hub.broadcast(&ServerMessage::Shutdown {
            reconnect_after_seconds: self.config.reconnect_after_seconds,
        });

        if notice.delivered > 0 {
            tokio::time::sleep(self.config.notice_grace).await;
        }

        let sessions_closed = self.hub.close_all();

        let result = ShutdownResult {
            notice,
            sessions_closed,
            duration: start.elapsed(),
        };

        tracing::info!(
            notified = result.notice.delivered,
            sessions_closed = result.sessions_closed,
            duration_ms = result.duration.as_millis() as u64,
            "Graceful shutdown completed"
        );

        result
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
