use anyhow::Result;
use tokio::net::TcpListener;

use itsm_notification_hub::config::Settings;
use itsm_notification_hub::server::{create_app, AppState};
use itsm_notification_hub::shutdown::{wait_for_signal, GracefulShutdown};
use itsm_notification_hub::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing; the guard flushes exported spans on exit
    let _telemetry = telemetry::init_telemetry(&settings.otel)?;
    tracing::info!("Configuration loaded");

    // Create application state
    let state = AppState::new(settings.clone());
    let shutdown = GracefulShutdown::new(state.hub.clone());
    tracing::info!(
        session_buffer_size = settings.hub.session_buffer_size,
        "Application state initialized"
    );

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_signal().await;
            shutdown.execute().await;
        })
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
