//! Prometheus metrics endpoint.

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::metrics;
use crate::server::AppState;

/// GET /metrics - Prometheus metrics endpoint
pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    // Gauge is maintained on every membership change; refresh anyway so a
    // scrape always matches the hub
    metrics::SESSIONS_ACTIVE.set(state.hub.active_session_count() as i64);

    match metrics::encode_metrics() {
        Ok(output) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode Prometheus metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(axum::http::header::CONTENT_TYPE, "text/plain")],
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
