//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub hub: HubHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct HubHealthResponse {
    pub active_sessions: usize,
    pub unique_users: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.hub.stats();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        hub: HubHealthResponse {
            active_sessions: stats.active_sessions,
            unique_users: stats.unique_users,
        },
    })
}
