use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{api_key_auth, AppState};

use super::health::health;
use super::metrics::prometheus_metrics;
use super::notifications::publish_notification;

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api/v1",
            Router::new()
                .route("/notifications", post(publish_notification))
                .route_layer(middleware::from_fn_with_state(state, api_key_auth)),
        )
}
