use axum::{extract::DefaultBodyLimit, http::HeaderValue, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api::api_routes;
use crate::websocket::ws_handler;

use super::AppState;

/// Upper bound for publish request bodies
const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .merge(api_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.settings.server.cors_origins))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

/// Allow any origin unless specific origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(allowed)
    }
}
