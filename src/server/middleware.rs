use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use super::AppState;

/// API Key authentication middleware
/// Validates X-API-Key header against configured api.key
pub async fn api_key_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    // If no API key is configured, allow all requests (development mode)
    let Some(expected_key) = &state.settings.api.key else {
        return Ok(next.run(req).await);
    };

    let api_key = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok());

    match api_key {
        Some(key) if key == expected_key => Ok(next.run(req).await),
        Some(_) => {
            tracing::warn!("Invalid API key provided");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing API key header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
