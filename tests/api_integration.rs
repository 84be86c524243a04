//! HTTP API integration tests
//!
//! Requests are sent through the full router with `tower::ServiceExt::oneshot`,
//! so middleware and extractors run exactly as they do behind a listener.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use itsm_notification_hub::config::{
    ApiConfig, HubConfig, JwtConfig, OtelConfig, ServerConfig, Settings, WebSocketConfig,
};
use itsm_notification_hub::hub::{Hub, Session};
use itsm_notification_hub::server::{create_app, AppState};

const API_KEY: &str = "test-api-key";

fn test_settings(api_key: Option<&str>) -> Settings {
    Settings {
        server: ServerConfig::default(),
        jwt: JwtConfig {
            secret: "integration-secret".to_string(),
            issuer: None,
            audience: None,
        },
        api: ApiConfig {
            key: api_key.map(str::to_string),
        },
        hub: HubConfig::default(),
        websocket: WebSocketConfig::default(),
        otel: OtelConfig::default(),
    }
}

fn test_app(hub: Arc<Hub>) -> Router {
    create_app(AppState::with_hub(test_settings(Some(API_KEY)), hub))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn publish_request(body: Value, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/notifications")
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("X-API-Key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_health_reports_hub() {
    let hub = Arc::new(Hub::new());
    let (a, _ra) = Session::new(1, "alice", 8);
    let (b, _rb) = Session::new(1, "alice", 8);
    hub.register(Arc::new(a));
    hub.register(Arc::new(b));

    let response = test_app(hub)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["hub"]["active_sessions"], 2);
    assert_eq!(body["hub"]["unique_users"], 1);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let response = test_app(Arc::new(Hub::new()))
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("itsm_hub_sessions_active"));
}

#[tokio::test]
async fn test_publish_requires_api_key() {
    let app = test_app(Arc::new(Hub::new()));
    let body = json!({
        "target": {"type": "broadcast"},
        "kind": "system_announcement",
        "title": "Maintenance"
    });

    let missing = app
        .clone()
        .oneshot(publish_request(body.clone(), None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app
        .oneshot(publish_request(body, Some("nope")))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_publish_delivers_to_user_sessions() {
    let hub = Arc::new(Hub::new());
    let (a, mut ra) = Session::new(5, "bob", 8);
    let (b, mut rb) = Session::new(6, "carol", 8);
    hub.register(Arc::new(a));
    hub.register(Arc::new(b));

    let response = test_app(hub)
        .oneshot(publish_request(
            json!({
                "target": {"type": "users", "target": [5, 99]},
                "kind": "incident_escalated",
                "title": "INC-77 escalated",
                "entity": {"kind": "incident", "id": 77},
                "priority": "high"
            }),
            Some(API_KEY),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["recipients"], 1);
    assert_eq!(body["delivered"], 1);
    assert_eq!(body["evicted"], 0);

    let frame: Value = serde_json::from_str(ra.try_recv().unwrap().as_str()).unwrap();
    assert_eq!(frame["type"], "notification");
    assert_eq!(frame["kind"], "incident_escalated");
    assert_eq!(frame["priority"], "high");
    assert_eq!(frame["id"], body["notification_id"]);
    assert!(rb.try_recv().is_err());
}

#[tokio::test]
async fn test_publish_validation_error() {
    let response = test_app(Arc::new(Hub::new()))
        .oneshot(publish_request(
            json!({
                "target": {"type": "users", "target": []},
                "kind": "ticket_created",
                "title": "TCK-1"
            }),
            Some(API_KEY),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_publish_open_without_configured_key() {
    let hub = Arc::new(Hub::new());
    let app = create_app(AppState::with_hub(test_settings(None), hub));

    let response = app
        .oneshot(publish_request(
            json!({
                "target": {"type": "user", "target": 1},
                "kind": "ticket_commented",
                "title": "New comment"
            }),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["recipients"], 0);
}
