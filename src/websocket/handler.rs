use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::hub::{EncodedMessage, Hub, Session, SessionId, UserId};
use crate::metrics::WsMetrics;
use crate::server::AppState;

use super::message::{ClientMessage, ServerMessage};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// WebSocket upgrade handler
#[tracing::instrument(
    name = "ws.upgrade",
    skip(ws, state, query, headers),
    fields(has_query_token = query.token.is_some())
)]
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(token) = extract_token(&query, &headers) else {
        return (StatusCode::UNAUTHORIZED, "Missing authentication token").into_response();
    };

    let claims = match state.jwt_validator.validate(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(error = %e, "JWT validation failed");
            return (StatusCode::UNAUTHORIZED, "Invalid token").into_response();
        }
    };

    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Token subject rejected");
            return (StatusCode::UNAUTHORIZED, "Invalid token subject").into_response();
        }
    };
    let username = claims.username().to_string();

    tracing::info!(user_id = user_id, username = %username, "WebSocket upgrade requested");

    ws.max_message_size(state.settings.websocket.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state, user_id, username))
}

/// Extract token from query parameter or Authorization header
fn extract_token(query: &WsQuery, headers: &HeaderMap) -> Option<String> {
    if let Some(ref token) = query.token {
        return Some(token.clone());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Run an established connection until either side gives up
#[tracing::instrument(
    name = "ws.connection",
    skip(socket, state, username),
    fields(otel.kind = "server")
)]
async fn handle_socket(socket: WebSocket, state: AppState, user_id: UserId, username: String) {
    let connection_start = Instant::now();
    let ws_config = &state.settings.websocket;
    let ping_interval = Duration::from_secs(ws_config.ping_interval);
    let pong_timeout = Duration::from_secs(ws_config.pong_timeout);

    let (session, outbound) =
        Session::new(user_id, username, state.settings.hub.session_buffer_size);
    let session = Arc::new(session);
    let session_id = session.id();

    state.hub.register(session.clone());
    WsMetrics::record_opened();

    let (ws_sender, ws_receiver) = socket.split();

    let mut send_task = tokio::spawn(write_pump(ws_sender, outbound, ping_interval));
    let mut recv_task = tokio::spawn(read_pump(
        ws_receiver,
        state.hub.clone(),
        session_id,
        pong_timeout,
    ));

    // Whichever side finishes first takes the other down with it
    tokio::select! {
        _ = &mut send_task => {
            tracing::debug!(session_id = %session_id, "Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            tracing::debug!(session_id = %session_id, "Receive task completed");
            send_task.abort();
        }
    }

    // No-op if the hub already evicted this session
    state.hub.unregister(session_id);

    let duration = connection_start.elapsed().as_secs_f64();
    WsMetrics::record_closed(duration);

    tracing::info!(
        session_id = %session_id,
        user_id = user_id,
        username = %session.username(),
        duration_secs = duration,
        "WebSocket connection closed"
    );
}

/// Drain the session's outbound buffer into the socket and keep the
/// connection alive with pings. A closed buffer means the hub dropped the
/// session, so say goodbye and stop.
async fn write_pump(
    mut sender: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<EncodedMessage>,
    ping_interval: Duration,
) {
    let mut ping_timer = tokio::time::interval(ping_interval);
    // Skip immediate first tick
    ping_timer.tick().await;

    loop {
        tokio::select! {
            next = outbound.recv() => match next {
                Some(message) => {
                    let text = message.as_str().to_owned();
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                None => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            },
            _ = ping_timer.tick() => {
                if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Read frames until the client leaves, errors, or goes quiet for longer
/// than `pong_timeout`. Any frame, including pongs, resets the deadline.
async fn read_pump(
    mut receiver: SplitStream<WebSocket>,
    hub: Arc<Hub>,
    session_id: SessionId,
    pong_timeout: Duration,
) {
    loop {
        let next = match tokio::time::timeout(pong_timeout, receiver.next()).await {
            Ok(next) => next,
            Err(_) => {
                tracing::info!(
                    session_id = %session_id,
                    timeout_secs = pong_timeout.as_secs(),
                    "Closing idle connection"
                );
                break;
            }
        };

        match next {
            Some(Ok(msg)) => {
                if !process_message(msg, &hub, session_id) {
                    break;
                }
            }
            Some(Err(e)) => {
                tracing::warn!(session_id = %session_id, error = %e, "WebSocket receive error");
                break;
            }
            None => break,
        }
    }
}

/// Process a received WebSocket message.
/// Returns false if the connection should be closed.
fn process_message(msg: Message, hub: &Hub, session_id: SessionId) -> bool {
    match msg {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(ClientMessage::Ping) => {
                    WsMetrics::record_ping();
                    hub.send_to_session(session_id, &ServerMessage::Pong);
                }
                Err(e) => {
                    WsMetrics::record_invalid();
                    tracing::debug!(session_id = %session_id, error = %e, "Failed to parse client message");
                    hub.send_to_session(
                        session_id,
                        &ServerMessage::error("INVALID_MESSAGE", e.to_string()),
                    );
                }
            }
            true
        }
        Message::Binary(_) => {
            WsMetrics::record_invalid();
            hub.send_to_session(
                session_id,
                &ServerMessage::error("UNSUPPORTED_FORMAT", "Binary messages are not supported"),
            );
            true
        }
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(session_id = %session_id, "Received close frame");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn query(token: Option<&str>) -> WsQuery {
        WsQuery {
            token: token.map(str::to_string),
        }
    }

    #[test]
    fn test_token_from_query_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));

        assert_eq!(
            extract_token(&query(Some("query-token")), &headers).as_deref(),
            Some("query-token")
        );
        assert_eq!(
            extract_token(&query(None), &headers).as_deref(),
            Some("header-token")
        );
    }

    #[test]
    fn test_missing_or_malformed_token() {
        let mut headers = HeaderMap::new();
        assert!(extract_token(&query(None), &headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_token(&query(None), &headers).is_none());
    }

    fn registered(hub: &Hub) -> (SessionId, mpsc::Receiver<EncodedMessage>) {
        let (session, rx) = Session::new(1, "alice", 8);
        let id = session.id();
        hub.register(Arc::new(session));
        (id, rx)
    }

    #[test]
    fn test_ping_is_answered_through_hub() {
        let hub = Hub::new();
        let (id, mut rx) = registered(&hub);

        assert!(process_message(Message::Text(r#"{"type":"ping"}"#.into()), &hub, id));
        assert_eq!(rx.try_recv().unwrap().as_str(), r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_invalid_text_gets_error_reply() {
        let hub = Hub::new();
        let (id, mut rx) = registered(&hub);

        assert!(process_message(Message::Text("not json".into()), &hub, id));
        let reply: serde_json::Value = serde_json::from_str(rx.try_recv().unwrap().as_str()).unwrap();
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["code"], "INVALID_MESSAGE");
    }

    #[test]
    fn test_close_frame_ends_connection() {
        let hub = Hub::new();
        let (id, _rx) = registered(&hub);
        assert!(!process_message(Message::Close(None), &hub, id));
    }
}
