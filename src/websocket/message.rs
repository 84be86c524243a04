use serde::{Deserialize, Serialize};

use crate::notification::Notification;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "notification")]
    Notification {
        #[serde(flatten)]
        notification: Notification,
    },
    #[serde(rename = "pong")]
    Pong,
    #[serde(rename = "error")]
    Error { code: String, message: String },
    /// Server is going away; clients should reconnect after the delay
    #[serde(rename = "shutdown")]
    Shutdown { reconnect_after_seconds: u64 },
}

impl ServerMessage {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<Notification> for ServerMessage {
    fn from(notification: Notification) -> Self {
        Self::Notification { notification }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Notification;

    #[test]
    fn test_notification_is_flattened() {
        let msg = ServerMessage::from(Notification::announcement("Maintenance", "Tonight 22:00"));
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["type"], "notification");
        assert_eq!(value["kind"], "system_announcement");
        assert_eq!(value["title"], "Maintenance");
    }

    #[test]
    fn test_client_ping_parses() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"subscribe"}"#).is_err());
    }

    #[test]
    fn test_error_shape() {
        let json = serde_json::to_string(&ServerMessage::error("INVALID_MESSAGE", "bad")).unwrap();
        assert_eq!(json, r#"{"type":"error","code":"INVALID_MESSAGE","message":"bad"}"#);
    }

    #[test]
    fn test_shutdown_shape() {
        let json = serde_json::to_string(&ServerMessage::Shutdown { reconnect_after_seconds: 5 }).unwrap();
        assert_eq!(json, r#"{"type":"shutdown","reconnect_after_seconds":5}"#);
    }
}
