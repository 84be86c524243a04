use std::sync::Arc;

use serde::Serialize;

/// A message serialized once and shared by reference across every recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage(Arc<str>);

impl EncodedMessage {
    /// Serialize any payload to JSON text
    pub fn encode<T: Serialize + ?Sized>(payload: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_string(payload).map(|json| Self(Arc::from(json)))
    }

    /// Wrap text that is already encoded
    pub fn from_text(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when both handles point at the same encoded buffer
    pub fn shares_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// What a single delivery call did.
///
/// Informational only: delivery is fire-and-forget and callers are free to
/// ignore this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// Sessions selected by the target
    pub recipients: usize,
    /// Sessions whose buffer accepted the message
    pub delivered: usize,
    /// Sessions torn down during this call because they could not accept it
    pub evicted: usize,
}

impl DeliveryReport {
    pub fn is_empty(&self) -> bool {
        self.recipients == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_json() {
        let msg = EncodedMessage::encode(&json!({"type": "ping"})).unwrap();
        assert_eq!(msg.as_str(), r#"{"type":"ping"}"#);
        assert!(!msg.is_empty());
    }

    #[test]
    fn test_clones_share_buffer() {
        let msg = EncodedMessage::from_text("hello");
        let copy = msg.clone();
        assert!(msg.shares_buffer(&copy));
        assert!(!msg.shares_buffer(&EncodedMessage::from_text("hello")));
    }
}
