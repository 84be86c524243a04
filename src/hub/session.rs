//! Session handle and its bounded outbound buffer

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::message::EncodedMessage;

/// Opaque identity of a session inside the hub's active set
pub type SessionId = Uuid;

/// Authenticated ITSM user id
pub type UserId = u64;

/// Why a single enqueue attempt did not land in the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError {
    /// Buffer is at capacity; the consumer is not keeping up
    #[error("outbound buffer is full")]
    Full,
    /// Buffer was closed by the hub or the consumer has gone away
    #[error("outbound buffer is closed")]
    Closed,
}

/// Handle for a single connected client.
///
/// The sender half of the outbound buffer is owned by the session and can only
/// be dropped through [`Session::close`], which the hub calls while holding the
/// write side of its set lock.
pub struct Session {
    id: SessionId,
    user_id: UserId,
    username: String,
    capacity: usize,
    connected_at: DateTime<Utc>,
    outbound: Mutex<Option<mpsc::Sender<EncodedMessage>>>,
}

impl Session {
    /// Create a session together with the receiving end of its outbound buffer.
    ///
    /// The receiver belongs to the connection layer, which drains it into the
    /// socket and treats `None` from `recv` as the hub closing the session.
    pub fn new(
        user_id: UserId,
        username: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<EncodedMessage>) {
        // mpsc::channel panics on zero
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);

        let session = Self {
            id: Uuid::new_v4(),
            user_id,
            username: username.into(),
            capacity,
            connected_at: Utc::now(),
            outbound: Mutex::new(Some(tx)),
        };

        (session, rx)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Whole seconds since the session was created
    pub fn age_secs(&self) -> i64 {
        (Utc::now() - self.connected_at).num_seconds()
    }

    /// Whether the outbound buffer has been closed
    pub fn is_closed(&self) -> bool {
        self.outbound.lock().is_none()
    }

    /// Non-blocking append to the outbound buffer
    pub fn try_enqueue(&self, message: EncodedMessage) -> Result<(), EnqueueError> {
        let guard = self.outbound.lock();
        let Some(tx) = guard.as_ref() else {
            return Err(EnqueueError::Closed);
        };

        tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// Close the outbound buffer. Returns false if it was already closed.
    pub(crate) fn close(&self) -> bool {
        self.outbound.lock().take().is_some()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("capacity", &self.capacity)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(text: &str) -> EncodedMessage {
        EncodedMessage::from_text(text)
    }

    #[test]
    fn test_enqueue_until_full() {
        let (session, mut rx) = Session::new(7, "alice", 2);

        assert!(session.try_enqueue(msg("a")).is_ok());
        assert!(session.try_enqueue(msg("b")).is_ok());
        assert_eq!(session.try_enqueue(msg("c")), Err(EnqueueError::Full));

        assert_eq!(rx.try_recv().unwrap().as_str(), "a");
        assert_eq!(rx.try_recv().unwrap().as_str(), "b");
    }

    #[test]
    fn test_close_is_exactly_once() {
        let (session, mut rx) = Session::new(7, "alice", 4);

        assert!(!session.is_closed());
        assert!(session.close());
        assert!(!session.close());
        assert!(session.is_closed());

        assert_eq!(session.try_enqueue(msg("late")), Err(EnqueueError::Closed));
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_dropped_receiver_reports_closed() {
        let (session, rx) = Session::new(7, "alice", 4);
        drop(rx);

        assert_eq!(session.try_enqueue(msg("x")), Err(EnqueueError::Closed));
        // The hub still owns the close
        assert!(!session.is_closed());
    }

    #[test]
    fn test_fresh_session_age() {
        let (session, _rx) = Session::new(1, "bob", 1);
        assert!(session.connected_at() <= Utc::now());
        assert!((0..=1).contains(&session.age_secs()));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (session, _rx) = Session::new(1, "bob", 0);
        assert_eq!(session.capacity(), 1);
        assert!(session.try_enqueue(msg("only")).is_ok());
        assert_eq!(session.try_enqueue(msg("more")), Err(EnqueueError::Full));
    }
}
