use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::metrics::HubMetrics;

use super::message::{DeliveryReport, EncodedMessage};
use super::session::{EnqueueError, Session, SessionId, UserId};

/// Snapshot of the hub for health reporting
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HubStats {
    pub active_sessions: usize,
    pub unique_users: usize,
}

/// Fan-out broker over the set of connected sessions.
///
/// Delivery takes the read side of the lock and only ever `try_enqueue`s, so
/// it never blocks on a consumer. Membership changes, including evictions,
/// take the write side. A buffer is closed only after its session has been
/// removed from the map inside the same write-locked section.
pub struct Hub {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Add a session to the active set
    pub fn register(&self, session: Arc<Session>) {
        let session_id = session.id();
        let user_id = session.user_id();

        let active = {
            let mut sessions = self.sessions.write();
            // Checked under the write lock so a concurrent close cannot slip in
            if session.is_closed() {
                drop(sessions);
                tracing::warn!(
                    session_id = %session_id,
                    user_id = user_id,
                    "Refusing to register a closed session"
                );
                return;
            }
            if sessions.contains_key(&session_id) {
                drop(sessions);
                tracing::warn!(
                    session_id = %session_id,
                    user_id = user_id,
                    "Session already registered"
                );
                return;
            }
            sessions.insert(session_id, session.clone());
            sessions.len()
        };

        HubMetrics::record_registered(active);

        tracing::info!(
            session_id = %session_id,
            user_id = user_id,
            username = %session.username(),
            active_sessions = active,
            "Session registered"
        );
    }

    /// Remove a session and close its outbound buffer.
    ///
    /// Returns false when the session was not in the active set.
    pub fn unregister(&self, session_id: SessionId) -> bool {
        let (removed, active) = {
            let mut sessions = self.sessions.write();
            let removed = Self::remove_and_close(&mut sessions, session_id);
            (removed, sessions.len())
        };

        let Some(session) = removed else {
            tracing::debug!(session_id = %session_id, "Unregister of unknown session ignored");
            return false;
        };

        HubMetrics::record_unregistered(active);

        tracing::info!(
            session_id = %session_id,
            user_id = session.user_id(),
            username = %session.username(),
            age_secs = session.age_secs(),
            active_sessions = active,
            "Session unregistered"
        );

        true
    }

    /// Deliver to every active session
    pub fn broadcast<T: Serialize + ?Sized>(&self, message: &T) -> DeliveryReport {
        self.deliver("broadcast", message, |_| true)
    }

    /// Deliver to every session owned by `user_id`
    pub fn send_to_user<T: Serialize + ?Sized>(&self, user_id: UserId, message: &T) -> DeliveryReport {
        self.deliver("user", message, |s| s.user_id() == user_id)
    }

    /// Deliver to every session owned by any of `user_ids`
    pub fn send_to_users<T: Serialize + ?Sized>(
        &self,
        user_ids: &[UserId],
        message: &T,
    ) -> DeliveryReport {
        if user_ids.is_empty() {
            return DeliveryReport::default();
        }
        let wanted: HashSet<UserId> = user_ids.iter().copied().collect();
        self.deliver("users", message, |s| wanted.contains(&s.user_id()))
    }

    /// Deliver to a single session, e.g. a reply to something that client sent
    pub fn send_to_session<T: Serialize + ?Sized>(
        &self,
        session_id: SessionId,
        message: &T,
    ) -> DeliveryReport {
        self.deliver("session", message, |s| s.id() == session_id)
    }

    /// Remove and close every session. Used when the server is going away.
    pub fn close_all(&self) -> usize {
        let (closed, active) = {
            let mut sessions = self.sessions.write();
            let ids: Vec<SessionId> = sessions.keys().copied().collect();
            let closed = ids
                .into_iter()
                .filter_map(|id| Self::remove_and_close(&mut sessions, id))
                .count();
            (closed, sessions.len())
        };

        if closed > 0 {
            HubMetrics::record_closed_all(closed, active);
            tracing::info!(closed = closed, "Closed all sessions");
        }

        closed
    }

    pub fn active_session_count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn unique_user_count(&self) -> usize {
        let sessions = self.sessions.read();
        sessions
            .values()
            .map(|s| s.user_id())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn user_session_count(&self, user_id: UserId) -> usize {
        self.sessions
            .read()
            .values()
            .filter(|s| s.user_id() == user_id)
            .count()
    }

    pub fn is_user_online(&self, user_id: UserId) -> bool {
        self.sessions.read().values().any(|s| s.user_id() == user_id)
    }

    pub fn is_registered(&self, session_id: SessionId) -> bool {
        self.sessions.read().contains_key(&session_id)
    }

    pub fn stats(&self) -> HubStats {
        let sessions = self.sessions.read();
        let unique_users = sessions
            .values()
            .map(|s| s.user_id())
            .collect::<HashSet<_>>()
            .len();

        HubStats {
            active_sessions: sessions.len(),
            unique_users,
        }
    }

    /// Encode once, enqueue into every selected session, then evict the ones
    /// that could not take it.
    fn deliver<T, F>(&self, target: &'static str, message: &T, filter: F) -> DeliveryReport
    where
        T: Serialize + ?Sized,
        F: Fn(&Session) -> bool,
    {
        let encoded = match EncodedMessage::encode(message) {
            Ok(encoded) => encoded,
            Err(e) => {
                HubMetrics::record_encode_failure(target);
                tracing::error!(target_type = target, error = %e, "Failed to encode message, delivery abandoned");
                return DeliveryReport::default();
            }
        };

        let mut report = DeliveryReport::default();
        let mut stalled = Vec::new();

        {
            let sessions = self.sessions.read();
            for session in sessions.values().filter(|s| filter(s)) {
                report.recipients += 1;
                match session.try_enqueue(encoded.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(reason) => stalled.push((session.id(), reason)),
                }
            }
        }

        if !stalled.is_empty() {
            report.evicted = self.evict(&stalled);
        }

        HubMetrics::record_delivery(target, &report);

        tracing::debug!(
            target_type = target,
            bytes = encoded.len(),
            recipients = report.recipients,
            delivered = report.delivered,
            evicted = report.evicted,
            "Message delivered"
        );

        report
    }

    /// Remove sessions that failed an enqueue. Sessions already removed by a
    /// concurrent call are skipped.
    fn evict(&self, stalled: &[(SessionId, EnqueueError)]) -> usize {
        let mut evicted = Vec::with_capacity(stalled.len());

        let active = {
            let mut sessions = self.sessions.write();
            for (session_id, reason) in stalled {
                if let Some(session) = Self::remove_and_close(&mut sessions, *session_id) {
                    evicted.push((session, *reason));
                }
            }
            sessions.len()
        };

        for (session, reason) in &evicted {
            HubMetrics::record_evicted(active);
            tracing::warn!(
                session_id = %session.id(),
                user_id = session.user_id(),
                username = %session.username(),
                reason = %reason,
                age_secs = session.age_secs(),
                active_sessions = active,
                "Session disconnected: outbound buffer could not accept message"
            );
        }

        evicted.len()
    }

    /// Must be called with the write lock held
    fn remove_and_close(
        sessions: &mut HashMap<SessionId, Arc<Session>>,
        session_id: SessionId,
    ) -> Option<Arc<Session>> {
        let session = sessions.remove(&session_id)?;
        session.close();
        Some(session)
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
