use std::sync::Arc;

use crate::hub::{DeliveryReport, Hub};
use crate::metrics::NotificationMetrics;
use crate::websocket::ServerMessage;

use super::{Notification, NotificationTarget};

/// Entry point for ticket, incident, change and SLA services to push
/// notifications to connected clients.
#[derive(Clone)]
pub struct NotificationPublisher {
    hub: Arc<Hub>,
}

impl NotificationPublisher {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Publish a notification to the given target.
    ///
    /// Best-effort: the report says how many sessions accepted it but nothing
    /// is retried or stored for offline users.
    #[tracing::instrument(
        name = "publisher.publish",
        skip(self, notification),
        fields(
            notification_id = %notification.id,
            kind = %notification.kind,
            target_type = target.as_str()
        )
    )]
    pub fn publish(&self, target: &NotificationTarget, notification: Notification) -> DeliveryReport {
        let kind = notification.kind;
        let message = ServerMessage::from(notification);

        let report = match target {
            NotificationTarget::Broadcast => self.hub.broadcast(&message),
            NotificationTarget::User(user_id) => self.hub.send_to_user(*user_id, &message),
            NotificationTarget::Users(user_ids) => self.hub.send_to_users(user_ids, &message),
        };

        NotificationMetrics::record_published(kind.as_str());

        tracing::debug!(
            recipients = report.recipients,
            delivered = report.delivered,
            evicted = report.evicted,
            "Notification published"
        );

        report
    }

    pub fn broadcast(&self, notification: Notification) -> DeliveryReport {
        self.publish(&NotificationTarget::Broadcast, notification)
    }

    pub fn notify_user(&self, user_id: u64, notification: Notification) -> DeliveryReport {
        self.publish(&NotificationTarget::User(user_id), notification)
    }

    pub fn notify_users(&self, user_ids: Vec<u64>, notification: Notification) -> DeliveryReport {
        self.publish(&NotificationTarget::Users(user_ids), notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::Session;

    #[test]
    fn test_publish_routes_to_target_user() {
        let hub = Arc::new(Hub::new());
        let publisher = NotificationPublisher::new(hub.clone());

        let (agent, mut agent_rx) = Session::new(10, "agent", 8);
        let (requester, mut requester_rx) = Session::new(20, "requester", 8);
        hub.register(Arc::new(agent));
        hub.register(Arc::new(requester));

        let report = publisher.notify_user(10, Notification::ticket_assigned(5, "VPN down", "agent"));
        assert_eq!(report.delivered, 1);

        let text = agent_rx.try_recv().unwrap();
        let value: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(value["type"], "notification");
        assert_eq!(value["kind"], "ticket_assigned");
        assert!(requester_rx.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_with_nobody_connected() {
        let publisher = NotificationPublisher::new(Arc::new(Hub::new()));
        let report = publisher.broadcast(Notification::announcement("Upgrade", "Back at 6am"));
        assert!(report.is_empty());
    }

    #[test]
    fn test_notify_users() {
        let hub = Arc::new(Hub::new());
        let publisher = NotificationPublisher::new(hub.clone());

        let mut receivers = Vec::new();
        for user_id in [1, 2, 3] {
            let (session, rx) = Session::new(user_id, format!("u{}", user_id), 4);
            hub.register(Arc::new(session));
            receivers.push(rx);
        }

        let report = publisher.notify_users(vec![1, 3], Notification::sla_breached(77, "P1 response"));
        assert_eq!(report.recipients, 2);
        assert!(receivers[0].try_recv().is_ok());
        assert!(receivers[1].try_recv().is_err());
        assert!(receivers[2].try_recv().is_ok());
    }
}
