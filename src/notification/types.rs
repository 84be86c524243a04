use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hub::UserId;

/// What happened in the ITSM system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TicketCreated,
    TicketUpdated,
    TicketAssigned,
    TicketCommented,
    TicketResolved,
    IncidentCreated,
    IncidentUpdated,
    IncidentEscalated,
    ChangeRequested,
    ChangeApproved,
    ChangeRejected,
    SlaWarning,
    SlaBreached,
    SystemAnnouncement,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TicketCreated => "ticket_created",
            Self::TicketUpdated => "ticket_updated",
            Self::TicketAssigned => "ticket_assigned",
            Self::TicketCommented => "ticket_commented",
            Self::TicketResolved => "ticket_resolved",
            Self::IncidentCreated => "incident_created",
            Self::IncidentUpdated => "incident_updated",
            Self::IncidentEscalated => "incident_escalated",
            Self::ChangeRequested => "change_requested",
            Self::ChangeApproved => "change_approved",
            Self::ChangeRejected => "change_rejected",
            Self::SlaWarning => "sla_warning",
            Self::SlaBreached => "sla_breached",
            Self::SystemAnnouncement => "system_announcement",
        }
    }

    /// Priority a notification of this kind gets unless set explicitly
    pub fn default_priority(&self) -> Priority {
        match self {
            Self::SlaBreached | Self::IncidentEscalated => Priority::Critical,
            Self::SlaWarning | Self::IncidentCreated | Self::TicketAssigned => Priority::High,
            _ => Priority::Normal,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of ITSM record a notification refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Ticket,
    Incident,
    Change,
    Sla,
}

/// Reference to the record a notification is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: u64,
}

/// Priority levels for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Notification envelope pushed to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

/// Who a notification goes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "target", rename_all = "snake_case")]
pub enum NotificationTarget {
    /// Every connected session
    Broadcast,
    /// All sessions of one user
    User(UserId),
    /// All sessions of several users
    Users(Vec<UserId>),
}

impl NotificationTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Broadcast => "broadcast",
            Self::User(_) => "user",
            Self::Users(_) => "users",
        }
    }
}

/// Builder for creating notifications
#[derive(Debug, Clone)]
pub struct NotificationBuilder {
    kind: NotificationKind,
    title: String,
    message: String,
    entity: Option<EntityRef>,
    data: serde_json::Value,
    priority: Option<Priority>,
}

impl NotificationBuilder {
    pub fn new(kind: NotificationKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: String::new(),
            entity: None,
            data: serde_json::Value::Null,
            priority: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn entity(mut self, kind: EntityKind, id: u64) -> Self {
        self.entity = Some(EntityRef { kind, id });
        self
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Set the data from a serializable value
    pub fn data_from<T: Serialize>(mut self, data: &T) -> Result<Self, serde_json::Error> {
        self.data = serde_json::to_value(data)?;
        Ok(self)
    }

    /// Override the kind's default priority
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn build(self) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            kind: self.kind,
            title: self.title,
            message: self.message,
            entity: self.entity,
            data: self.data,
            priority: self.priority.unwrap_or_else(|| self.kind.default_priority()),
            created_at: Utc::now(),
        }
    }
}

impl Notification {
    pub fn builder(kind: NotificationKind, title: impl Into<String>) -> NotificationBuilder {
        NotificationBuilder::new(kind, title)
    }

    pub fn ticket_assigned(ticket_id: u64, ticket_title: &str, assignee_name: &str) -> Self {
        Self::builder(NotificationKind::TicketAssigned, "Ticket assigned")
            .message(format!(
                "Ticket #{} \"{}\" was assigned to {}",
                ticket_id, ticket_title, assignee_name
            ))
            .entity(EntityKind::Ticket, ticket_id)
            .build()
    }

    pub fn sla_breached(ticket_id: u64, sla_name: &str) -> Self {
        Self::builder(NotificationKind::SlaBreached, "SLA breached")
            .message(format!("Ticket #{} breached SLA \"{}\"", ticket_id, sla_name))
            .entity(EntityKind::Ticket, ticket_id)
            .build()
    }

    pub fn announcement(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::builder(NotificationKind::SystemAnnouncement, title)
            .message(message)
            .build()
    }
}
