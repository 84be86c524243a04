//! ITSM notification envelopes and the publisher domain services use to send them.

mod publisher;
mod types;

pub use publisher::NotificationPublisher;
pub use types::{
    EntityKind, EntityRef, Notification, NotificationBuilder, NotificationKind, NotificationTarget,
    Priority,
};
