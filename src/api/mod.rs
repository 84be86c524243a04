//! API layer - HTTP endpoint handlers.

mod health;
mod metrics;
mod notifications;
mod routes;

pub use health::{health, HealthResponse, HubHealthResponse};
pub use metrics::prometheus_metrics;
pub use notifications::{publish_notification, PublishRequest, PublishResponse};
pub use routes::api_routes;
