use std::sync::Arc;
use std::time::Instant;

use crate::auth::JwtValidator;
use crate::config::Settings;
use crate::hub::Hub;
use crate::notification::NotificationPublisher;

/// Shared handles passed to every handler. The hub is created here once and
/// lives as long as the process.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub jwt_validator: Arc<JwtValidator>,
    pub hub: Arc<Hub>,
    pub publisher: NotificationPublisher,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self::with_hub(settings, Arc::new(Hub::new()))
    }

    /// Build state around an existing hub, e.g. one shared with in-process
    /// domain services
    pub fn with_hub(settings: Settings, hub: Arc<Hub>) -> Self {
        let jwt_validator = Arc::new(JwtValidator::new(&settings.jwt));
        let publisher = NotificationPublisher::new(hub.clone());

        Self {
            settings: Arc::new(settings),
            jwt_validator,
            hub,
            publisher,
            start_time: Instant::now(),
        }
    }
}
