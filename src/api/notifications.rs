//! Publish endpoint for services that run outside this process.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::hub::DeliveryReport;
use crate::notification::{
    EntityRef, NotificationBuilder, NotificationKind, NotificationTarget, Priority,
};
use crate::server::AppState;

const MAX_TITLE_LEN: usize = 200;
const MAX_TARGET_USERS: usize = 10_000;

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub target: NotificationTarget,
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub entity: Option<EntityRef>,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub priority: Option<Priority>,
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub notification_id: Uuid,
    pub recipients: usize,
    pub delivered: usize,
    pub evicted: usize,
    pub timestamp: DateTime<Utc>,
}

impl PublishRequest {
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title is required".into()));
        }
        if self.title.len() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "title must be at most {} bytes",
                MAX_TITLE_LEN
            )));
        }
        if let NotificationTarget::Users(ids) = &self.target {
            if ids.is_empty() {
                return Err(AppError::Validation("target user list is empty".into()));
            }
            if ids.len() > MAX_TARGET_USERS {
                return Err(AppError::Validation(format!(
                    "at most {} target users are allowed",
                    MAX_TARGET_USERS
                )));
            }
        }
        Ok(())
    }
}

/// POST /api/v1/notifications
#[tracing::instrument(
    name = "http.publish",
    skip(state, request),
    fields(kind = %request.kind, target_type = request.target.as_str())
)]
pub async fn publish_notification(
    State(state): State<AppState>,
    Json(request): Json<PublishRequest>,
) -> Result<Json<PublishResponse>> {
    request.validate()?;

    let mut builder = NotificationBuilder::new(request.kind, request.title)
        .message(request.message)
        .data(request.data);

    if let Some(entity) = request.entity {
        builder = builder.entity(entity.kind, entity.id);
    }
    if let Some(priority) = request.priority {
        builder = builder.priority(priority);
    }

    let notification = builder.build();
    let notification_id = notification.id;

    let DeliveryReport {
        recipients,
        delivered,
        evicted,
    } = state.publisher.publish(&request.target, notification);

    Ok(Json(PublishResponse {
        notification_id,
        recipients,
        delivered,
        evicted,
        timestamp: Utc::now(),
    }))
}
