use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::AppError;
use crate::hub::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (numeric ITSM user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Display name, used for logging only
    #[serde(default)]
    pub username: Option<String>,
    /// User roles
    #[serde(default)]
    pub roles: Vec<String>,
    /// Additional custom claims
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Parse the subject as an ITSM user id
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::Auth(format!("Subject is not a user id: {}", self.sub)))
    }

    /// Username claim, falling back to the subject
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.sub)
    }
}
