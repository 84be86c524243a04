use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::config::JwtConfig;
use crate::error::AppError;

use super::Claims;

/// Validates the HS256 tokens issued by the ITSM login service
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(config: &JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::default();

        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }

        if let Some(ref audience) = config.audience {
            validation.set_audience(&[audience]);
        }

        Self {
            decoding_key,
            validation,
        }
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}
