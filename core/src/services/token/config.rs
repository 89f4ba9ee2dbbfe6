//! Configuration for the token services

use chrono::Duration;
use jsonwebtoken::Algorithm;
use rotor_shared::config::AuthConfig;

use crate::domain::entities::token::{
    ACCESS_TOKEN_EXPIRY_MINUTES, JWT_AUDIENCE, JWT_ISSUER, REFRESH_TOKEN_EXPIRY_DAYS,
};
use crate::errors::DomainError;

/// Longest accepted access token lifetime (one day)
pub const MAX_ACCESS_TOKEN_EXPIRY_SECONDS: i64 = 86_400;

/// Longest accepted refresh credential lifetime (one year)
pub const MAX_REFRESH_TOKEN_EXPIRY_SECONDS: i64 = 365 * 86_400;

/// Configuration shared by the issuer, the rotation engine and the JWT codec
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// JWT signing algorithm (HMAC family only)
    pub algorithm: Algorithm,
    /// Access token lifetime in seconds
    pub access_token_expiry_seconds: i64,
    /// Refresh credential lifetime in seconds
    pub refresh_token_expiry_seconds: i64,
    /// Secret regenerations allowed per issuance before giving up
    pub max_issue_attempts: u32,
    /// `iss` claim
    pub issuer: String,
    /// `aud` claim
    pub audience: String,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "development-secret-please-change-in-production".to_string(),
            algorithm: Algorithm::HS256,
            access_token_expiry_seconds: ACCESS_TOKEN_EXPIRY_MINUTES * 60,
            refresh_token_expiry_seconds: REFRESH_TOKEN_EXPIRY_DAYS * 86400,
            max_issue_attempts: 3,
            issuer: JWT_ISSUER.to_string(),
            audience: JWT_AUDIENCE.to_string(),
        }
    }
}

impl TokenServiceConfig {
    /// Builds the service configuration from the application auth settings
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the algorithm name is unknown or
    /// a lifetime is not positive or exceeds its maximum.
    pub fn from_auth_config(auth: &AuthConfig) -> Result<Self, DomainError> {
        let algorithm = auth.jwt.algorithm.parse::<Algorithm>().map_err(|_| DomainError::Validation {
            message: format!("unsupported JWT algorithm: {}", auth.jwt.algorithm),
        })?;

        let config = Self {
            jwt_secret: auth.jwt.secret.clone(),
            algorithm,
            access_token_expiry_seconds: auth.jwt.access_token_expiry,
            refresh_token_expiry_seconds: auth.jwt.refresh_token_expiry,
            max_issue_attempts: auth.rotation.max_issue_attempts.max(1),
            issuer: auth.jwt.issuer.clone(),
            audience: auth.jwt.audience.clone(),
        };

        if config.access_token_expiry_seconds <= 0 || config.refresh_token_expiry_seconds <= 0 {
            return Err(DomainError::Validation {
                message: "token lifetimes must be positive".to_string(),
            });
        }

        if config.access_token_expiry_seconds > MAX_ACCESS_TOKEN_EXPIRY_SECONDS {
            return Err(DomainError::Validation {
                message: format!(
                    "access token lifetime {}s exceeds the maximum of {}s",
                    config.access_token_expiry_seconds, MAX_ACCESS_TOKEN_EXPIRY_SECONDS
                ),
            });
        }
        if config.refresh_token_expiry_seconds > MAX_REFRESH_TOKEN_EXPIRY_SECONDS {
            return Err(DomainError::Validation {
                message: format!(
                    "refresh token lifetime {}s exceeds the maximum of {}s",
                    config.refresh_token_expiry_seconds, MAX_REFRESH_TOKEN_EXPIRY_SECONDS
                ),
            });
        }

        Ok(config)
    }

    /// Access token lifetime, clamped to `1..=MAX_ACCESS_TOKEN_EXPIRY_SECONDS`
    pub fn access_token_ttl(&self) -> Duration {
        Duration::seconds(
            self.access_token_expiry_seconds
                .clamp(1, MAX_ACCESS_TOKEN_EXPIRY_SECONDS),
        )
    }

    /// Refresh credential lifetime, clamped to `1..=MAX_REFRESH_TOKEN_EXPIRY_SECONDS`
    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::seconds(
            self.refresh_token_expiry_seconds
                .clamp(1, MAX_REFRESH_TOKEN_EXPIRY_SECONDS),
        )
    }
}
