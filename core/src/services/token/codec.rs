//! Access-token codec: signs and verifies the short-lived bearer credential.

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::domain::entities::token::Claims;
use crate::domain::entities::user::Role;
use crate::errors::{DomainError, TokenError};

use super::config::TokenServiceConfig;

/// Produces and verifies signed access tokens.
///
/// The rotation core treats the encoded string as opaque.
pub trait AccessTokenCodec: Send + Sync {
    /// Signs a token for `user_id` carrying `role`, valid for `ttl`
    fn encode(&self, user_id: Uuid, role: Role, ttl: Duration) -> Result<String, TokenError>;

    /// Verifies signature and time claims, returning the payload
    fn decode(&self, token: &str) -> Result<Claims, TokenError>;
}

/// `AccessTokenCodec` backed by `jsonwebtoken` with a shared HMAC secret
pub struct JwtAccessTokenCodec {
    algorithm: Algorithm,
    issuer: String,
    audience: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAccessTokenCodec {
    /// Creates a codec from the token service configuration
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for non-HMAC algorithms or an empty secret.
    pub fn new(config: &TokenServiceConfig) -> Result<Self, DomainError> {
        if !matches!(config.algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(DomainError::Validation {
                message: format!("{:?} requires key files; only HMAC algorithms are supported", config.algorithm),
            });
        }
        if config.jwt_secret.is_empty() {
            return Err(DomainError::Validation {
                message: "JWT secret must not be empty".to_string(),
            });
        }

        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        Ok(Self {
            algorithm: config.algorithm,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        })
    }
}

impl AccessTokenCodec for JwtAccessTokenCodec {
    fn encode(&self, user_id: Uuid, role: Role, ttl: Duration) -> Result<String, TokenError> {
        let claims = Claims::new_access_token(user_id, role, ttl, &self.issuer, &self.audience);
        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|_| TokenError::TokenGenerationFailed)
    }

    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                ErrorKind::ImmatureSignature => TokenError::TokenNotYetValid,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => TokenError::InvalidClaims,
                _ => TokenError::InvalidTokenFormat,
            })
    }
}
