//! Error types for authentication, token handling, rotation and storage
//!
//! Client-facing wording is decided by the presentation layer; the variants
//! here carry what the core knows, and `RotationError::client_message`
//! provides the single message every security rejection collapses to.

use thiserror::Error;

/// Message returned to clients for every rejected refresh token
pub const INVALID_REFRESH_TOKEN_MESSAGE: &str = "refresh token is not valid";

/// Authentication-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("User blocked")]
    UserBlocked,
}

/// Access-token codec and issuance errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token format")]
    InvalidTokenFormat,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token not yet valid")]
    TokenNotYetValid,

    #[error("Invalid claims")]
    InvalidClaims,

    #[error("Token generation failed")]
    TokenGenerationFailed,

    /// Repeated secret collisions; the random source is degraded
    #[error("Refresh secret collided {attempts} times in a row")]
    SecretCollision { attempts: u32 },
}

/// Why a presented refresh token was not rotated
///
/// The first four variants are security rejections and must all reach the
/// client as the same message. `Unavailable` is an infrastructure failure the
/// caller may retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RotationError {
    #[error("Refresh token not found")]
    NotFound,

    #[error("Refresh token expired")]
    Expired,

    #[error("Refresh token revoked")]
    Revoked,

    #[error("Refresh token reuse detected")]
    ReuseDetected,

    #[error("Token storage unavailable: {message}")]
    Unavailable { message: String },
}

impl RotationError {
    /// Whether this is one of the rejections that must look identical to clients
    pub fn is_security_rejection(&self) -> bool {
        !matches!(self, RotationError::Unavailable { .. })
    }

    /// Message safe to return to the client
    pub fn client_message(&self) -> &'static str {
        match self {
            RotationError::Unavailable { .. } => "service temporarily unavailable",
            _ => INVALID_REFRESH_TOKEN_MESSAGE,
        }
    }

    /// Stable label for logs and metrics; never sent to clients
    pub fn kind(&self) -> &'static str {
        match self {
            RotationError::NotFound => "not_found",
            RotationError::Expired => "expired",
            RotationError::Revoked => "revoked",
            RotationError::ReuseDetected => "reuse_detected",
            RotationError::Unavailable { .. } => "unavailable",
        }
    }
}

/// Refresh-token store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Unique constraint on the secret hash rejected the insert
    #[error("Duplicate refresh secret")]
    DuplicateSecret,

    /// Conditional consume found the credential already used
    #[error("Refresh token already consumed")]
    AlreadyConsumed,

    /// Conditional consume found the credential revoked
    #[error("Refresh token revoked")]
    Revoked,

    #[error("Refresh token record not found: {id}")]
    NotFound { id: String },

    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    /// Shorthand for wrapping a backend failure
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        StoreError::Unavailable {
            message: message.to_string(),
        }
    }
}

impl From<StoreError> for RotationError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::AlreadyConsumed => RotationError::ReuseDetected,
            StoreError::Revoked => RotationError::Revoked,
            StoreError::NotFound { .. } => RotationError::NotFound,
            other => RotationError::Unavailable {
                message: other.to_string(),
            },
        }
    }
}
