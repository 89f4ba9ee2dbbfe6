//! Domain-specific error types and error handling.

mod types;


pub use types::{
    AuthError, RotationError, StoreError, TokenError, INVALID_REFRESH_TOKEN_MESSAGE,
};

use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Rotation(#[from] RotationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DomainError {
    /// Whether the failure came from storage being unreachable rather than from a rejection
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DomainError::Store(StoreError::Unavailable { .. })
                | DomainError::Rotation(RotationError::Unavailable { .. })
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
