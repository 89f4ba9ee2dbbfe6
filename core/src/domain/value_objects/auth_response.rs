//! Authentication response value object for API responses.

use serde::{Deserialize, Serialize};

use crate::domain::entities::token::IssuedTokens;

/// Authentication response returned after login or a successful rotation
///
/// Carries only what the client may see: the internal credential record
/// (id, parent link, flags) never leaves the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    /// JWT access token for API authentication
    pub access_token: String,

    /// Opaque refresh token, single use
    pub refresh_token: String,

    /// Access token expiration time in seconds
    pub expires_in: i64,
}

impl AuthResponse {
    /// Creates a new authentication response
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
        }
    }
}

impl From<IssuedTokens> for AuthResponse {
    fn from(issued: IssuedTokens) -> Self {
        Self::new(issued.access_token, issued.refresh_token, issued.expires_in)
    }
}
