//! Session service implementation

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::entities::token::Claims;
use crate::domain::value_objects::AuthResponse;
use crate::errors::{AuthError, DomainError, DomainResult, RotationError, StoreError};
use crate::repositories::{RefreshTokenStore, UserRepository};
use crate::services::token::{
    hash_secret, AccessTokenCodec, FamilyRevocationService, RotationEngine, TokenIssuer,
    TokenServiceConfig,
};

/// Session lifecycle for the HTTP layer
///
/// Password and identity checks happen before `login` is called; this
/// service only manages the credentials of an already authenticated user.
pub struct SessionService<S: RefreshTokenStore, U: UserRepository> {
    store: Arc<S>,
    users: Arc<U>,
    codec: Arc<dyn AccessTokenCodec>,
    issuer: TokenIssuer<S>,
    engine: RotationEngine<S, U>,
    family: FamilyRevocationService<S>,
}

impl<S: RefreshTokenStore, U: UserRepository> SessionService<S, U> {
    /// Create a new session service
    ///
    /// # Arguments
    ///
    /// * `store` - Refresh credential persistence
    /// * `users` - Account lookups for roles and blocked status
    /// * `codec` - Access token signer/verifier
    /// * `config` - Token lifetimes and issuance settings
    pub fn new(
        store: Arc<S>,
        users: Arc<U>,
        codec: Arc<dyn AccessTokenCodec>,
        config: TokenServiceConfig,
    ) -> Self {
        Self {
            issuer: TokenIssuer::new(store.clone(), codec.clone(), config.clone()),
            engine: RotationEngine::new(store.clone(), users.clone(), codec.clone(), config),
            family: FamilyRevocationService::new(store.clone()),
            store,
            users,
            codec,
        }
    }

    /// Starts a new session: a fresh family root plus access token
    ///
    /// # Returns
    ///
    /// * `Ok(AuthResponse)` - Tokens for the client
    /// * `Err(DomainError::Auth(AuthenticationFailed))` - User missing or blocked
    pub async fn login(&self, user_id: Uuid) -> DomainResult<AuthResponse> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .filter(|user| user.can_authenticate())
            .ok_or(AuthError::AuthenticationFailed)?;

        let issued = self.issuer.issue(user.id, user.role, None).await?;

        info!(
            user_id = %user.id,
            credential_id = %issued.credential.id(),
            "Session started"
        );

        Ok(issued.into())
    }

    /// Rotates a refresh token
    ///
    /// # Example
    ///
    /// ```ignore
    /// match sessions.refresh(&presented).await {
    ///     Ok(tokens) => respond_ok(tokens),
    ///     Err(e) if e.is_security_rejection() => respond_unauthorized(e.client_message()),
    ///     Err(e) => respond_unavailable(e),
    /// }
    /// ```
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, RotationError> {
        self.engine.rotate(refresh_token).await.map(AuthResponse::from)
    }

    /// Ends the session the refresh token belongs to by revoking its family
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The family was revoked
    /// * `Ok(false)` - The token is unknown; nothing to do
    pub async fn logout(&self, refresh_token: &str) -> DomainResult<bool> {
        let Some(record) = self.store.find_by_secret_hash(&hash_secret(refresh_token)).await? else {
            return Ok(false);
        };

        match self.family.revoke_family(record.id()).await {
            Ok(report) => {
                info!(
                    user_id = %record.owner_id(),
                    root_id = %report.root_id,
                    newly_revoked = report.newly_revoked,
                    "Session ended"
                );
                Ok(true)
            }
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Revokes every refresh credential the user owns
    ///
    /// # Returns
    ///
    /// Number of credentials newly revoked
    pub async fn logout_all(&self, user_id: Uuid) -> DomainResult<usize> {
        let revoked = self.store.revoke_all_for_owner(user_id).await?;
        info!(user_id = %user_id, revoked, "All sessions ended");
        Ok(revoked)
    }

    /// Verifies an access token and returns its claims
    pub fn verify_access_token(&self, token: &str) -> DomainResult<Claims> {
        self.codec.decode(token).map_err(DomainError::from)
    }

    /// Number of usable refresh credentials the user holds
    pub async fn active_session_count(&self, user_id: Uuid) -> DomainResult<usize> {
        Ok(self.store.count_active_by_owner(user_id).await?)
    }
}
