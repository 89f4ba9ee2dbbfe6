//! Rotation engine: the refresh-token state machine.
//!
//! A presented secret is checked in this order:
//!
//! 1. unknown secret -> `NotFound`
//! 2. `now >= expires_at` -> `Expired`
//! 3. revoked -> `Revoked`
//! 4. already used -> reuse: the family is revoked, then `ReuseDetected`
//! 5. otherwise the credential is consumed and a child issued atomically
//!
//! Losing the consume race in step 5 is treated exactly like step 4.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::domain::entities::token::{IssuedTokens, RefreshCredential};
use crate::errors::{DomainError, RotationError, StoreError};
use crate::repositories::{RefreshTokenStore, UserRepository};

use super::codec::AccessTokenCodec;
use super::config::TokenServiceConfig;
use super::family::FamilyRevocationService;
use super::issuer::TokenIssuer;
use super::secret::hash_secret;

/// Validates presented refresh secrets and rotates them
pub struct RotationEngine<S: RefreshTokenStore, U: UserRepository> {
    store: Arc<S>,
    users: Arc<U>,
    issuer: TokenIssuer<S>,
    family: FamilyRevocationService<S>,
}

impl<S: RefreshTokenStore, U: UserRepository> RotationEngine<S, U> {
    pub fn new(
        store: Arc<S>,
        users: Arc<U>,
        codec: Arc<dyn AccessTokenCodec>,
        config: TokenServiceConfig,
    ) -> Self {
        Self {
            issuer: TokenIssuer::new(store.clone(), codec, config),
            family: FamilyRevocationService::new(store.clone()),
            store,
            users,
        }
    }

    /// Rotates a presented refresh secret
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedTokens)` - New pair; the presented credential is now used
    /// * `Err(RotationError)` - Rejection or storage failure; nothing was issued
    pub async fn rotate(&self, presented_secret: &str) -> Result<IssuedTokens, RotationError> {
        let record = self
            .store
            .find_by_secret_hash(&hash_secret(presented_secret))
            .await?;

        let Some(record) = record else {
            return Err(reject(RotationError::NotFound, None));
        };

        if record.is_expired_at(Utc::now()) {
            return Err(reject(RotationError::Expired, Some(&record)));
        }
        if record.is_revoked() {
            return Err(reject(RotationError::Revoked, Some(&record)));
        }
        if record.is_used() {
            return Err(self.handle_reuse(&record).await);
        }

        let user = self
            .users
            .find_by_id(record.owner_id())
            .await
            .map_err(|e| RotationError::Unavailable { message: e.to_string() })?;

        let user = match user {
            Some(user) if user.can_authenticate() => user,
            Some(_) => {
                let revoked = self.store.revoke_all_for_owner(record.owner_id()).await?;
                warn!(
                    target: "auth.token.revoked",
                    user_id = %record.owner_id(),
                    revoked,
                    "Blocked user presented a refresh token; all credentials revoked"
                );
                return Err(reject(RotationError::Revoked, Some(&record)));
            }
            None => return Err(reject(RotationError::NotFound, Some(&record))),
        };

        match self.issuer.issue(user.id, user.role, Some(record.id())).await {
            Ok(issued) => {
                info!(
                    target: "auth.token.refresh",
                    user_id = %user.id,
                    parent_id = %record.id(),
                    credential_id = %issued.credential.id(),
                    "Refresh token rotated"
                );
                Ok(issued)
            }
            Err(DomainError::Store(StoreError::AlreadyConsumed)) => Err(self.handle_reuse(&record).await),
            Err(DomainError::Store(e)) => {
                let error = RotationError::from(e);
                if error.is_security_rejection() {
                    Err(reject(error, Some(&record)))
                } else {
                    Err(error)
                }
            }
            Err(e) => Err(RotationError::Unavailable { message: e.to_string() }),
        }
    }

    /// Reuse branch: revoke the family, then report `ReuseDetected`
    ///
    /// If the revocation itself cannot be written the caller gets
    /// `Unavailable`; a retry with the same secret lands here again.
    async fn handle_reuse(&self, record: &RefreshCredential) -> RotationError {
        match self.family.revoke_family(record.id()).await {
            Ok(report) => {
                error!(
                    target: "auth.token.reuse_detected",
                    user_id = %record.owner_id(),
                    credential_id = %record.id(),
                    root_id = %report.root_id,
                    family_size = report.size(),
                    newly_revoked = report.newly_revoked,
                    "Refresh token reuse detected; family revoked"
                );
                RotationError::ReuseDetected
            }
            Err(e) => {
                error!(
                    target: "auth.token.reuse_detected",
                    user_id = %record.owner_id(),
                    credential_id = %record.id(),
                    error = %e,
                    "Refresh token reuse detected but family revocation failed"
                );
                RotationError::Unavailable { message: e.to_string() }
            }
        }
    }
}

fn reject(error: RotationError, record: Option<&RefreshCredential>) -> RotationError {
    match record {
        Some(record) => warn!(
            target: "auth.token.invalid",
            reason = error.kind(),
            user_id = %record.owner_id(),
            credential_id = %record.id(),
            "Refresh token rejected"
        ),
        None => warn!(target: "auth.token.invalid", reason = error.kind(), "Refresh token rejected"),
    }
    error
}
