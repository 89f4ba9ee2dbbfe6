//! Issues (access token, refresh credential) pairs.

use std::sync::Arc;

use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::domain::entities::token::{IssuedTokens, RefreshCredential};
use crate::domain::entities::user::Role;
use crate::errors::{DomainError, StoreError, TokenError};
use crate::repositories::RefreshTokenStore;

use super::codec::AccessTokenCodec;
use super::config::TokenServiceConfig;
use super::secret::{generate_secret, hash_secret};

/// Creates credential pairs at login and on successful rotation
pub struct TokenIssuer<S: RefreshTokenStore> {
    store: Arc<S>,
    codec: Arc<dyn AccessTokenCodec>,
    config: TokenServiceConfig,
}

impl<S: RefreshTokenStore> TokenIssuer<S> {
    pub fn new(store: Arc<S>, codec: Arc<dyn AccessTokenCodec>, config: TokenServiceConfig) -> Self {
        Self { store, codec, config }
    }

    /// Issues a fresh pair for `user_id`
    ///
    /// With `parent_id = None` a new family root is inserted. With a parent,
    /// the parent is consumed and the child inserted in one atomic store call,
    /// so the parent's `used` flag and the child's existence commit together.
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedTokens)` - Signed access token, raw refresh secret and stored record
    /// * `Err(DomainError::Token(SecretCollision))` - Every attempt collided
    /// * `Err(DomainError::Store(_))` - Any other store outcome, unchanged
    ///   (`AlreadyConsumed` and `Revoked` tell the rotation engine it lost a race)
    pub async fn issue(
        &self,
        user_id: Uuid,
        role: Role,
        parent_id: Option<Uuid>,
    ) -> Result<IssuedTokens, DomainError> {
        // Signed before anything is persisted so a codec failure never consumes the parent
        let access_token = self.codec.encode(user_id, role, self.config.access_token_ttl())?;
        let attempts = self.config.max_issue_attempts.max(1);

        for attempt in 1..=attempts {
            let secret = generate_secret();
            let credential = RefreshCredential::issue(
                user_id,
                hash_secret(&secret),
                parent_id,
                self.config.refresh_token_ttl(),
            );

            let stored = match parent_id {
                None => self.store.insert(credential).await,
                Some(parent_id) => self.store.consume_and_insert(parent_id, credential).await,
            };

            match stored {
                Ok(credential) => {
                    debug!(
                        user_id = %user_id,
                        credential_id = %credential.id(),
                        parent_id = ?parent_id,
                        "Issued refresh credential"
                    );
                    return Ok(IssuedTokens {
                        access_token,
                        refresh_token: secret,
                        expires_in: self.config.access_token_ttl().num_seconds(),
                        credential,
                    });
                }
                Err(StoreError::DuplicateSecret) => {
                    warn!(user_id = %user_id, attempt, "Refresh secret collided, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        error!(
            user_id = %user_id,
            attempts,
            "Refresh secret collided on every attempt; random source may be degraded"
        );
        Err(TokenError::SecretCollision { attempts }.into())
    }
}
