//! Family revocation: revoke every credential descended from one login.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::domain::entities::family::FamilyRevocation;
use crate::errors::StoreError;
use crate::repositories::RefreshTokenStore;

/// Revokes whole rotation families
pub struct FamilyRevocationService<S: RefreshTokenStore> {
    store: Arc<S>,
}

impl<S: RefreshTokenStore> FamilyRevocationService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Revokes the family containing `member_id`
    ///
    /// Resolves the root, then asks the store to revoke the root and all of
    /// its descendants in one atomic step. Calling it again on a revoked
    /// family succeeds with `newly_revoked == 0`.
    ///
    /// # Returns
    ///
    /// * `Ok(FamilyRevocation)` - Root, members and newly revoked count
    /// * `Err(StoreError::NotFound)` - `member_id` is unknown
    pub async fn revoke_family(&self, member_id: Uuid) -> Result<FamilyRevocation, StoreError> {
        let root_id = self.resolve_root(member_id).await?;
        let report = self.store.revoke_family_tree(root_id).await?;

        warn!(
            target: "auth.token.revoked",
            member_id = %member_id,
            root_id = %report.root_id,
            family_size = report.size(),
            newly_revoked = report.newly_revoked,
            "Refresh token family revoked"
        );

        Ok(report)
    }

    /// Follows `parent_id` links back to the family root
    ///
    /// A dangling parent link or a cycle stops the walk at the last record reached.
    pub async fn resolve_root(&self, member_id: Uuid) -> Result<Uuid, StoreError> {
        let mut current = self
            .store
            .find_by_id(member_id)
            .await?
            .ok_or_else(|| StoreError::NotFound { id: member_id.to_string() })?;
        let mut visited = HashSet::from([current.id()]);

        while let Some(parent_id) = current.parent_id() {
            if !visited.insert(parent_id) {
                break;
            }
            match self.store.find_by_id(parent_id).await? {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Ok(current.id())
    }
}
