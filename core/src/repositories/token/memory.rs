//! In-memory implementation of RefreshTokenStore
//!
//! Every mutation happens under one write guard, which gives the same
//! atomicity the MySQL store gets from transactions. Used by tests and by
//! single-process development setups.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::family::{collect_descendants, FamilyRevocation};
use crate::domain::entities::token::RefreshCredential;
use crate::errors::StoreError;

use super::store_trait::RefreshTokenStore;

#[derive(Default)]
struct StoreState {
    records: HashMap<Uuid, RefreshCredential>,
    by_secret: HashMap<String, Uuid>,
    children: HashMap<Uuid, Vec<Uuid>>,
}

impl StoreState {
    fn put(&mut self, credential: RefreshCredential) {
        self.by_secret
            .insert(credential.secret_hash().to_string(), credential.id());
        if let Some(parent_id) = credential.parent_id() {
            self.children.entry(parent_id).or_default().push(credential.id());
        }
        self.records.insert(credential.id(), credential);
    }
}

/// Refresh-token store backed by hash maps behind a tokio `RwLock`
#[derive(Clone, Default)]
pub struct InMemoryRefreshTokenStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryRefreshTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, regardless of state
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn insert(&self, credential: RefreshCredential) -> Result<RefreshCredential, StoreError> {
        let mut state = self.state.write().await;

        if state.by_secret.contains_key(credential.secret_hash()) {
            return Err(StoreError::DuplicateSecret);
        }

        state.put(credential.clone());
        Ok(credential)
    }

    async fn find_by_secret_hash(&self, secret_hash: &str) -> Result<Option<RefreshCredential>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .by_secret
            .get(secret_hash)
            .and_then(|id| state.records.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshCredential>, StoreError> {
        let state = self.state.read().await;
        Ok(state.records.get(&id).cloned())
    }

    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<RefreshCredential>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .children
            .get(&parent_id)
            .map(|ids| ids.iter().filter_map(|id| state.records.get(id)).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_active_by_owner(&self, owner_id: Uuid) -> Result<Vec<RefreshCredential>, StoreError> {
        let state = self.state.read().await;
        let now = Utc::now();
        let mut active: Vec<RefreshCredential> = state
            .records
            .values()
            .filter(|c| c.owner_id() == owner_id && c.is_usable_at(now))
            .cloned()
            .collect();
        active.sort_by_key(|c| std::cmp::Reverse(c.created_at()));
        Ok(active)
    }

    async fn mark_used(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let credential = state
            .records
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        Ok(credential.mark_used())
    }

    async fn consume_and_insert(
        &self,
        parent_id: Uuid,
        child: RefreshCredential,
    ) -> Result<RefreshCredential, StoreError> {
        let mut state = self.state.write().await;

        // Reject a colliding child before touching the parent so a retry can reuse it
        if state.by_secret.contains_key(child.secret_hash()) {
            return Err(StoreError::DuplicateSecret);
        }

        let parent = state
            .records
            .get_mut(&parent_id)
            .ok_or_else(|| StoreError::NotFound { id: parent_id.to_string() })?;
        if parent.is_revoked() {
            return Err(StoreError::Revoked);
        }
        if !parent.mark_used() {
            return Err(StoreError::AlreadyConsumed);
        }

        state.put(child.clone());
        Ok(child)
    }

    async fn revoke(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        Ok(state
            .records
            .get_mut(&id)
            .map(|credential| credential.revoke())
            .unwrap_or(false))
    }

    async fn revoke_all_for_owner(&self, owner_id: Uuid) -> Result<usize, StoreError> {
        let mut state = self.state.write().await;
        let mut count = 0;
        for credential in state.records.values_mut() {
            if credential.owner_id() == owner_id && credential.revoke() {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn revoke_family_tree(&self, root_id: Uuid) -> Result<FamilyRevocation, StoreError> {
        let mut state = self.state.write().await;

        if !state.records.contains_key(&root_id) {
            return Err(StoreError::NotFound { id: root_id.to_string() });
        }

        let member_ids = collect_descendants(root_id, &state.children);
        let mut newly_revoked = 0;
        for id in &member_ids {
            if let Some(credential) = state.records.get_mut(id) {
                if credential.revoke() {
                    newly_revoked += 1;
                }
            }
        }

        Ok(FamilyRevocation {
            root_id,
            member_ids,
            newly_revoked,
        })
    }
}
