//! Fixtures shared by the token service tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;

use crate::domain::entities::family::FamilyRevocation;
use crate::domain::entities::token::RefreshCredential;
use crate::domain::entities::user::{Role, User};
use crate::errors::StoreError;
use crate::repositories::{InMemoryRefreshTokenStore, InMemoryUserRepository, RefreshTokenStore};
use crate::services::token::{
    generate_secret, hash_secret, JwtAccessTokenCodec, RotationEngine, TokenIssuer,
    TokenServiceConfig,
};

pub fn config() -> TokenServiceConfig {
    TokenServiceConfig {
        jwt_secret: "test-secret-key-for-token-services".to_string(),
        ..Default::default()
    }
}

pub fn codec() -> Arc<JwtAccessTokenCodec> {
    Arc::new(JwtAccessTokenCodec::new(&config()).unwrap())
}

pub struct Fixture {
    pub store: Arc<InMemoryRefreshTokenStore>,
    pub users: Arc<InMemoryUserRepository>,
    pub user: User,
    pub issuer: TokenIssuer<InMemoryRefreshTokenStore>,
    pub engine: RotationEngine<InMemoryRefreshTokenStore, InMemoryUserRepository>,
}

pub fn fixture() -> Fixture {
    let store = Arc::new(InMemoryRefreshTokenStore::new());
    let user = User::new("owner@example.com", Role::Admin);
    let users = Arc::new(InMemoryUserRepository::with_users([user.clone()]));

    Fixture {
        issuer: TokenIssuer::new(store.clone(), codec(), config()),
        engine: RotationEngine::new(store.clone(), users.clone(), codec(), config()),
        store,
        users,
        user,
    }
}

/// Store wrapper that reports a secret collision for the first `failures` writes
pub struct CollidingStore {
    pub inner: InMemoryRefreshTokenStore,
    remaining: AtomicU32,
    pub writes: AtomicU32,
}

impl CollidingStore {
    pub fn new(failures: u32) -> Self {
        Self {
            inner: InMemoryRefreshTokenStore::new(),
            remaining: AtomicU32::new(failures),
            writes: AtomicU32::new(0),
        }
    }

    fn collide(&self) -> bool {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl RefreshTokenStore for CollidingStore {
    async fn insert(&self, credential: RefreshCredential) -> Result<RefreshCredential, StoreError> {
        if self.collide() {
            return Err(StoreError::DuplicateSecret);
        }
        self.inner.insert(credential).await
    }

    async fn find_by_secret_hash(&self, secret_hash: &str) -> Result<Option<RefreshCredential>, StoreError> {
        self.inner.find_by_secret_hash(secret_hash).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshCredential>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<RefreshCredential>, StoreError> {
        self.inner.find_children(parent_id).await
    }

    async fn find_active_by_owner(&self, owner_id: Uuid) -> Result<Vec<RefreshCredential>, StoreError> {
        self.inner.find_active_by_owner(owner_id).await
    }

    async fn mark_used(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.mark_used(id).await
    }

    async fn consume_and_insert(
        &self,
        parent_id: Uuid,
        child: RefreshCredential,
    ) -> Result<RefreshCredential, StoreError> {
        if self.collide() {
            return Err(StoreError::DuplicateSecret);
        }
        self.inner.consume_and_insert(parent_id, child).await
    }

    async fn revoke(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.revoke(id).await
    }

    async fn revoke_all_for_owner(&self, owner_id: Uuid) -> Result<usize, StoreError> {
        self.inner.revoke_all_for_owner(owner_id).await
    }

    async fn revoke_family_tree(&self, root_id: Uuid) -> Result<FamilyRevocation, StoreError> {
        self.inner.revoke_family_tree(root_id).await
    }
}

/// What a competing request does between the engine's lookup and its write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interleave {
    /// Another rotation consumes the looked-up credential and inserts its child
    Rotate,
    /// A logout revokes the looked-up credential
    Revoke,
}

/// Store wrapper that lets one competing write land right after the next
/// `find_by_secret_hash`, while returning the snapshot read before it
pub struct InterleavingStore {
    pub inner: InMemoryRefreshTokenStore,
    pending: Mutex<Option<Interleave>>,
    winner: Mutex<Option<Uuid>>,
}

impl InterleavingStore {
    pub fn new(interleave: Interleave) -> Self {
        Self {
            inner: InMemoryRefreshTokenStore::new(),
            pending: Mutex::new(Some(interleave)),
            winner: Mutex::new(None),
        }
    }

    /// Child inserted by the competing rotation, if it ran
    pub fn winner_id(&self) -> Option<Uuid> {
        *self.winner.lock().unwrap()
    }
}

#[async_trait]
impl RefreshTokenStore for InterleavingStore {
    async fn insert(&self, credential: RefreshCredential) -> Result<RefreshCredential, StoreError> {
        self.inner.insert(credential).await
    }

    async fn find_by_secret_hash(&self, secret_hash: &str) -> Result<Option<RefreshCredential>, StoreError> {
        let snapshot = self.inner.find_by_secret_hash(secret_hash).await?;
        let pending = self.pending.lock().unwrap().take();

        if let (Some(interleave), Some(record)) = (pending, snapshot.as_ref()) {
            match interleave {
                Interleave::Rotate => {
                    let child = RefreshCredential::issue(
                        record.owner_id(),
                        hash_secret(&generate_secret()),
                        Some(record.id()),
                        Duration::days(1),
                    );
                    let child = self.inner.consume_and_insert(record.id(), child).await?;
                    *self.winner.lock().unwrap() = Some(child.id());
                }
                Interleave::Revoke => {
                    self.inner.revoke(record.id()).await?;
                }
            }
        }

        Ok(snapshot)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshCredential>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<RefreshCredential>, StoreError> {
        self.inner.find_children(parent_id).await
    }

    async fn find_active_by_owner(&self, owner_id: Uuid) -> Result<Vec<RefreshCredential>, StoreError> {
        self.inner.find_active_by_owner(owner_id).await
    }

    async fn mark_used(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.mark_used(id).await
    }

    async fn consume_and_insert(
        &self,
        parent_id: Uuid,
        child: RefreshCredential,
    ) -> Result<RefreshCredential, StoreError> {
        self.inner.consume_and_insert(parent_id, child).await
    }

    async fn revoke(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.revoke(id).await
    }

    async fn revoke_all_for_owner(&self, owner_id: Uuid) -> Result<usize, StoreError> {
        self.inner.revoke_all_for_owner(owner_id).await
    }

    async fn revoke_family_tree(&self, root_id: Uuid) -> Result<FamilyRevocation, StoreError> {
        self.inner.revoke_family_tree(root_id).await
    }
}

/// Store whose every call fails as if the database were down
pub struct DownStore;

#[async_trait]
impl RefreshTokenStore for DownStore {
    async fn insert(&self, _: RefreshCredential) -> Result<RefreshCredential, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn find_by_secret_hash(&self, _: &str) -> Result<Option<RefreshCredential>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn find_by_id(&self, _: Uuid) -> Result<Option<RefreshCredential>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn find_children(&self, _: Uuid) -> Result<Vec<RefreshCredential>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn find_active_by_owner(&self, _: Uuid) -> Result<Vec<RefreshCredential>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn mark_used(&self, _: Uuid) -> Result<bool, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn consume_and_insert(&self, _: Uuid, _: RefreshCredential) -> Result<RefreshCredential, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn revoke(&self, _: Uuid) -> Result<bool, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn revoke_all_for_owner(&self, _: Uuid) -> Result<usize, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn revoke_family_tree(&self, _: Uuid) -> Result<FamilyRevocation, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }
}
