//! Refresh-token store trait defining the persistence contract for rotation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::family::FamilyRevocation;
use crate::domain::entities::token::RefreshCredential;
use crate::errors::StoreError;

/// Persistence contract for refresh credentials
///
/// Records are keyed by id and by the hash of their secret, and indexed by
/// owner and by parent. Implementations must honor two atomicity rules:
///
/// - [`consume_and_insert`](Self::consume_and_insert) flips the parent's
///   `used` flag conditionally and inserts the child in the same transaction
///   or lock scope.
/// - [`revoke_family_tree`](Self::revoke_family_tree) collects and revokes a
///   whole subtree in one transaction or lock scope, so no reader ever sees a
///   partially revoked family.
///
/// # Security Considerations
/// - Only secret hashes are stored; raw secrets never reach the store
/// - Records are never physically deleted here; retention is an external job
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Insert a new credential
    ///
    /// # Returns
    /// * `Ok(RefreshCredential)` - The stored record
    /// * `Err(StoreError::DuplicateSecret)` - The secret hash already exists
    /// * `Err(StoreError::Unavailable)` - Backend failure
    ///
    /// # Example
    /// ```no_run
    /// # use chrono::Duration;
    /// # use uuid::Uuid;
    /// # use rotor_core::repositories::RefreshTokenStore;
    /// # use rotor_core::domain::entities::token::RefreshCredential;
    /// # async fn example(store: &impl RefreshTokenStore) -> Result<(), Box<dyn std::error::Error>> {
    /// let root = RefreshCredential::issue(Uuid::new_v4(), "sha256-hex".to_string(), None, Duration::days(7));
    /// let saved = store.insert(root).await?;
    /// println!("stored credential {}", saved.id());
    /// # Ok(())
    /// # }
    /// ```
    async fn insert(&self, credential: RefreshCredential) -> Result<RefreshCredential, StoreError>;

    /// Find a credential by the hash of its secret
    ///
    /// # Returns
    /// * `Ok(Some(RefreshCredential))` - Credential found
    /// * `Ok(None)` - No credential with that hash
    /// * `Err(StoreError)` - Backend failure
    async fn find_by_secret_hash(&self, secret_hash: &str) -> Result<Option<RefreshCredential>, StoreError>;

    /// Find a credential by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshCredential>, StoreError>;

    /// Credentials rotated directly from `parent_id`
    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<RefreshCredential>, StoreError>;

    /// Usable (unused, unrevoked, unexpired) credentials owned by a user
    async fn find_active_by_owner(&self, owner_id: Uuid) -> Result<Vec<RefreshCredential>, StoreError>;

    /// Conditionally mark a credential used
    ///
    /// Equivalent to `UPDATE ... SET used = true WHERE id = ? AND used = false
    /// AND revoked = false`.
    ///
    /// # Returns
    /// * `Ok(true)` - This call consumed the credential
    /// * `Ok(false)` - It was already used or revoked (another caller won)
    /// * `Err(StoreError::NotFound)` - Unknown id
    async fn mark_used(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Atomically consume `parent_id` and insert `child`
    ///
    /// Either both effects commit or neither does.
    ///
    /// # Returns
    /// * `Ok(RefreshCredential)` - The stored child
    /// * `Err(StoreError::AlreadyConsumed)` - Parent was already used
    /// * `Err(StoreError::Revoked)` - Parent was revoked
    /// * `Err(StoreError::DuplicateSecret)` - Child secret collided; parent untouched
    /// * `Err(StoreError::NotFound)` - Unknown parent
    async fn consume_and_insert(
        &self,
        parent_id: Uuid,
        child: RefreshCredential,
    ) -> Result<RefreshCredential, StoreError>;

    /// Revoke a single credential
    ///
    /// # Returns
    /// * `Ok(true)` - Credential was revoked by this call
    /// * `Ok(false)` - Already revoked, or not found
    async fn revoke(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Revoke every credential owned by a user (logout everywhere, password change)
    ///
    /// # Returns
    /// Number of credentials newly revoked
    async fn revoke_all_for_owner(&self, owner_id: Uuid) -> Result<usize, StoreError>;

    /// Revoke `root_id` and all of its descendants as one atomic step
    ///
    /// # Returns
    /// * `Ok(FamilyRevocation)` - Members found and how many were newly revoked
    /// * `Err(StoreError::NotFound)` - Unknown root
    async fn revoke_family_tree(&self, root_id: Uuid) -> Result<FamilyRevocation, StoreError>;

    /// Count usable credentials for a user
    async fn count_active_by_owner(&self, owner_id: Uuid) -> Result<usize, StoreError> {
        Ok(self.find_active_by_owner(owner_id).await?.len())
    }
}
