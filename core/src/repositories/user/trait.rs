//! User repository trait defining the interface for account lookups.
//!
//! Rotation only needs to read the owner of a credential: its role goes into
//! the fresh access token and a blocked account stops the rotation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::user::User;
use crate::errors::DomainError;

/// Repository trait for User entity persistence operations
///
/// # Example
/// ```no_run
/// # use uuid::Uuid;
/// # use rotor_core::repositories::UserRepository;
/// # async fn example(repo: &impl UserRepository, id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// match repo.find_by_id(id).await? {
///     Some(user) => println!("role: {}", user.role),
///     None => println!("User not found"),
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their unique identifier
    ///
    /// # Returns
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - No user with the given id
    /// * `Err(DomainError)` - Database or other error occurred
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;

    /// Find a user by email address
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Persist a new user
    ///
    /// # Returns
    /// * `Ok(User)` - The stored user
    /// * `Err(DomainError::Validation)` - The email is already registered
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Replace an existing user's stored state
    ///
    /// # Returns
    /// * `Err(DomainError::NotFound)` - No user with that id
    async fn update(&self, user: User) -> Result<User, DomainError>;
}
