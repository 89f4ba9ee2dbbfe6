#[path = "trait.rs"]
mod store_trait;
mod memory;

pub use memory::InMemoryRefreshTokenStore;
pub use store_trait::RefreshTokenStore;
