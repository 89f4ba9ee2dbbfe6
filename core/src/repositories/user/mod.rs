#[path = "trait.rs"]
mod user_trait;
mod memory;

pub use memory::InMemoryUserRepository;
pub use user_trait::UserRepository;
