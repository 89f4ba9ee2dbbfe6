//! MySQL implementations of the core repository traits

mod refresh_token_store;
mod user_repository;

pub use refresh_token_store::MySqlRefreshTokenStore;
pub use user_repository::MySqlUserRepository;
