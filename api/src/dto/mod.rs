pub mod auth;

pub use auth::{DevLoginRequest, RefreshTokenRequest, TokenResponse};
pub use rotor_shared::ErrorResponse;
