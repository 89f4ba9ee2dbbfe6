//! Domain entities representing core business objects.

pub mod family;
pub mod token;
pub mod user;

// Re-export commonly used types
pub use family::{collect_descendants, FamilyRevocation};
pub use token::{
    Claims, IssuedTokens, RefreshCredential, ACCESS_TOKEN_EXPIRY_MINUTES, JWT_AUDIENCE,
    JWT_ISSUER, REFRESH_TOKEN_EXPIRY_DAYS,
};
pub use user::{Role, User};
