//! Business services containing the session and token use cases.

pub mod session;
pub mod token;

// Re-export commonly used types
pub use session::SessionService;
pub use token::{
    AccessTokenCodec, FamilyRevocationService, JwtAccessTokenCodec, RotationEngine, TokenIssuer,
    TokenServiceConfig,
};
