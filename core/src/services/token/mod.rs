//! Token services for refresh-token rotation
//!
//! This module handles:
//! - Access token signing and verification (`AccessTokenCodec`)
//! - Refresh secret generation and hashing
//! - Issuance of credential pairs (`TokenIssuer`)
//! - The rotation state machine with reuse detection (`RotationEngine`)
//! - Cascading revocation of rotation families (`FamilyRevocationService`)

mod codec;
mod config;
mod family;
mod issuer;
mod rotation;
mod secret;

#[cfg(test)]
mod tests;

pub use codec::{AccessTokenCodec, JwtAccessTokenCodec};
pub use config::{
    TokenServiceConfig, MAX_ACCESS_TOKEN_EXPIRY_SECONDS, MAX_REFRESH_TOKEN_EXPIRY_SECONDS,
};
pub use family::FamilyRevocationService;
pub use issuer::TokenIssuer;
pub use rotation::RotationEngine;
pub use secret::{generate_secret, hash_secret, SECRET_BYTES};
