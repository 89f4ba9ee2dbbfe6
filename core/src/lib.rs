//! # Rotor Core
//!
//! Core domain layer for refresh-token rotation.
//! This crate contains the credential entities, the rotation state machine
//! with reuse detection, family revocation, repository interfaces and the
//! error types the other layers build on.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
