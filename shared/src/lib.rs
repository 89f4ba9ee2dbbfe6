//! Shared configuration and response types for the Rotor server
//!
//! This crate provides functionality used across all server modules:
//! - Configuration types (server, database, JWT, logging)
//! - Error response structures returned by the HTTP layer

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, DatabaseConfig, Environment, JwtConfig, LogFormat, LoggingConfig,
    ServerConfig,
};
pub use errors::{error_codes, ErrorResponse};
