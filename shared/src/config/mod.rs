//! Configuration module with business-specific sub-modules
//!
//! - `auth` - JWT signing and refresh-token rotation
//! - `database` - Database connection and pool configuration
//! - `environment` - Environment detection and logging configuration
//! - `server` - HTTP server configuration

pub mod auth;
pub mod database;
pub mod environment;
pub mod server;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use auth::{AuthConfig, JwtConfig, RotationConfig};
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use server::ServerConfig;

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// `RUST_LOG`, when set, overrides the environment's default log level.
    pub fn from_env() -> Self {
        let environment = Environment::from_env();
        let mut logging = LoggingConfig::for_environment(environment);
        if let Ok(level) = std::env::var("RUST_LOG") {
            logging.level = level;
        }

        Self {
            environment,
            server: ServerConfig::from_env(),
            database: DatabaseConfig::from_env(),
            auth: AuthConfig::from_env(),
            logging,
        }
    }

    /// Returns a human-readable warning for settings that are unsafe outside development
    pub fn security_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.environment.is_development() && self.auth.jwt.is_using_default_secret() {
            warnings.push(format!(
                "JWT_SECRET is not set; the built-in development secret is in use in {}",
                self.environment
            ));
        }
        if self.auth.rotation.max_issue_attempts == 0 {
            warnings.push("REFRESH_MAX_ISSUE_ATTEMPTS is 0; issuance falls back to a single attempt".to_string());
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_no_warnings_in_development() {
        let config = AppConfig::default();
        assert!(config.environment.is_development());
        assert!(config.security_warnings().is_empty());
    }

    #[test]
    fn test_default_secret_warns_in_production() {
        let config = AppConfig {
            environment: Environment::Production,
            ..Default::default()
        };
        let warnings = config.security_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("JWT_SECRET"));
    }
}
