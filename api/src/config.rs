//! API process configuration: application settings plus store selection

use std::env;
use std::str::FromStr;

use rotor_shared::config::AppConfig;
use serde::{Deserialize, Serialize};

use crate::app::AppOptions;

/// Where refresh credentials and users are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// MySQL via `rotor_infra`
    Mysql,
    /// Process-local maps; state is lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" => Ok(StoreBackend::Mysql),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub store: StoreBackend,
    /// Mount `POST /api/v1/auth/dev-login`; never honored in production
    pub dev_login: bool,
    /// Email of a user created at startup in the in-memory user store
    pub dev_seed_user_email: Option<String>,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// `SESSION_STORE` selects the backend (`mysql` or `memory`); production
    /// defaults to MySQL, every other environment to memory. `DEV_LOGIN` and
    /// `DEV_SEED_USER_EMAIL` are ignored in production.
    pub fn from_env() -> Result<Self, String> {
        let app = AppConfig::from_env();
        let production = app.environment.is_production();
        let store = match env::var("SESSION_STORE") {
            Ok(value) => value.parse()?,
            Err(_) if production => StoreBackend::Mysql,
            Err(_) => StoreBackend::Memory,
        };
        let dev_login = !production
            && env::var("DEV_LOGIN")
                .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false);
        let dev_seed_user_email = env::var("DEV_SEED_USER_EMAIL")
            .ok()
            .filter(|email| !production && !email.trim().is_empty());

        Ok(Config {
            app,
            store,
            dev_login,
            dev_seed_user_email,
        })
    }

    /// Options for the application factory
    pub fn app_options(&self) -> AppOptions {
        AppOptions {
            dev_login: self.dev_login && !self.is_production(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.app.environment.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parsing() {
        assert_eq!("mysql".parse::<StoreBackend>().unwrap(), StoreBackend::Mysql);
        assert_eq!("MEMORY".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("in-memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_dev_login_is_never_enabled_in_production() {
        let mut config = Config {
            app: AppConfig::default(),
            store: StoreBackend::Memory,
            dev_login: true,
            dev_seed_user_email: None,
        };
        assert!(config.app_options().dev_login);

        config.app.environment = rotor_shared::Environment::Production;
        assert!(!config.app_options().dev_login);
    }
}
