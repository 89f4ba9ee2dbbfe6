//! Tests for token service configuration

use std::sync::Arc;

use rotor_shared::config::AuthConfig;

use super::support::{codec, config};
use crate::domain::entities::user::{Role, User};
use crate::errors::DomainError;
use crate::repositories::{InMemoryRefreshTokenStore, InMemoryUserRepository, UserRepository};
use crate::services::session::SessionService;
use crate::services::token::{
    TokenIssuer, TokenServiceConfig, MAX_ACCESS_TOKEN_EXPIRY_SECONDS,
    MAX_REFRESH_TOKEN_EXPIRY_SECONDS,
};

#[test]
fn test_defaults_are_accepted() {
    let config = TokenServiceConfig::from_auth_config(&AuthConfig::default()).unwrap();

    assert_eq!(config.access_token_ttl().num_seconds(), config.access_token_expiry_seconds);
    assert_eq!(config.refresh_token_ttl().num_seconds(), config.refresh_token_expiry_seconds);
    assert!(config.max_issue_attempts >= 1);
}

#[test]
fn test_non_positive_lifetime_is_rejected() {
    let mut auth = AuthConfig::default();
    auth.jwt.access_token_expiry = 0;

    assert!(matches!(
        TokenServiceConfig::from_auth_config(&auth),
        Err(DomainError::Validation { .. })
    ));
}

#[test]
fn test_oversized_refresh_lifetime_is_rejected() {
    let mut auth = AuthConfig::default();
    auth.jwt.refresh_token_expiry = 10_000_000_000_000;

    assert!(matches!(
        TokenServiceConfig::from_auth_config(&auth),
        Err(DomainError::Validation { .. })
    ));

    auth.jwt.refresh_token_expiry = MAX_REFRESH_TOKEN_EXPIRY_SECONDS;
    assert!(TokenServiceConfig::from_auth_config(&auth).is_ok());
}

#[test]
fn test_oversized_access_lifetime_is_rejected() {
    let mut auth = AuthConfig::default();
    auth.jwt.access_token_expiry = i64::MAX;

    assert!(matches!(
        TokenServiceConfig::from_auth_config(&auth),
        Err(DomainError::Validation { .. })
    ));

    auth.jwt.access_token_expiry = MAX_ACCESS_TOKEN_EXPIRY_SECONDS + 1;
    assert!(TokenServiceConfig::from_auth_config(&auth).is_err());
}

#[test]
fn test_unknown_algorithm_is_rejected() {
    let mut auth = AuthConfig::default();
    auth.jwt.algorithm = "HS1024".to_string();

    assert!(TokenServiceConfig::from_auth_config(&auth).is_err());
}

#[tokio::test]
async fn test_hand_built_huge_lifetimes_are_clamped() {
    let huge = TokenServiceConfig {
        access_token_expiry_seconds: i64::MAX,
        refresh_token_expiry_seconds: 10_000_000_000_000,
        ..config()
    };
    assert_eq!(huge.refresh_token_ttl().num_seconds(), MAX_REFRESH_TOKEN_EXPIRY_SECONDS);

    let store = Arc::new(InMemoryRefreshTokenStore::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let user = users
        .create(User::new("long@example.com", Role::User))
        .await
        .unwrap();
    let sessions = SessionService::new(store.clone(), users, codec(), huge.clone());

    let response = sessions.login(user.id).await.unwrap();

    assert_eq!(response.expires_in, MAX_ACCESS_TOKEN_EXPIRY_SECONDS);
    let issued = TokenIssuer::new(store, codec(), huge)
        .issue(user.id, Role::User, None)
        .await
        .unwrap();
    let lifetime = issued.credential.expires_at() - issued.credential.created_at();
    assert_eq!(lifetime.num_seconds(), MAX_REFRESH_TOKEN_EXPIRY_SECONDS);
}
