//! Rotor API server entry point

use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;

use rotor_api::app::create_app;
use rotor_api::config::{Config, StoreBackend};
use rotor_api::routes::auth::AppState;
use rotor_api::telemetry;
use rotor_core::domain::entities::user::{Role, User};
use rotor_core::repositories::{
    InMemoryRefreshTokenStore, InMemoryUserRepository, RefreshTokenStore, UserRepository,
};
use rotor_core::services::token::{AccessTokenCodec, JwtAccessTokenCodec, TokenServiceConfig};
use rotor_core::services::SessionService;
use rotor_infra::database::{DatabasePool, MySqlRefreshTokenStore, MySqlUserRepository};
use rotor_shared::Environment;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Environment-specific file first; dotenvy never overrides variables already set
    let _ = dotenvy::from_filename(Environment::from_env().env_file());
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(anyhow::Error::msg)?;
    telemetry::init(&config.app.logging);

    for warning in config.app.security_warnings() {
        tracing::warn!("{}", warning);
    }

    tracing::info!(
        environment = %config.app.environment,
        store = ?config.store,
        dev_login = config.dev_login,
        "Starting Rotor API"
    );

    match config.store {
        StoreBackend::Mysql => {
            let pool = DatabasePool::new(config.app.database.clone())
                .await
                .context("failed to connect to the database")?;
            pool.run_migrations()
                .await
                .context("failed to run database migrations")?;

            let store = Arc::new(MySqlRefreshTokenStore::new(pool.get_pool().clone()));
            let users = Arc::new(MySqlUserRepository::new(pool.get_pool().clone()));
            let result = serve(&config, store, users).await;
            pool.close().await;
            result
        }
        StoreBackend::Memory => {
            if config.is_production() {
                tracing::warn!("In-memory session store selected in production; sessions will not survive a restart");
            }
            let store = Arc::new(InMemoryRefreshTokenStore::new());
            let users = Arc::new(InMemoryUserRepository::new());
            if let Some(email) = &config.dev_seed_user_email {
                let user = users
                    .create(User::new(email.clone(), Role::User))
                    .await
                    .context("failed to seed development user")?;
                tracing::info!(user_id = %user.id, email = %user.email, "Seeded development user");
            }
            serve(&config, store, users).await
        }
    }
}

async fn serve<S, U>(config: &Config, store: Arc<S>, users: Arc<U>) -> anyhow::Result<()>
where
    S: RefreshTokenStore + 'static,
    U: UserRepository + 'static,
{
    let token_config = TokenServiceConfig::from_auth_config(&config.app.auth)
        .context("invalid token configuration")?;
    let codec: Arc<dyn AccessTokenCodec> = Arc::new(
        JwtAccessTokenCodec::new(&token_config).context("invalid access token codec settings")?,
    );

    let session_service = Arc::new(SessionService::new(store, users, codec.clone(), token_config));
    let app_state = web::Data::new(AppState::new(session_service));
    let codec_data = web::Data::new(codec);

    let options = config.app_options();

    let bind_address = config.app.server.bind_address();
    tracing::info!("Listening on {}", bind_address);

    let mut server = HttpServer::new(move || create_app(app_state.clone(), codec_data.clone(), options));
    // 0 keeps actix's default of one worker per core
    if config.app.server.workers > 0 {
        server = server.workers(config.app.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run()
        .await
        .context("server error")
}
