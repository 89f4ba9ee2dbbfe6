//! Application factory
//!
//! Builds the Actix-web application from already constructed state so the
//! binary and the integration tests share one routing table.

use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    error::InternalError,
    web, App, Error, HttpResponse,
};
use tracing_actix_web::TracingLogger;

use rotor_core::repositories::{RefreshTokenStore, UserRepository};
use rotor_core::services::token::AccessTokenCodec;
use rotor_shared::{error_codes, ErrorResponse};

use crate::routes::auth::{dev_login, logout, logout_all, refresh, AppState};

/// Optional routes
#[derive(Debug, Clone, Copy, Default)]
pub struct AppOptions {
    /// Mount `POST /api/v1/auth/dev-login`, which starts a session for any
    /// existing user id without credentials
    pub dev_login: bool,
}

/// Create and configure the application with all dependencies
///
/// `codec` is registered separately from the session state so the bearer
/// extractor can verify access tokens without knowing the store types.
pub fn create_app<S, U>(
    app_state: web::Data<AppState<S, U>>,
    codec: web::Data<Arc<dyn AccessTokenCodec>>,
    options: AppOptions,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
>
where
    S: RefreshTokenStore + 'static,
    U: UserRepository + 'static,
{
    App::new()
        .app_data(app_state)
        .app_data(codec)
        .app_data(json_config())
        .wrap(TracingLogger::default())
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/api/v1").service(
                web::scope("/auth")
                    .route("/refresh", web::post().to(refresh::<S, U>))
                    .route("/logout", web::post().to(logout::<S, U>))
                    .route("/logout-all", web::post().to(logout_all::<S, U>))
                    .configure(|cfg| {
                        if options.dev_login {
                            cfg.route("/dev-login", web::post().to(dev_login::<S, U>));
                        }
                    }),
            ),
        )
        .default_service(web::route().to(not_found))
}

/// Malformed JSON bodies get the standard error shape instead of plain text
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(4096)
        .error_handler(|err, _req| {
            let body = ErrorResponse::new(error_codes::BAD_REQUEST, err.to_string());
            InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        })
}

/// Health check endpoint handler
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "rotor-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}
