use actix_web::{web, HttpResponse};

use rotor_core::repositories::{RefreshTokenStore, UserRepository};

use crate::dto::{DevLoginRequest, TokenResponse};
use crate::handlers::handle_domain_error;

use super::AppState;

/// Handler for POST /api/v1/auth/dev-login
///
/// Development only: starts a session for an existing user without any
/// credential check. In a real deployment the identity service calls
/// `SessionService::login` after verifying the user. Mounted only when
/// `AppOptions::dev_login` is set.
///
/// # Response
/// - 200 OK: `{ access_token, refresh_token, expires_in }`
/// - 401 Unauthorized: unknown or blocked user
pub async fn dev_login<S, U>(
    state: web::Data<AppState<S, U>>,
    request: web::Json<DevLoginRequest>,
) -> HttpResponse
where
    S: RefreshTokenStore + 'static,
    U: UserRepository + 'static,
{
    tracing::warn!(user_id = %request.user_id, "Development login used");

    match state.session_service.login(request.user_id).await {
        Ok(tokens) => HttpResponse::Ok().json(TokenResponse::from(tokens)),
        Err(error) => handle_domain_error(error),
    }
}
