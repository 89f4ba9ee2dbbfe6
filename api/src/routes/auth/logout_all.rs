use actix_web::{web, HttpResponse};

use rotor_core::repositories::{RefreshTokenStore, UserRepository};

use crate::extractors::AuthContext;
use crate::handlers::handle_domain_error;

use super::AppState;

/// Handler for POST /api/v1/auth/logout-all
///
/// Requires `Authorization: Bearer <access_token>`. Revokes every refresh
/// token the caller owns, ending their sessions on all devices. Access
/// tokens already issued stay valid until they expire.
///
/// # Response
/// - 204 No Content
/// - 401 Unauthorized: missing or invalid access token
/// - 503 Service Unavailable: token storage could not be reached
pub async fn logout_all<S, U>(
    state: web::Data<AppState<S, U>>,
    auth: AuthContext,
) -> HttpResponse
where
    S: RefreshTokenStore + 'static,
    U: UserRepository + 'static,
{
    match state.session_service.logout_all(auth.user_id).await {
        Ok(_) => HttpResponse::NoContent().finish(),
        Err(error) => handle_domain_error(error),
    }
}
