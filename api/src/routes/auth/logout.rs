use actix_web::{web, HttpResponse};
use validator::Validate;

use rotor_core::errors::DomainError;
use rotor_core::repositories::{RefreshTokenStore, UserRepository};

use crate::dto::RefreshTokenRequest;
use crate::handlers::handle_domain_error;

use super::AppState;

/// Handler for POST /api/v1/auth/logout
///
/// Revokes the session family the refresh token belongs to. Unknown tokens
/// are accepted silently so the endpoint does not reveal which tokens exist.
///
/// # Response
/// - 204 No Content: the session is gone (or never existed)
/// - 400 Bad Request: missing or oversized `refresh_token`
/// - 503 Service Unavailable: token storage could not be reached
pub async fn logout<S, U>(
    state: web::Data<AppState<S, U>>,
    request: web::Json<RefreshTokenRequest>,
) -> HttpResponse
where
    S: RefreshTokenStore + 'static,
    U: UserRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return handle_domain_error(DomainError::Validation {
            message: errors.to_string(),
        });
    }

    match state.session_service.logout(&request.refresh_token).await {
        Ok(_) => HttpResponse::NoContent().finish(),
        Err(error) => handle_domain_error(error),
    }
}
