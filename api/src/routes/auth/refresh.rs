use actix_web::{web, HttpResponse};
use validator::Validate;

use rotor_core::repositories::{RefreshTokenStore, UserRepository};

use crate::dto::{RefreshTokenRequest, TokenResponse};
use crate::handlers::{handle_rotation_error, handle_validation_error};

use super::AppState;

/// Handler for POST /api/v1/auth/refresh
///
/// Exchanges a refresh token for a new access/refresh pair. The presented
/// token is consumed; presenting it again revokes the whole session family.
///
/// # Request Body
///
/// ```json
/// {
///     "refresh_token": "string"
/// }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "access_token": "eyJ...",
///     "refresh_token": "new_refresh_token_string",
///     "expires_in": 900
/// }
/// ```
///
/// ## Errors
/// - 401 Unauthorized: `invalid_refresh_token` for any rejected token
/// - 503 Service Unavailable: token storage could not be reached
pub async fn refresh<S, U>(
    state: web::Data<AppState<S, U>>,
    request: web::Json<RefreshTokenRequest>,
) -> HttpResponse
where
    S: RefreshTokenStore + 'static,
    U: UserRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return handle_validation_error(errors);
    }

    match state.session_service.refresh(&request.refresh_token).await {
        Ok(tokens) => HttpResponse::Ok().json(TokenResponse::from(tokens)),
        Err(error) => handle_rotation_error(error),
    }
}
