//! Maps core errors onto HTTP responses.
//!
//! Every refresh-token rejection, whatever its cause, produces the same
//! status and body so a client cannot tell an unknown token from a revoked
//! or replayed one. The cause is only visible in the server logs.

use actix_web::{http::StatusCode, HttpResponse};
use rotor_core::errors::{AuthError, DomainError, RotationError, StoreError, TokenError};
use rotor_shared::{error_codes, ErrorResponse};
use validator::ValidationErrors;

/// Build an HTTP response with the given status and error body
pub fn error_response(status: StatusCode, body: ErrorResponse) -> HttpResponse {
    HttpResponse::build(status).json(body)
}

/// Response for a failed refresh
pub fn handle_rotation_error(error: RotationError) -> HttpResponse {
    if error.is_security_rejection() {
        tracing::debug!(reason = error.kind(), "Refresh rejected");
        return error_response(
            StatusCode::UNAUTHORIZED,
            ErrorResponse::new(error_codes::INVALID_REFRESH_TOKEN, error.client_message()),
        );
    }

    tracing::error!(error = %error, "Refresh failed on storage");
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        ErrorResponse::new(error_codes::SERVICE_UNAVAILABLE, error.client_message()),
    )
}

/// Response for any other domain failure
pub fn handle_domain_error(error: DomainError) -> HttpResponse {
    match error {
        DomainError::Rotation(rotation) => handle_rotation_error(rotation),
        DomainError::Validation { message } => error_response(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(error_codes::VALIDATION_ERROR, message),
        ),
        DomainError::NotFound { resource } => error_response(
            StatusCode::NOT_FOUND,
            ErrorResponse::new(error_codes::NOT_FOUND, format!("{} not found", resource)),
        ),
        DomainError::Unauthorized
        | DomainError::Auth(AuthError::AuthenticationFailed)
        | DomainError::Auth(AuthError::UserBlocked)
        | DomainError::Auth(AuthError::UserNotFound) => error_response(
            StatusCode::UNAUTHORIZED,
            ErrorResponse::new(error_codes::UNAUTHORIZED, "Authentication required"),
        ),
        DomainError::Token(TokenError::SecretCollision { attempts }) => {
            tracing::error!(attempts, "Refresh secret generation keeps colliding");
            internal_error()
        }
        DomainError::Token(TokenError::TokenGenerationFailed) => internal_error(),
        DomainError::Token(_) => error_response(
            StatusCode::UNAUTHORIZED,
            ErrorResponse::new(error_codes::TOKEN_INVALID, "Access token is not valid"),
        ),
        DomainError::Store(StoreError::Unavailable { message }) => {
            tracing::error!(error = %message, "Token storage unavailable");
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::new(
                    error_codes::SERVICE_UNAVAILABLE,
                    "service temporarily unavailable",
                ),
            )
        }
        other => {
            tracing::error!(error = %other, "Unhandled domain error");
            internal_error()
        }
    }
}

/// Response for a request body that failed validation
///
/// A malformed refresh token is still a refresh-token rejection, so it gets
/// the same body as every other one.
pub fn handle_validation_error(_errors: ValidationErrors) -> HttpResponse {
    handle_rotation_error(RotationError::NotFound)
}

fn internal_error() -> HttpResponse {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse::new(error_codes::INTERNAL_ERROR, "An internal error occurred"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(response: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn test_security_rejections_share_one_response() {
        let rejections = [
            RotationError::NotFound,
            RotationError::Expired,
            RotationError::Revoked,
            RotationError::ReuseDetected,
        ];

        for rejection in rejections {
            let response = handle_rotation_error(rejection);
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

            let body = body_of(response).await;
            assert_eq!(body["error"], "invalid_refresh_token");
            assert_eq!(body["message"], "refresh token is not valid");
            assert!(body.get("details").is_none());
        }
    }

    #[actix_web::test]
    async fn test_unavailable_maps_to_503() {
        let response = handle_rotation_error(RotationError::Unavailable {
            message: "pool timed out".to_string(),
        });
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_of(response).await;
        assert_eq!(body["error"], "service_unavailable");
        assert!(!body["message"].as_str().unwrap().contains("pool"));
    }

    #[test]
    fn test_domain_error_statuses() {
        let validation = DomainError::Validation {
            message: "bad".to_string(),
        };
        assert_eq!(handle_domain_error(validation).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            handle_domain_error(DomainError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            handle_domain_error(StoreError::unavailable("down").into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            handle_domain_error(TokenError::SecretCollision { attempts: 3 }.into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            handle_domain_error(RotationError::ReuseDetected.into()).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
