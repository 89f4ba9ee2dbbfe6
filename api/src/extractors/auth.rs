//! Bearer-token authentication for protected endpoints.
//!
//! `AuthContext` is an extractor: a handler that takes it as an argument
//! only runs when the request carries a valid access token. Verification
//! uses the `AccessTokenCodec` registered as app data.

use std::future::{ready, Ready};
use std::sync::Arc;

use actix_web::{
    dev::Payload, http::header::AUTHORIZATION, http::StatusCode, web, FromRequest, HttpRequest,
    HttpResponse, ResponseError,
};
use rotor_core::domain::entities::{token::Claims, user::Role};
use rotor_core::services::token::AccessTokenCodec;
use rotor_shared::{error_codes, ErrorResponse};
use uuid::Uuid;

/// Authenticated caller, taken from access-token claims
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User ID from the `sub` claim
    pub user_id: Uuid,
    pub role: Role,
    /// JWT ID for tracking
    pub jti: String,
}

impl AuthContext {
    /// Build the context from verified claims
    pub fn from_claims(claims: Claims) -> Result<Self, AuthRejection> {
        let user_id = claims.user_id().map_err(|_| AuthRejection::InvalidToken)?;
        Ok(Self {
            user_id,
            role: claims.role,
            jti: claims.jti,
        })
    }
}

/// Why a request was not authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingToken,
    InvalidToken,
    NotConfigured,
}

impl std::fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthRejection::MissingToken => write!(f, "Missing or invalid Authorization header"),
            AuthRejection::InvalidToken => write!(f, "Access token is not valid"),
            AuthRejection::NotConfigured => write!(f, "Token verification not configured"),
        }
    }
}

impl ResponseError for AuthRejection {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthRejection::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = match self {
            AuthRejection::MissingToken => error_codes::UNAUTHORIZED,
            AuthRejection::InvalidToken => error_codes::TOKEN_INVALID,
            AuthRejection::NotConfigured => error_codes::INTERNAL_ERROR,
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(code, self.to_string()))
    }
}

impl FromRequest for AuthContext {
    type Error = AuthRejection;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthContext, AuthRejection> {
    let token = extract_bearer_token(req).ok_or(AuthRejection::MissingToken)?;
    let codec = req
        .app_data::<web::Data<Arc<dyn AccessTokenCodec>>>()
        .ok_or(AuthRejection::NotConfigured)?;

    let claims = codec.decode(token).map_err(|e| {
        tracing::debug!(error = %e, "Access token verification failed");
        AuthRejection::InvalidToken
    })?;

    AuthContext::from_claims(claims)
}

/// Extracts the Bearer token from the Authorization header
fn extract_bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
