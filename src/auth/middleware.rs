use crate::auth::auth::AuthUser;
use crate::auth::jwt::{ERROR_TOKEN_INVALID, ERROR_TOKEN_NOT_FOUND, verify_token};
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

/// Route guard for everything under the API prefix. Decodes the bearer
/// token once, resolves the role id and stashes an [`AuthUser`] for the
/// handlers to extract. Failures surface as [`ApiError`] so rejections
/// carry the same error envelope as the handlers.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| ApiError::internal("App config missing"))?;

    let header_value = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized(ERROR_TOKEN_NOT_FOUND))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized(ERROR_TOKEN_INVALID))?;

    let claims = verify_token(token, &config.jwt_secret)?;

    // A token minted for a role this build does not know is useless.
    let role =
        Role::from_id(claims.role).ok_or_else(|| ApiError::unauthorized(ERROR_TOKEN_INVALID))?;

    req.extensions_mut().insert(AuthUser {
        uid: claims.user_id,
        email: claims.sub,
        role,
    });

    next.call(req).await
}
