use crate::{
    auth::{jwt::issue_token, password::verify_password},
    config::Config,
    error::{ApiError, ApiResult},
    models::{LoginRequest, LoginResponse},
    store::users,
};
use actix_web::{HttpResponse, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};

pub const ERROR_INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const ERROR_CREDENTIALS_REQUIRED: &str = "Email and password are required";

/* =========================
Login
========================= */
/// Swagger doc for the login endpoint
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body(
        content = LoginRequest,
        description = "Email and password",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Token issued", body = LoginResponse,
         example = json!({
            "data": { "token": "eyJhbGciOiJIUzI1NiJ9..." }
         })
        ),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Credentials did not match")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(payload, pool, config),
    fields(email = %payload.email)
)]
pub async fn login(
    payload: web::Json<LoginRequest>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    info!("Login request received");

    if payload.email.trim().is_empty() || payload.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(ApiError::validation(ERROR_CREDENTIALS_REQUIRED));
    }

    debug!("Fetching user from database");

    let user = users::find_by_email(pool.get_ref(), payload.email.trim())
        .await?
        .ok_or_else(|| {
            info!("Invalid credentials: user not found");
            ApiError::unauthorized(ERROR_INVALID_CREDENTIALS)
        })?;

    debug!(user_id = user.id, "Verifying password");

    if !verify_password(&payload.password, &user.password_hash) {
        info!("Invalid credentials: password mismatch");
        return Err(ApiError::unauthorized(ERROR_INVALID_CREDENTIALS));
    }

    let token = issue_token(
        user.id,
        &user.email,
        user.role_id,
        &config.jwt_secret,
        config.token_ttl,
    )?;

    info!(user_id = user.id, "Login successful");

    Ok(HttpResponse::Ok().json(json!({ "data": LoginResponse { token } })))
}
