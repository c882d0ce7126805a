use std::collections::HashMap;

use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::error::{ApiError, ApiResult, is_constraint_violation};
use crate::leave::policy::{self, Action};
use crate::leave::service::LeaveService;
use crate::model::role::Role;
use crate::model::user::{
    DEFAULT_INITIAL_AL, UserResponse, creates_reporting_cycle, validate_al_total, validate_email,
    validate_name, validate_password,
};
use crate::store::users::{self, NewUser};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

pub const ERROR_EMAIL_REQUIRED: &str = "Email is required";
pub const ERROR_DUPLICATE_EMAIL: &str = "Email already in use";
pub const ERROR_UNKNOWN_ROLE: &str = "Role does not exist";
pub const ERROR_MANAGER_NOT_FOUND: &str = "Manager not found";
pub const ERROR_MANAGER_CYCLE: &str = "Manager assignment would create a reporting cycle";
pub const ERROR_USER_IN_USE: &str = "User still has leave requests or reports";
pub const ERROR_NO_USER_CHANGES: &str = "No changes made to the user";
pub const MESSAGE_USER_DELETED: &str = "User deleted";

#[derive(Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "Jane")]
    pub firstname: String,
    #[schema(example = "Doe")]
    pub surname: String,
    #[schema(example = "jane.doe@example.com")]
    pub email: String,
    #[schema(example = "correct horse battery")]
    pub password: String,
    #[schema(example = 3)]
    pub role_id: u8,
    #[schema(example = 2)]
    pub manager_id: Option<u64>,
    /// Defaults to 25 when omitted
    pub initial_al_total: Option<i32>,
    /// Defaults to the initial allotment when omitted
    pub remaining_al: Option<i32>,
}

/// Admin patch for a user. Absent fields stay unchanged; this surface
/// cannot clear an assigned manager.
#[derive(Deserialize, ToSchema)]
pub struct UpdateUser {
    #[schema(example = 7)]
    pub id: u64,
    pub firstname: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub role_id: Option<u8>,
    pub manager_id: Option<u64>,
}

/* =========================
List users
========================= */
/// Swagger doc for the user list endpoint
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Every user with their role", body = Object,
         example = json!({ "data": [] })
        ),
        (status = 204, description = "No users to show"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn list_users(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    policy::authorize(&auth, Action::ManageUsers, None)?;

    let users = users::list_all_with_role(pool.get_ref()).await?;
    if users.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }

    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(json!({ "data": users })))
}

/* =========================
Get one user
========================= */
/// Swagger doc for the user detail endpoint
#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "ID of the user to fetch")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn get_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    policy::authorize(&auth, Action::ManageUsers, None)?;

    let user_id = path.into_inner();
    let user = users::find_by_id_with_role(pool.get_ref(), user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found with ID: {user_id}")))?;

    Ok(HttpResponse::Ok().json(json!({ "data": UserResponse::from(user) })))
}

/* =========================
Get one user by email
========================= */
/// Swagger doc for the user-by-email endpoint
#[utoipa::path(
    get,
    path = "/api/users/email/{email}",
    params(
        ("email" = String, Path, description = "Email address to look up")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, description = "Blank email"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the caller's own record"),
        (status = 404, description = "No user with that email")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn get_user_by_email(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let email = path.into_inner();
    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::validation(ERROR_EMAIL_REQUIRED));
    }

    let user = users::find_by_email_with_role(pool.get_ref(), email)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{email} not found")))?;

    policy::authorize(
        &auth,
        Action::ViewUserByEmail,
        Some(&policy::ActionTarget {
            owner_id: user.id,
            owner_manager_id: user.manager_id,
        }),
    )?;

    Ok(HttpResponse::Ok().json(json!({ "data": UserResponse::from(user) })))
}

/* =========================
Create user
========================= */
/// Swagger doc for the user creation endpoint
#[utoipa::path(
    post,
    path = "/api/users",
    request_body(
        content = CreateUser,
        description = "New user payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation failure or duplicate email"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateUser>,
) -> ApiResult<HttpResponse> {
    policy::authorize(&auth, Action::ManageUsers, None)?;

    let payload = payload.into_inner();

    validate_name("Firstname", &payload.firstname)?;
    validate_name("Surname", &payload.surname)?;
    let email = payload.email.trim().to_string();
    validate_email(&email)?;
    validate_password(&payload.password)?;

    if Role::from_id(payload.role_id).is_none() {
        return Err(ApiError::validation(ERROR_UNKNOWN_ROLE));
    }

    let initial_al_total = payload.initial_al_total.unwrap_or(DEFAULT_INITIAL_AL);
    validate_al_total(initial_al_total)?;
    let remaining_al = payload.remaining_al.unwrap_or(initial_al_total);
    validate_al_total(remaining_al)?;

    if let Some(manager_id) = payload.manager_id {
        users::find_by_id(pool.get_ref(), manager_id)
            .await?
            .ok_or_else(|| ApiError::validation(ERROR_MANAGER_NOT_FOUND))?;
    }

    let new_user = NewUser {
        firstname: payload.firstname.trim().to_string(),
        surname: payload.surname.trim().to_string(),
        email,
        password_hash: hash_password(&payload.password)?,
        role_id: payload.role_id,
        manager_id: payload.manager_id,
        initial_al_total,
        remaining_al,
    };

    let user_id = match users::insert(pool.get_ref(), &new_user).await {
        Ok(id) => id,
        Err(e) if is_constraint_violation(&e) => {
            return Err(ApiError::conflict(ERROR_DUPLICATE_EMAIL));
        }
        Err(e) => return Err(e.into()),
    };

    let user = users::find_by_id_with_role(pool.get_ref(), user_id)
        .await?
        .ok_or_else(|| ApiError::internal(format!("User {user_id} missing after insert")))?;

    Ok(HttpResponse::Created().json(json!({ "data": UserResponse::from(user) })))
}

/* =========================
Update user
========================= */
/// Swagger doc for the user update endpoint
#[utoipa::path(
    patch,
    path = "/api/users",
    request_body(
        content = UpdateUser,
        description = "Fields to change; absent fields stay as they are",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 304, description = "No fields supplied"),
        (status = 400, description = "Validation failure, duplicate email, or reporting cycle"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpdateUser>,
) -> ApiResult<HttpResponse> {
    policy::authorize(&auth, Action::ManageUsers, None)?;

    let UpdateUser {
        id,
        firstname,
        surname,
        email,
        role_id,
        manager_id,
    } = payload.into_inner();

    let mut user = users::find_by_id(pool.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found with ID: {id}")))?;

    if firstname.is_none()
        && surname.is_none()
        && email.is_none()
        && role_id.is_none()
        && manager_id.is_none()
    {
        return Err(ApiError::no_change(ERROR_NO_USER_CHANGES));
    }

    if let Some(firstname) = firstname {
        validate_name("Firstname", &firstname)?;
        user.firstname = firstname.trim().to_string();
    }
    if let Some(surname) = surname {
        validate_name("Surname", &surname)?;
        user.surname = surname.trim().to_string();
    }
    if let Some(email) = email {
        let email = email.trim().to_string();
        validate_email(&email)?;
        user.email = email;
    }
    if let Some(role_id) = role_id {
        if Role::from_id(role_id).is_none() {
            return Err(ApiError::validation(ERROR_UNKNOWN_ROLE));
        }
        user.role_id = role_id;
    }
    if let Some(manager_id) = manager_id {
        let edges: HashMap<u64, Option<u64>> = users::manager_edges(pool.get_ref())
            .await?
            .into_iter()
            .collect();

        if !edges.contains_key(&manager_id) {
            return Err(ApiError::validation(ERROR_MANAGER_NOT_FOUND));
        }
        if creates_reporting_cycle(user.id, manager_id, &edges) {
            return Err(ApiError::validation(ERROR_MANAGER_CYCLE));
        }
        user.manager_id = Some(manager_id);
    }

    if let Err(e) = users::save(pool.get_ref(), &user).await {
        if is_constraint_violation(&e) {
            return Err(ApiError::conflict(ERROR_DUPLICATE_EMAIL));
        }
        return Err(e.into());
    }

    let user = users::find_by_id_with_role(pool.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::internal(format!("User {id} missing after update")))?;

    Ok(HttpResponse::Ok().json(json!({ "data": UserResponse::from(user) })))
}

/* =========================
Delete user
========================= */
/// Swagger doc for the user deletion endpoint
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "ID of the user to delete")
    ),
    responses(
        (status = 200, description = "User deleted", body = Object,
         example = json!({ "data": "User deleted" })
        ),
        (status = 400, description = "User still has leave requests or reports"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn delete_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    policy::authorize(&auth, Action::ManageUsers, None)?;

    let affected = match users::delete(pool.get_ref(), path.into_inner()).await {
        Ok(n) => n,
        Err(e) if is_constraint_violation(&e) => {
            return Err(ApiError::conflict(ERROR_USER_IN_USE));
        }
        Err(e) => return Err(e.into()),
    };
    if affected == 0 {
        return Err(ApiError::not_found("User with the provided ID not found"));
    }

    Ok(HttpResponse::Ok().json(json!({ "data": MESSAGE_USER_DELETED })))
}

/* =========================
Reset annual leave
========================= */
/// Swagger doc for the balance reset endpoint
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/reset-al",
    params(
        ("user_id" = u64, Path, description = "ID of the user whose balance is reset")
    ),
    responses(
        (status = 200, description = "Balance back at the initial allotment", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn reset_annual_leave(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let user = svc.reset_annual_leave(&auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "data": user })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_payload_balances_are_optional() {
        let payload: CreateUser = serde_json::from_str(
            r#"{
                "firstname": "Jane",
                "surname": "Doe",
                "email": "jane.doe@example.com",
                "password": "correct horse battery",
                "role_id": 3
            }"#,
        )
        .unwrap();

        assert!(payload.initial_al_total.is_none());
        assert!(payload.remaining_al.is_none());
        assert!(payload.manager_id.is_none());
    }

    #[test]
    fn update_payload_with_only_an_id_carries_no_changes() {
        let payload: UpdateUser = serde_json::from_str(r#"{"id":7}"#).unwrap();

        assert_eq!(payload.id, 7);
        assert!(payload.firstname.is_none());
        assert!(payload.surname.is_none());
        assert!(payload.email.is_none());
        assert!(payload.role_id.is_none());
        assert!(payload.manager_id.is_none());
    }
}
