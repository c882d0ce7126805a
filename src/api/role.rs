use crate::auth::auth::AuthUser;
use crate::error::{ApiError, ApiResult, is_constraint_violation};
use crate::leave::policy::{self, Action};
use crate::model::role::{RoleRecord, validate_role_name};
use crate::store::roles;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

pub const ERROR_DUPLICATE_ROLE: &str = "Role name already in use";
pub const ERROR_ROLE_IN_USE: &str = "Role is still assigned to users";
pub const MESSAGE_ROLE_DELETED: &str = "Role deleted";

#[derive(Deserialize, ToSchema)]
pub struct CreateRole {
    #[schema(example = "manager")]
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateRole {
    #[schema(example = 2)]
    pub id: u8,
    #[schema(example = "team lead")]
    pub name: String,
}

/* =========================
List roles
========================= */
/// Swagger doc for the role list endpoint
#[utoipa::path(
    get,
    path = "/api/roles",
    responses(
        (status = 200, description = "Every role", body = Object,
         example = json!({ "data": [ { "id": 1, "name": "admin" } ] })
        ),
        (status = 204, description = "No roles to show"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Roles"
)]
pub async fn list_roles(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    policy::authorize(&auth, Action::ManageRoles, None)?;

    let roles = roles::list_all(pool.get_ref()).await?;
    if roles.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    Ok(HttpResponse::Ok().json(json!({ "data": roles })))
}

/* =========================
Get one role
========================= */
/// Swagger doc for the role detail endpoint
#[utoipa::path(
    get,
    path = "/api/roles/{role_id}",
    params(
        ("role_id" = u8, Path, description = "ID of the role to fetch")
    ),
    responses(
        (status = 200, description = "Role found", body = RoleRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Role not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Roles"
)]
pub async fn get_role(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u8>,
) -> ApiResult<HttpResponse> {
    policy::authorize(&auth, Action::ManageRoles, None)?;

    let role_id = path.into_inner();
    let role = roles::find_by_id(pool.get_ref(), role_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Role not found with ID: {role_id}")))?;

    Ok(HttpResponse::Ok().json(json!({ "data": role })))
}

/* =========================
Create role
========================= */
/// Swagger doc for the role creation endpoint
#[utoipa::path(
    post,
    path = "/api/roles",
    request_body(
        content = CreateRole,
        description = "Name for the new role",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Role created", body = RoleRecord),
        (status = 400, description = "Invalid or duplicate name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Roles"
)]
pub async fn create_role(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateRole>,
) -> ApiResult<HttpResponse> {
    policy::authorize(&auth, Action::ManageRoles, None)?;

    let name = payload.into_inner().name;
    validate_role_name(&name)?;

    let new_id = match roles::insert(pool.get_ref(), &name).await {
        Ok(id) => id,
        Err(e) if is_constraint_violation(&e) => {
            return Err(ApiError::conflict(ERROR_DUPLICATE_ROLE));
        }
        Err(e) => return Err(e.into()),
    };

    let id = u8::try_from(new_id)
        .map_err(|_| ApiError::internal(format!("Role id {new_id} exceeds the id range")))?;

    Ok(HttpResponse::Created().json(json!({ "data": RoleRecord { id, name } })))
}

/* =========================
Rename role
========================= */
/// Swagger doc for the role rename endpoint
#[utoipa::path(
    patch,
    path = "/api/roles",
    request_body(
        content = UpdateRole,
        description = "Role id and its new name",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Role renamed", body = RoleRecord),
        (status = 400, description = "Invalid or duplicate name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Role not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Roles"
)]
pub async fn update_role(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpdateRole>,
) -> ApiResult<HttpResponse> {
    policy::authorize(&auth, Action::ManageRoles, None)?;

    let UpdateRole { id, name } = payload.into_inner();
    validate_role_name(&name)?;

    let affected = match roles::update_name(pool.get_ref(), id, &name).await {
        Ok(n) => n,
        Err(e) if is_constraint_violation(&e) => {
            return Err(ApiError::conflict(ERROR_DUPLICATE_ROLE));
        }
        Err(e) => return Err(e.into()),
    };
    if affected == 0 {
        return Err(ApiError::not_found(format!("Role not found with ID: {id}")));
    }

    Ok(HttpResponse::Ok().json(json!({ "data": RoleRecord { id, name } })))
}

/* =========================
Delete role
========================= */
/// Swagger doc for the role deletion endpoint
#[utoipa::path(
    delete,
    path = "/api/roles/{role_id}",
    params(
        ("role_id" = u8, Path, description = "ID of the role to delete")
    ),
    responses(
        (status = 200, description = "Role deleted", body = Object,
         example = json!({ "data": "Role deleted" })
        ),
        (status = 400, description = "Role is still assigned to users"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Role not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Roles"
)]
pub async fn delete_role(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u8>,
) -> ApiResult<HttpResponse> {
    policy::authorize(&auth, Action::ManageRoles, None)?;

    let role_id = path.into_inner();
    let affected = match roles::delete(pool.get_ref(), role_id).await {
        Ok(n) => n,
        Err(e) if is_constraint_violation(&e) => {
            return Err(ApiError::conflict(ERROR_ROLE_IN_USE));
        }
        Err(e) => return Err(e.into()),
    };
    if affected == 0 {
        return Err(ApiError::not_found(format!(
            "Role not found with ID: {role_id}"
        )));
    }

    Ok(HttpResponse::Ok().json(json!({ "data": MESSAGE_ROLE_DELETED })))
}
