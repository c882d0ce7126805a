use crate::api::leave::{CreateLeaveForStaff, UpdateLeaveStatus};
use crate::api::role::{CreateRole, UpdateRole};
use crate::api::staff_leave::{CreateLeave, UpdateOwnLeave};
use crate::api::user::{CreateUser, UpdateUser};
use crate::model::leave_request::{LeaveOwner, LeaveResponse, LeaveStatus, LeaveType};
use crate::model::role::RoleRecord;
use crate::model::user::UserResponse;
use crate::models::{LoginRequest, LoginResponse};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Annual Leave Management API",
        version = "1.0.0",
        description = r#"
## Annual Leave Management System

This API powers an **annual leave management** service for staff, managers and administrators.

### 🔹 Key Features
- **Leave Requests**
  - File, reschedule, cancel and delete annual leave requests
- **Approvals**
  - Managers approve or reject their reports' pending requests
- **Balances**
  - Day counts are inclusive of both end dates and deducted up front; rejection and cancellation give the days back
- **User & Role Administration**
  - Admins manage users, the reporting tree, roles and balance resets

### 🔐 Security
Every endpoint under `/api` requires **JWT Bearer authentication**.
What a token can do is decided per role: **admin**, **manager** or **staff**.

### 📦 Response Format
- Successful responses wrap their payload as `{"data": ...}`
- Failures carry `{"error": {"message", "status", "timestamp"}}`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    modifiers(&SecurityAddon),
    paths(
        crate::auth::handlers::login,

        crate::api::leave::leave_list,
        crate::api::leave::own_leave_list,
        crate::api::leave::create_leave,
        crate::api::leave::update_leave_status,
        crate::api::leave::delete_leave,

        crate::api::staff_leave::staff_leave_list,
        crate::api::staff_leave::get_staff_leave,
        crate::api::staff_leave::create_staff_leave,
        crate::api::staff_leave::update_staff_leave,
        crate::api::staff_leave::delete_staff_leave,

        crate::api::user::list_users,
        crate::api::user::get_user,
        crate::api::user::get_user_by_email,
        crate::api::user::create_user,
        crate::api::user::update_user,
        crate::api::user::delete_user,
        crate::api::user::reset_annual_leave,

        crate::api::role::list_roles,
        crate::api::role::get_role,
        crate::api::role::create_role,
        crate::api::role::update_role,
        crate::api::role::delete_role
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            LeaveResponse,
            LeaveOwner,
            LeaveStatus,
            LeaveType,
            CreateLeave,
            UpdateOwnLeave,
            CreateLeaveForStaff,
            UpdateLeaveStatus,
            UserResponse,
            CreateUser,
            UpdateUser,
            RoleRecord,
            CreateRole,
            UpdateRole
        )
    ),
    tags(
        (name = "Auth", description = "Login and token issuance"),
        (name = "Leave", description = "Manager and admin leave APIs"),
        (name = "Staff leave", description = "Self-service leave APIs"),
        (name = "Users", description = "User administration APIs"),
        (name = "Roles", description = "Role administration APIs"),
    )
)]
pub struct ApiDoc;

/// Registers the bearer scheme the `security(("bearer_auth" = []))` path
/// attributes refer to.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
