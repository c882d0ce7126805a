use crate::auth::auth::AuthUser;
use crate::error::ApiResult;
use crate::leave::service::LeaveService;
use crate::model::leave_request::{LeaveResponse, LeaveStatus, LeaveType};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

pub const MESSAGE_LEAVE_DELETED: &str = "Leave request deleted";

#[derive(Deserialize, ToSchema)]
pub struct CreateLeaveForStaff {
    /// ID of the report the leave is filed for
    #[schema(example = 7)]
    pub uid: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Parental leave")]
    pub reason: Option<String>,
    #[serde(default)]
    #[schema(example = "Annual Leave")]
    pub leave_type: LeaveType,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeaveStatus {
    #[schema(example = 1)]
    pub id: u64,
    /// Only `approved` and `rejected` are accepted here
    #[schema(example = "approved")]
    pub status: LeaveStatus,
}

/* =========================
List leave requests (manager/admin)
========================= */
/// Swagger doc for the leave list endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    responses(
        (status = 200, description = "Every visible leave request", body = Object,
         example = json!({ "data": [] })
        ),
        (status = 204, description = "No leave requests to show"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Staff must use the staff surface")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(auth: AuthUser, svc: web::Data<LeaveService>) -> ApiResult<HttpResponse> {
    let leaves = svc.list_all(&auth).await?;

    if leaves.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    Ok(HttpResponse::Ok().json(json!({ "data": leaves })))
}

/* =========================
List the caller's own requests
========================= */
/// Swagger doc for the own-leave list endpoint
#[utoipa::path(
    get,
    path = "/api/leave/own",
    responses(
        (status = 200, description = "The caller's own leave requests", body = Object,
         example = json!({ "data": [] })
        ),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn own_leave_list(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
) -> ApiResult<HttpResponse> {
    let leaves = svc.list_own(&auth).await?;
    Ok(HttpResponse::Ok().json(json!({ "data": leaves })))
}

/* =========================
File leave for a report
========================= */
/// Swagger doc for the create-for-report endpoint
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeaveForStaff,
        description = "Leave request filed on behalf of a managed report",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request filed", body = LeaveResponse),
        (status = 400, description = "Invalid dates or not enough remaining days"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Employee does not report to the caller"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
    payload: web::Json<CreateLeaveForStaff>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let leave = svc
        .create_for_staff(
            &auth,
            payload.uid,
            payload.start_date,
            payload.end_date,
            payload.reason,
            payload.leave_type,
        )
        .await?;

    Ok(HttpResponse::Created().json(json!({ "data": leave })))
}

/* =========================
Approve or reject
========================= */
/// Swagger doc for the status update endpoint
#[utoipa::path(
    patch,
    path = "/api/leave",
    request_body(
        content = UpdateLeaveStatus,
        description = "Target status for a pending request",
        content_type = "application/json"
    ),
    responses(
        (status = 202, description = "Status applied", body = LeaveResponse),
        (status = 400, description = "Already processed, or a status outside approved/rejected"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Owner does not report to the caller"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave_status(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
    payload: web::Json<UpdateLeaveStatus>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let leave = svc.update_status(&auth, payload.id, payload.status).await?;

    Ok(HttpResponse::Accepted().json(json!({ "data": leave })))
}

/* =========================
Delete own request
========================= */
/// Swagger doc for the leave deletion endpoint
#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to delete")
    ),
    responses(
        (status = 200, description = "Leave request deleted", body = Object,
         example = json!({ "data": "Leave request deleted" })
        ),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    svc.delete_own(&auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "data": MESSAGE_LEAVE_DELETED })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_payload_parses_both_decisions() {
        let approve: UpdateLeaveStatus =
            serde_json::from_str(r#"{"id":1,"status":"approved"}"#).unwrap();
        let reject: UpdateLeaveStatus =
            serde_json::from_str(r#"{"id":1,"status":"rejected"}"#).unwrap();

        assert_eq!(approve.status, LeaveStatus::Approved);
        assert_eq!(reject.status, LeaveStatus::Rejected);
    }

    #[test]
    fn create_payload_requires_the_report_id() {
        assert!(
            serde_json::from_str::<CreateLeaveForStaff>(
                r#"{"start_date":"2026-01-01","end_date":"2026-01-12"}"#
            )
            .is_err()
        );
    }
}
