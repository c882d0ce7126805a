use crate::api::leave::MESSAGE_LEAVE_DELETED;
use crate::auth::auth::AuthUser;
use crate::error::ApiResult;
use crate::leave::service::LeaveService;
use crate::model::leave_request::{LeaveResponse, LeaveStatus, LeaveType};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family trip")]
    pub reason: Option<String>,
    #[serde(default)]
    #[schema(example = "Annual Leave")]
    pub leave_type: LeaveType,
}

/// Owner-side patch. A `status` wins over the date fields; the only status
/// this surface accepts is `canceled`.
#[derive(Deserialize, ToSchema)]
pub struct UpdateOwnLeave {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "canceled")]
    pub status: Option<LeaveStatus>,
    #[schema(example = "2026-02-01", format = "date", value_type = String)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-02-03", format = "date", value_type = String)]
    pub end_date: Option<NaiveDate>,
}

/* =========================
List own leave requests
========================= */
/// Swagger doc for the staff leave list endpoint
#[utoipa::path(
    get,
    path = "/api/leave/staff",
    responses(
        (status = 200, description = "The caller's leave requests", body = Object,
         example = json!({ "data": [] })
        ),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff leave"
)]
pub async fn staff_leave_list(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
) -> ApiResult<HttpResponse> {
    let leaves = svc.list_own(&auth).await?;
    Ok(HttpResponse::Ok().json(json!({ "data": leaves })))
}

/* =========================
Get one of the caller's leave requests
========================= */
/// Swagger doc for the staff leave detail endpoint
#[utoipa::path(
    get,
    path = "/api/leave/staff/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such request owned by the caller")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff leave"
)]
pub async fn get_staff_leave(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let leave = svc.get_own(&auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "data": leave })))
}

/* =========================
File a leave request
========================= */
/// Swagger doc for the staff leave creation endpoint
#[utoipa::path(
    post,
    path = "/api/leave/staff",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request filed", body = LeaveResponse),
        (status = 400, description = "Invalid dates or not enough remaining days"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff leave"
)]
pub async fn create_staff_leave(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
    payload: web::Json<CreateLeave>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let leave = svc
        .create_own(
            &auth,
            payload.start_date,
            payload.end_date,
            payload.reason,
            payload.leave_type,
        )
        .await?;

    Ok(HttpResponse::Created().json(json!({ "data": leave })))
}

/* =========================
Cancel or reschedule own request
========================= */
/// Swagger doc for the staff leave update endpoint
#[utoipa::path(
    patch,
    path = "/api/leave/staff",
    request_body(
        content = UpdateOwnLeave,
        description = "Cancel, or move the dates of a pending request",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request updated", body = LeaveResponse),
        (status = 304, description = "Dates matched the stored ones"),
        (status = 400, description = "Already canceled, already processed, or invalid dates"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner, or a status other than canceled"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff leave"
)]
pub async fn update_staff_leave(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
    payload: web::Json<UpdateOwnLeave>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let leave = svc
        .update_own(
            &auth,
            payload.id,
            payload.status,
            payload.start_date,
            payload.end_date,
        )
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "data": leave })))
}

/* =========================
Delete own request
========================= */
/// Swagger doc for the staff leave deletion endpoint
#[utoipa::path(
    delete,
    path = "/api/leave/staff/{leave_id}",
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
    tag = "Staff leave"
)]
pub async fn delete_staff_leave(
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
    fn create_payload_defaults_to_annual_leave() {
        let payload: CreateLeave =
            serde_json::from_str(r#"{"start_date":"2026-01-01","end_date":"2026-01-12"}"#)
                .unwrap();

        assert_eq!(payload.leave_type, LeaveType::Annual);
        assert!(payload.reason.is_none());
    }

    #[test]
    fn update_payload_parses_a_cancellation() {
        let payload: UpdateOwnLeave =
            serde_json::from_str(r#"{"id":4,"status":"canceled"}"#).unwrap();

        assert_eq!(payload.id, 4);
        assert_eq!(payload.status, Some(LeaveStatus::Canceled));
        assert!(payload.start_date.is_none());
    }

    #[test]
    fn update_payload_parses_a_reschedule() {
        let payload: UpdateOwnLeave = serde_json::from_str(
            r#"{"id":4,"start_date":"2026-02-01","end_date":"2026-02-03"}"#,
        )
        .unwrap();

        assert!(payload.status.is_none());
        assert_eq!(
            payload.start_date,
            NaiveDate::from_ymd_opt(2026, 2, 1)
        );
    }

    #[test]
    fn unknown_status_values_fail_to_parse() {
        assert!(serde_json::from_str::<UpdateOwnLeave>(r#"{"id":4,"status":"gone"}"#).is_err());
    }
}
