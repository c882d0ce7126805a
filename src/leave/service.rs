use chrono::NaiveDate;
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::info;

use crate::auth::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::leave::ledger;
use crate::leave::policy::{self, Action, ActionTarget};
use crate::model::leave_request::{
    LeaveRecord, LeaveResponse, LeaveStatus, LeaveType, LeaveWithOwner,
};
use crate::model::role::Role;
use crate::model::user::{UserRecord, UserResponse};
use crate::store::leaves::{self, NewLeave};
use crate::store::users;

pub const ERROR_LEAVE_NOT_FOUND: &str = "Leave with the provided ID not found";
pub const ERROR_ALREADY_CANCELED: &str = "Leave request is already canceled.";
pub const ERROR_ALREADY_PROCESSED: &str = "Leave request already processed";
pub const ERROR_NO_CHANGES: &str = "No changes made to the leave request";
pub const ERROR_NOT_PENDING_EDIT: &str = "Only pending leave requests can be rescheduled";
pub const ERROR_USER_NOT_FOUND: &str = "User not found";
pub const ERROR_EMPLOYEE_NOT_FOUND: &str = "Employee not found";

/// Orchestrates the leave-request lifecycle. Owns the pool; injected into
/// handlers through `web::Data`.
///
/// Every operation that touches both a leave row and its owner's balance
/// runs inside one transaction with the affected rows locked, so the pair of
/// writes commits or rolls back as a unit.
#[derive(Clone)]
pub struct LeaveService {
    pool: MySqlPool,
}

/// Validates the span and takes its days out of the owner's balance.
fn reserve(owner: &mut UserRecord, start: NaiveDate, end: NaiveDate) -> ApiResult<i32> {
    let days = ledger::days_between(start, end)?;
    ledger::apply_deduction(owner, days)?;
    Ok(days)
}

/// Returns the span's days to the owner's balance.
fn release(owner: &mut UserRecord, start: NaiveDate, end: NaiveDate) -> ApiResult<i32> {
    let days = ledger::days_between(start, end)?;
    ledger::apply_restoration(owner, days);
    Ok(days)
}

/// Decides a cancellation against the current status: an already-canceled
/// request is a conflict; otherwise says whether the request still holds
/// days that must be returned to the owner. A rejected request holds
/// nothing, so canceling it must not refund a second time.
fn plan_cancellation(current: LeaveStatus) -> ApiResult<bool> {
    if current == LeaveStatus::Canceled {
        return Err(ApiError::conflict(ERROR_ALREADY_CANCELED));
    }
    Ok(current.holds_days())
}

fn parse_status(raw: &str) -> ApiResult<LeaveStatus> {
    raw.parse::<LeaveStatus>()
        .map_err(|_| ApiError::internal(format!("unknown leave status in store: {raw}")))
}

fn target_of(leave: &LeaveWithOwner) -> ActionTarget {
    ActionTarget {
        owner_id: leave.user_id,
        owner_manager_id: leave.owner_manager_id,
    }
}

/// Re-reads a row after its writes so the response reflects the committed
/// state, owner balance included.
async fn load_row(tx: &mut Transaction<'_, MySql>, id: u64) -> ApiResult<LeaveWithOwner> {
    leaves::find_with_owner(&mut **tx, id)
        .await?
        .ok_or_else(|| ApiError::internal(format!("leave {id} missing after write")))
}

impl LeaveService {
    pub fn new(pool: MySqlPool) -> Self {
        LeaveService { pool }
    }

    /// Files a leave request for the actor. Deducts the days and inserts the
    /// pending request in one transaction.
    pub async fn create_own(
        &self,
        actor: &AuthUser,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: Option<String>,
        leave_type: LeaveType,
    ) -> ApiResult<LeaveResponse> {
        policy::authorize(actor, Action::CreateOwn, None)?;

        let mut tx = self.pool.begin().await?;

        let mut owner = users::find_by_id_for_update(&mut *tx, actor.uid)
            .await?
            .ok_or_else(|| ApiError::not_found(ERROR_USER_NOT_FOUND))?;

        let days = reserve(&mut owner, start_date, end_date)?;
        users::update_balance(&mut *tx, owner.id, owner.remaining_al).await?;

        let leave_id = leaves::insert(
            &mut *tx,
            &NewLeave {
                user_id: owner.id,
                start_date,
                end_date,
                reason,
                status: LeaveStatus::Pending.to_string(),
                leave_type: leave_type.to_string(),
            },
        )
        .await?;

        let row = load_row(&mut tx, leave_id).await?;
        tx.commit().await?;

        info!(leave_id, user_id = owner.id, days, "Leave request created");
        Ok(LeaveResponse::from(row))
    }

    /// Files a leave request on behalf of a managed report. Manager only,
    /// and only for their own reports.
    pub async fn create_for_staff(
        &self,
        actor: &AuthUser,
        employee_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: Option<String>,
        leave_type: LeaveType,
    ) -> ApiResult<LeaveResponse> {
        let mut tx = self.pool.begin().await?;

        let mut employee = users::find_by_id_for_update(&mut *tx, employee_id)
            .await?
            .ok_or_else(|| ApiError::not_found(ERROR_EMPLOYEE_NOT_FOUND))?;

        policy::authorize(
            actor,
            Action::CreateForManaged,
            Some(&ActionTarget {
                owner_id: employee.id,
                owner_manager_id: employee.manager_id,
            }),
        )?;

        let days = reserve(&mut employee, start_date, end_date)?;
        users::update_balance(&mut *tx, employee.id, employee.remaining_al).await?;

        let leave_id = leaves::insert(
            &mut *tx,
            &NewLeave {
                user_id: employee.id,
                start_date,
                end_date,
                reason,
                status: LeaveStatus::Pending.to_string(),
                leave_type: leave_type.to_string(),
            },
        )
        .await?;

        let row = load_row(&mut tx, leave_id).await?;
        tx.commit().await?;

        info!(
            leave_id,
            user_id = employee.id,
            manager_id = actor.uid,
            days,
            "Leave request created for report"
        );
        Ok(LeaveResponse::from(row))
    }

    /// Approve or reject a pending request. Admin, or the manager the owner
    /// reports to. Rejection returns the reserved days in the same
    /// transaction as the status write.
    pub async fn update_status(
        &self,
        actor: &AuthUser,
        leave_id: u64,
        status: LeaveStatus,
    ) -> ApiResult<LeaveResponse> {
        if !matches!(status, LeaveStatus::Approved | LeaveStatus::Rejected) {
            return Err(ApiError::validation("Status must be approved or rejected"));
        }

        let mut tx = self.pool.begin().await?;

        let leave = leaves::find_with_owner_for_update(&mut *tx, leave_id)
            .await?
            .ok_or_else(|| ApiError::not_found(ERROR_LEAVE_NOT_FOUND))?;

        policy::authorize(actor, Action::UpdateStatus, Some(&target_of(&leave)))?;

        let current = parse_status(&leave.status)?;
        if !current.can_transition_to(status) {
            return Err(ApiError::conflict(ERROR_ALREADY_PROCESSED));
        }

        if status == LeaveStatus::Rejected {
            let mut owner = users::find_by_id(&mut *tx, leave.user_id)
                .await?
                .ok_or_else(|| ApiError::not_found(ERROR_USER_NOT_FOUND))?;
            release(&mut owner, leave.start_date, leave.end_date)?;
            users::update_balance(&mut *tx, owner.id, owner.remaining_al).await?;
        }

        leaves::update_status(&mut *tx, leave_id, &status.to_string()).await?;
        let row = load_row(&mut tx, leave_id).await?;
        tx.commit().await?;

        info!(leave_id, user_id = leave.user_id, status = %status, "Leave status updated");
        Ok(LeaveResponse::from(row))
    }

    /// Owner self-service: cancel the request, or move its dates while it is
    /// still pending. A status in the payload wins over date fields, and the
    /// only status this channel accepts is `canceled`.
    pub async fn update_own(
        &self,
        actor: &AuthUser,
        leave_id: u64,
        status: Option<LeaveStatus>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> ApiResult<LeaveResponse> {
        let mut tx = self.pool.begin().await?;

        let leave = leaves::find_with_owner_for_update(&mut *tx, leave_id)
            .await?
            .ok_or_else(|| ApiError::not_found(ERROR_LEAVE_NOT_FOUND))?;

        let current = parse_status(&leave.status)?;

        if let Some(requested) = status {
            if requested != LeaveStatus::Canceled {
                return Err(ApiError::forbidden(policy::ERROR_UNAUTHORIZED_ACTION));
            }
            policy::authorize(actor, Action::Cancel, Some(&target_of(&leave)))?;

            if plan_cancellation(current)? {
                let mut owner = users::find_by_id(&mut *tx, leave.user_id)
                    .await?
                    .ok_or_else(|| ApiError::not_found(ERROR_USER_NOT_FOUND))?;
                release(&mut owner, leave.start_date, leave.end_date)?;
                users::update_balance(&mut *tx, owner.id, owner.remaining_al).await?;
            }

            leaves::update_status(&mut *tx, leave_id, &LeaveStatus::Canceled.to_string()).await?;
            let row = load_row(&mut tx, leave_id).await?;
            tx.commit().await?;

            info!(leave_id, user_id = leave.user_id, "Leave request canceled");
            return Ok(LeaveResponse::from(row));
        }

        policy::authorize(actor, Action::EditDates, Some(&target_of(&leave)))?;

        let new_start = start_date.unwrap_or(leave.start_date);
        let new_end = end_date.unwrap_or(leave.end_date);
        if new_start == leave.start_date && new_end == leave.end_date {
            return Err(ApiError::no_change(ERROR_NO_CHANGES));
        }

        if current != LeaveStatus::Pending {
            return Err(ApiError::conflict(ERROR_NOT_PENDING_EDIT));
        }

        let mut owner = users::find_by_id(&mut *tx, leave.user_id)
            .await?
            .ok_or_else(|| ApiError::not_found(ERROR_USER_NOT_FOUND))?;
        release(&mut owner, leave.start_date, leave.end_date)?;
        reserve(&mut owner, new_start, new_end)?;
        users::update_balance(&mut *tx, owner.id, owner.remaining_al).await?;
        leaves::update_dates(&mut *tx, leave_id, new_start, new_end).await?;

        let row = load_row(&mut tx, leave_id).await?;
        tx.commit().await?;

        info!(leave_id, user_id = leave.user_id, "Leave dates updated");
        Ok(LeaveResponse::from(row))
    }

    /// Removes the request and returns any still-held days. Owner only.
    pub async fn delete_own(&self, actor: &AuthUser, leave_id: u64) -> ApiResult<()> {
        let mut tx = self.pool.begin().await?;

        let leave = leaves::find_with_owner_for_update(&mut *tx, leave_id)
            .await?
            .ok_or_else(|| ApiError::not_found(ERROR_LEAVE_NOT_FOUND))?;

        policy::authorize(actor, Action::Delete, Some(&target_of(&leave)))?;

        let current = parse_status(&leave.status)?;
        if current.holds_days() {
            let mut owner = users::find_by_id(&mut *tx, leave.user_id)
                .await?
                .ok_or_else(|| ApiError::not_found(ERROR_USER_NOT_FOUND))?;
            release(&mut owner, leave.start_date, leave.end_date)?;
            users::update_balance(&mut *tx, owner.id, owner.remaining_al).await?;
        }

        let affected = leaves::delete(&mut *tx, leave_id).await?;
        if affected == 0 {
            return Err(ApiError::not_found(ERROR_LEAVE_NOT_FOUND));
        }
        tx.commit().await?;

        info!(leave_id, user_id = leave.user_id, "Leave request deleted");
        Ok(())
    }

    /// Admin sees every request; a manager sees their reports' requests.
    pub async fn list_all(&self, actor: &AuthUser) -> ApiResult<Vec<LeaveResponse>> {
        policy::authorize(actor, Action::ListAll, None)?;

        let rows = match actor.role {
            Role::Admin => leaves::list_all(&self.pool).await?,
            Role::Manager => leaves::list_for_manager(&self.pool, actor.uid).await?,
            Role::Staff => return Err(ApiError::forbidden(policy::ERROR_UNAUTHORIZED_ACTION)),
        };

        Ok(rows.into_iter().map(LeaveResponse::from).collect())
    }

    pub async fn list_own(&self, actor: &AuthUser) -> ApiResult<Vec<LeaveResponse>> {
        let own = ActionTarget {
            owner_id: actor.uid,
            owner_manager_id: None,
        };
        policy::authorize(actor, Action::ViewOwn, Some(&own))?;

        let rows = leaves::list_for_owner(&self.pool, actor.uid).await?;
        Ok(rows.into_iter().map(LeaveResponse::from).collect())
    }

    pub async fn get_own(&self, actor: &AuthUser, leave_id: u64) -> ApiResult<LeaveRecord> {
        let own = ActionTarget {
            owner_id: actor.uid,
            owner_manager_id: None,
        };
        policy::authorize(actor, Action::ViewOwn, Some(&own))?;

        leaves::find_own(&self.pool, leave_id, actor.uid)
            .await?
            .ok_or_else(|| {
                ApiError::not_found(format!("Error retrieving leave with id: {leave_id}"))
            })
    }

    /// Admin-only: put a user's balance back to their initial allotment.
    pub async fn reset_annual_leave(&self, actor: &AuthUser, user_id: u64) -> ApiResult<UserResponse> {
        policy::authorize(actor, Action::ResetBalance, None)?;

        let mut tx = self.pool.begin().await?;

        let mut user = users::find_by_id_for_update(&mut *tx, user_id)
            .await?
            .ok_or_else(|| ApiError::not_found(ERROR_USER_NOT_FOUND))?;

        ledger::reset_to_initial(&mut user);
        users::update_balance(&mut *tx, user.id, user.remaining_al).await?;

        let row = users::find_by_id_with_role(&mut *tx, user_id)
            .await?
            .ok_or_else(|| ApiError::internal(format!("User {user_id} vanished mid-reset")))?;
        tx.commit().await?;

        info!(user_id, remaining_al = user.remaining_al, "Annual leave reset");
        Ok(UserResponse::from(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn owner(remaining: i32) -> UserRecord {
        UserRecord {
            id: 7,
            firstname: "Jane".into(),
            surname: "Doe".into(),
            email: "jane.doe@example.com".into(),
            password_hash: String::new(),
            role_id: 3,
            manager_id: Some(2),
            initial_al_total: 25,
            remaining_al: remaining,
        }
    }

    #[test]
    fn reserve_checks_order_and_balance() {
        let mut user = owner(25);
        assert_eq!(
            reserve(&mut user, date(2000, 1, 1), date(2000, 1, 12)).unwrap(),
            12
        );
        assert_eq!(user.remaining_al, 13);

        let err = reserve(&mut user, date(2000, 2, 10), date(2000, 2, 1)).unwrap_err();
        assert_eq!(err.to_string(), ledger::ERROR_INVALID_DATE_RANGE);
        assert_eq!(user.remaining_al, 13);

        let err = reserve(&mut user, date(2000, 3, 1), date(2000, 3, 14)).unwrap_err();
        assert_eq!(err.to_string(), ledger::ERROR_EXCEEDS_BALANCE);
        assert_eq!(user.remaining_al, 13);
    }

    #[test]
    fn release_reverses_a_reserve_exactly() {
        let mut user = owner(25);
        reserve(&mut user, date(2000, 1, 1), date(2000, 1, 12)).unwrap();
        release(&mut user, date(2000, 1, 1), date(2000, 1, 12)).unwrap();
        assert_eq!(user.remaining_al, 25);
    }

    #[test]
    fn date_edit_swaps_the_reservation() {
        let mut user = owner(25);
        reserve(&mut user, date(2000, 1, 1), date(2000, 1, 12)).unwrap();
        assert_eq!(user.remaining_al, 13);

        // move the leave to a 3-day span
        release(&mut user, date(2000, 1, 1), date(2000, 1, 12)).unwrap();
        reserve(&mut user, date(2000, 2, 1), date(2000, 2, 3)).unwrap();
        assert_eq!(user.remaining_al, 22);
    }

    #[test]
    fn canceling_twice_is_rejected_with_the_balance_untouched() {
        let mut user = owner(25);
        reserve(&mut user, date(2000, 1, 1), date(2000, 1, 12)).unwrap();
        assert_eq!(user.remaining_al, 13);

        // First cancel releases the held days.
        assert!(plan_cancellation(LeaveStatus::Pending).unwrap());
        release(&mut user, date(2000, 1, 1), date(2000, 1, 12)).unwrap();
        assert_eq!(user.remaining_al, 25);

        // Second cancel is refused before any balance math runs.
        let err = plan_cancellation(LeaveStatus::Canceled).unwrap_err();
        assert_eq!(err.to_string(), ERROR_ALREADY_CANCELED);
        assert_eq!(user.remaining_al, 25);
    }

    #[test]
    fn cancellation_releases_only_held_days() {
        assert!(plan_cancellation(LeaveStatus::Pending).unwrap());
        assert!(plan_cancellation(LeaveStatus::Approved).unwrap());
        // Rejection already returned the days.
        assert!(!plan_cancellation(LeaveStatus::Rejected).unwrap());
    }

    #[test]
    fn stored_statuses_parse_back() {
        assert_eq!(parse_status("pending").unwrap(), LeaveStatus::Pending);
        assert_eq!(parse_status("canceled").unwrap(), LeaveStatus::Canceled);
        let err = parse_status("on-hold").unwrap_err();
        assert_eq!(
            err.status_code(),
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
