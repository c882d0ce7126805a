use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle status of a leave request. Stored as the lowercase string in
/// the `status` column.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Canceled,
}

impl LeaveStatus {
    /// The transitions the service will perform. `canceled` is terminal;
    /// approve/reject only ever leave `pending`.
    pub fn can_transition_to(self, next: LeaveStatus) -> bool {
        use LeaveStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Pending, Canceled)
                | (Approved, Canceled)
                | (Rejected, Canceled)
        )
    }

    /// Whether a request in this status still holds days out of the owner's
    /// balance. Rejection and cancellation return the days, so a rejected or
    /// canceled request holds nothing and must not be refunded again.
    pub fn holds_days(self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, Serialize, Deserialize, ToSchema)]
pub enum LeaveType {
    #[strum(serialize = "Annual Leave")]
    #[serde(rename = "Annual Leave")]
    Annual,
}

impl Default for LeaveType {
    fn default() -> Self {
        LeaveType::Annual
    }
}

/// A `leave_requests` row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LeaveRecord {
    pub id: u64,
    pub user_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub status: String,
    pub leave_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A leave row joined with the columns of its owner that authorization and
/// balance accounting need.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeaveWithOwner {
    pub id: u64,
    pub user_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub status: String,
    pub leave_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_firstname: String,
    pub owner_surname: String,
    pub owner_email: String,
    pub owner_manager_id: Option<u64>,
    pub owner_remaining_al: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveOwner {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = "Jane")]
    pub firstname: String,
    #[schema(example = "Doe")]
    pub surname: String,
    #[schema(example = "jane.doe@example.com")]
    pub email: String,
    #[schema(example = 13)]
    pub remaining_al: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    pub id: u64,
    pub user: LeaveOwner,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family trip")]
    pub reason: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = "Annual Leave")]
    pub leave_type: String,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl From<LeaveWithOwner> for LeaveResponse {
    fn from(row: LeaveWithOwner) -> Self {
        LeaveResponse {
            id: row.id,
            user: LeaveOwner {
                id: row.user_id,
                firstname: row.owner_firstname,
                surname: row.owner_surname,
                email: row.owner_email,
                remaining_al: row.owner_remaining_al,
            },
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            status: row.status,
            leave_type: row.leave_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        assert_eq!(LeaveStatus::Pending.to_string(), "pending");
        assert_eq!(LeaveStatus::Canceled.to_string(), "canceled");
        assert_eq!("approved".parse::<LeaveStatus>(), Ok(LeaveStatus::Approved));
        assert_eq!("rejected".parse::<LeaveStatus>(), Ok(LeaveStatus::Rejected));
        assert!("deleted".parse::<LeaveStatus>().is_err());
    }

    #[test]
    fn leave_type_uses_display_name() {
        assert_eq!(LeaveType::Annual.to_string(), "Annual Leave");
        assert_eq!("Annual Leave".parse::<LeaveType>(), Ok(LeaveType::Annual));
    }

    #[test]
    fn approve_and_reject_only_leave_pending() {
        use LeaveStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Canceled.can_transition_to(Approved));
    }

    #[test]
    fn canceled_is_terminal() {
        use LeaveStatus::*;
        assert!(Pending.can_transition_to(Canceled));
        assert!(Approved.can_transition_to(Canceled));
        assert!(Rejected.can_transition_to(Canceled));
        assert!(!Canceled.can_transition_to(Canceled));
        assert!(!Canceled.can_transition_to(Pending));
    }

    #[test]
    fn only_open_requests_hold_days() {
        assert!(LeaveStatus::Pending.holds_days());
        assert!(LeaveStatus::Approved.holds_days());
        assert!(!LeaveStatus::Rejected.holds_days());
        assert!(!LeaveStatus::Canceled.holds_days());
    }
}
