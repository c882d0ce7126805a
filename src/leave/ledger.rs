use chrono::NaiveDate;

use crate::error::{ApiError, ApiResult};
use crate::model::user::UserRecord;

pub const ERROR_INVALID_DATE_RANGE: &str = "Invalid start or end date";
pub const ERROR_EXCEEDS_BALANCE: &str = "Dates provided are greater than allowed AL";

/// Inclusive day count of a leave span. `start` and `end` are calendar
/// dates; a single-day leave (start == end) counts as 1. Chronological order
/// is required at every call site.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> ApiResult<i32> {
    let days = end.signed_duration_since(start).num_days() + 1;
    if days <= 0 {
        return Err(ApiError::conflict(ERROR_INVALID_DATE_RANGE));
    }
    i32::try_from(days).map_err(|_| ApiError::conflict(ERROR_INVALID_DATE_RANGE))
}

/// Takes `days` out of the user's balance. Fails without touching the user
/// when the balance is insufficient; `remaining_al` can never go negative
/// through this path.
pub fn apply_deduction(user: &mut UserRecord, days: i32) -> ApiResult<i32> {
    if days <= 0 {
        return Err(ApiError::conflict(ERROR_INVALID_DATE_RANGE));
    }
    if user.remaining_al < days {
        return Err(ApiError::conflict(ERROR_EXCEEDS_BALANCE));
    }
    user.remaining_al -= days;
    Ok(user.remaining_al)
}

/// Returns `days` to the user's balance. Never fails, and is not capped at
/// `initial_al_total`: whether repeated restorations should clamp there is
/// an open product question. `days` must come from `days_between`.
pub fn apply_restoration(user: &mut UserRecord, days: i32) -> i32 {
    user.remaining_al = user.remaining_al.saturating_add(days);
    user.remaining_al
}

/// Administrative reset: balance goes back to the initial allotment.
pub fn reset_to_initial(user: &mut UserRecord) -> i32 {
    user.remaining_al = user.initial_al_total;
    user.remaining_al
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn user_with_balance(initial: i32, remaining: i32) -> UserRecord {
        UserRecord {
            id: 1,
            firstname: "Jane".into(),
            surname: "Doe".into(),
            email: "jane.doe@example.com".into(),
            password_hash: String::new(),
            role_id: 3,
            manager_id: Some(2),
            initial_al_total: initial,
            remaining_al: remaining,
        }
    }

    #[test]
    fn day_count_is_inclusive() {
        assert_eq!(
            days_between(date(2000, 1, 1), date(2000, 1, 12)).unwrap(),
            12
        );
        assert_eq!(days_between(date(2000, 1, 1), date(2000, 1, 1)).unwrap(), 1);
        assert_eq!(days_between(date(2000, 1, 1), date(2000, 1, 2)).unwrap(), 2);
    }

    #[test]
    fn day_count_spans_month_and_leap_boundaries() {
        assert_eq!(
            days_between(date(2024, 2, 28), date(2024, 3, 1)).unwrap(),
            3
        );
        assert_eq!(
            days_between(date(2023, 2, 28), date(2023, 3, 1)).unwrap(),
            2
        );
        assert_eq!(
            days_between(date(2025, 12, 29), date(2026, 1, 2)).unwrap(),
            5
        );
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = days_between(date(2000, 1, 12), date(2000, 1, 1)).unwrap_err();
        assert_eq!(err.to_string(), ERROR_INVALID_DATE_RANGE);
    }

    #[test]
    fn deduction_reduces_balance() {
        let mut user = user_with_balance(25, 25);
        assert_eq!(apply_deduction(&mut user, 12).unwrap(), 13);
        assert_eq!(user.remaining_al, 13);
    }

    #[test]
    fn deduction_over_balance_fails_without_mutation() {
        let mut user = user_with_balance(25, 10);
        let err = apply_deduction(&mut user, 11).unwrap_err();
        assert_eq!(err.to_string(), ERROR_EXCEEDS_BALANCE);
        assert_eq!(user.remaining_al, 10);
    }

    #[test]
    fn deduction_may_drain_balance_to_zero() {
        let mut user = user_with_balance(25, 10);
        assert_eq!(apply_deduction(&mut user, 10).unwrap(), 0);
        assert_eq!(user.remaining_al, 0);
    }

    #[test]
    fn non_positive_day_counts_are_rejected() {
        let mut user = user_with_balance(25, 25);
        assert!(apply_deduction(&mut user, 0).is_err());
        assert!(apply_deduction(&mut user, -3).is_err());
        assert_eq!(user.remaining_al, 25);
    }

    #[test]
    fn restoration_is_uncapped() {
        let mut user = user_with_balance(25, 25);
        assert_eq!(apply_restoration(&mut user, 5), 30);
        assert_eq!(user.remaining_al, 30);
    }

    #[test]
    fn deduct_then_restore_returns_to_baseline() {
        let mut user = user_with_balance(25, 25);
        let days = days_between(date(2000, 1, 1), date(2000, 1, 12)).unwrap();
        apply_deduction(&mut user, days).unwrap();
        assert_eq!(user.remaining_al, 13);
        apply_restoration(&mut user, days);
        assert_eq!(user.remaining_al, 25);
    }

    #[test]
    fn rejecting_five_days_restores_them() {
        let mut user = user_with_balance(25, 10);
        apply_restoration(&mut user, 5);
        assert_eq!(user.remaining_al, 15);
    }

    #[test]
    fn reset_goes_back_to_initial_regardless_of_balance() {
        let mut low = user_with_balance(25, 3);
        assert_eq!(reset_to_initial(&mut low), 25);

        let mut inflated = user_with_balance(25, 31);
        assert_eq!(reset_to_initial(&mut inflated), 25);
        assert_eq!(inflated.remaining_al, 25);
    }
}
