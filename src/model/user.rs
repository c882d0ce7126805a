use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::model::role::RoleRecord;

pub const DEFAULT_INITIAL_AL: i32 = 25;
pub const MIN_PASSWORD_LEN: usize = 10;

/// A `users` row. The argon2 PHC string in `password_hash` embeds its salt
/// and never leaves the server.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: u64,
    pub firstname: String,
    pub surname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role_id: u8,
    pub manager_id: Option<u64>,
    pub initial_al_total: i32,
    pub remaining_al: i32,
}

/// A user joined with its role name. Selected without the password column
/// so the hash never even reaches this type.
#[derive(Debug, sqlx::FromRow)]
pub struct UserWithRole {
    pub id: u64,
    pub firstname: String,
    pub surname: String,
    pub email: String,
    pub role_id: u8,
    pub role_name: String,
    pub manager_id: Option<u64>,
    pub initial_al_total: i32,
    pub remaining_al: i32,
}

/// Client-facing view of a user.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = "Jane")]
    pub firstname: String,
    #[schema(example = "Doe")]
    pub surname: String,
    #[schema(example = "jane.doe@example.com")]
    pub email: String,
    pub role: RoleRecord,
    pub manager_id: Option<u64>,
    #[schema(example = 25)]
    pub initial_al_total: i32,
    #[schema(example = 13)]
    pub remaining_al: i32,
}

impl From<UserWithRole> for UserResponse {
    fn from(user: UserWithRole) -> Self {
        UserResponse {
            id: user.id,
            firstname: user.firstname,
            surname: user.surname,
            email: user.email,
            role: RoleRecord {
                id: user.role_id,
                name: user.role_name,
            },
            manager_id: user.manager_id,
            initial_al_total: user.initial_al_total,
            remaining_al: user.remaining_al,
        }
    }
}

/// Structural email check; real deliverability is not this service's problem.
pub fn validate_email(email: &str) -> ApiResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ApiError::validation("Invalid email address"))
    }
}

pub fn validate_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(
            "Password must be at least 10 characters long",
        ));
    }
    Ok(())
}

pub fn validate_name(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} must not be blank")));
    }
    Ok(())
}

pub fn validate_al_total(value: i32) -> ApiResult<()> {
    if value < 0 {
        return Err(ApiError::validation(
            "Annual leave totals must not be negative",
        ));
    }
    Ok(())
}

/// Whether assigning `manager_id` as `user_id`'s manager would close a
/// reporting loop, i.e. the chain upward from the candidate reaches the
/// user. Self-management counts. `manager_edges` maps each user id to its
/// current manager id; the walk is bounded by the edge count so a chain
/// corrupted outside this service cannot spin forever.
pub fn creates_reporting_cycle(
    user_id: u64,
    manager_id: u64,
    manager_edges: &HashMap<u64, Option<u64>>,
) -> bool {
    let mut cursor = Some(manager_id);
    let mut hops = 0;
    while let Some(current) = cursor {
        if current == user_id {
            return true;
        }
        hops += 1;
        if hops > manager_edges.len() {
            return true;
        }
        cursor = manager_edges.get(&current).copied().flatten();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> UserRecord {
        UserRecord {
            id: 1,
            firstname: "Jane".into(),
            surname: "Doe".into(),
            email: "jane.doe@example.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$hash".into(),
            role_id: 3,
            manager_id: Some(2),
            initial_al_total: 25,
            remaining_al: 25,
        }
    }

    fn edges(pairs: &[(u64, Option<u64>)]) -> HashMap<u64, Option<u64>> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("jane.doe@example.com").is_ok());
        assert!(validate_email("j@d.io").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("jane@").is_err());
        assert!(validate_email("jane@nodot").is_err());
        assert!(validate_email("jane@.com").is_err());
        assert!(validate_email("ja ne@example.com").is_err());
    }

    #[test]
    fn password_length_floor_is_ten() {
        assert!(validate_password("123456789").is_err());
        assert!(validate_password("1234567890").is_ok());
    }

    #[test]
    fn al_totals_must_be_non_negative() {
        assert!(validate_al_total(0).is_ok());
        assert!(validate_al_total(25).is_ok());
        assert!(validate_al_total(-1).is_err());
    }

    #[test]
    fn response_never_carries_the_hash() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json.get("remaining_al").unwrap(), 25);
    }

    #[test]
    fn response_embeds_the_role() {
        let row = UserWithRole {
            id: 1,
            firstname: "Jane".into(),
            surname: "Doe".into(),
            email: "jane.doe@example.com".into(),
            role_id: 3,
            role_name: "staff".into(),
            manager_id: Some(2),
            initial_al_total: 25,
            remaining_al: 13,
        };

        let json = serde_json::to_value(UserResponse::from(row)).unwrap();
        assert_eq!(json["role"]["id"], 3);
        assert_eq!(json["role"]["name"], "staff");
        assert_eq!(json["remaining_al"], 13);
    }

    #[test]
    fn self_management_is_a_cycle() {
        let map = edges(&[(1, None)]);
        assert!(creates_reporting_cycle(1, 1, &map));
    }

    #[test]
    fn two_node_loop_is_a_cycle() {
        // 2 already reports to 1; making 2 manage 1 closes the loop.
        let map = edges(&[(1, None), (2, Some(1))]);
        assert!(creates_reporting_cycle(1, 2, &map));
    }

    #[test]
    fn long_chain_back_to_the_user_is_a_cycle() {
        let map = edges(&[(1, None), (2, Some(1)), (3, Some(2)), (4, Some(3))]);
        assert!(creates_reporting_cycle(1, 4, &map));
    }

    #[test]
    fn unrelated_chains_are_not_cycles() {
        let map = edges(&[(1, None), (2, Some(1)), (3, None), (4, Some(3))]);
        assert!(!creates_reporting_cycle(2, 4, &map));
        assert!(!creates_reporting_cycle(4, 1, &map));
    }

    #[test]
    fn corrupt_chains_terminate_and_report_a_cycle() {
        // 3 and 4 loop between themselves; hop bound trips.
        let map = edges(&[(3, Some(4)), (4, Some(3))]);
        assert!(creates_reporting_cycle(1, 3, &map));
    }
}
