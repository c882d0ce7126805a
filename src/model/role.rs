use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};

pub const ROLE_NAME_MAX_LEN: usize = 30;

/// Role identity drives authorization. Ids are fixed by convention and match
/// the seeded rows in the `roles` table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Role {
    Admin = 1,
    Manager = 2,
    Staff = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Manager),
            3 => Some(Role::Staff),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct RoleRecord {
    #[schema(example = 2)]
    pub id: u8,
    #[schema(example = "manager")]
    pub name: String,
}

/// Role names are short labels: non-blank, no surrounding whitespace,
/// at most `ROLE_NAME_MAX_LEN` characters.
pub fn validate_role_name(name: &str) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(ApiError::validation("Role name must not be blank"));
    }
    if name != name.trim() {
        return Err(ApiError::validation(
            "Role name must not have leading or trailing whitespace",
        ));
    }
    if name.chars().count() > ROLE_NAME_MAX_LEN {
        return Err(ApiError::validation(
            "Role name must not exceed 30 characters",
        ));
    }
    Ok(())
}
