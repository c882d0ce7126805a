use chrono::NaiveDate;
use sqlx::MySqlExecutor;

use crate::model::leave_request::{LeaveRecord, LeaveWithOwner};

const LEAVE_WITH_OWNER: &str = r#"
    SELECT l.id, l.user_id, l.start_date, l.end_date, l.reason, l.status,
           l.leave_type, l.created_at, l.updated_at,
           u.firstname AS owner_firstname, u.surname AS owner_surname,
           u.email AS owner_email, u.manager_id AS owner_manager_id,
           u.remaining_al AS owner_remaining_al
    FROM leave_requests l
    INNER JOIN users u ON u.id = l.user_id
"#;

/// Insert payload for a new leave row.
pub struct NewLeave {
    pub user_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub status: String,
    pub leave_type: String,
}

pub async fn find_with_owner(
    ex: impl MySqlExecutor<'_>,
    id: u64,
) -> Result<Option<LeaveWithOwner>, sqlx::Error> {
    let sql = format!("{LEAVE_WITH_OWNER} WHERE l.id = ?");
    sqlx::query_as::<_, LeaveWithOwner>(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await
}

/// Same as `find_with_owner` but locks the leave row and its owner's user
/// row. Must run inside a transaction; status checks and balance math that
/// follow are then serialized against concurrent writers.
pub async fn find_with_owner_for_update(
    ex: impl MySqlExecutor<'_>,
    id: u64,
) -> Result<Option<LeaveWithOwner>, sqlx::Error> {
    let sql = format!("{LEAVE_WITH_OWNER} WHERE l.id = ? FOR UPDATE");
    sqlx::query_as::<_, LeaveWithOwner>(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await
}

pub async fn list_all(ex: impl MySqlExecutor<'_>) -> Result<Vec<LeaveWithOwner>, sqlx::Error> {
    let sql = format!("{LEAVE_WITH_OWNER} ORDER BY l.created_at DESC");
    sqlx::query_as::<_, LeaveWithOwner>(&sql).fetch_all(ex).await
}

/// All requests whose owner reports to `manager_id`.
pub async fn list_for_manager(
    ex: impl MySqlExecutor<'_>,
    manager_id: u64,
) -> Result<Vec<LeaveWithOwner>, sqlx::Error> {
    let sql = format!("{LEAVE_WITH_OWNER} WHERE u.manager_id = ? ORDER BY l.created_at DESC");
    sqlx::query_as::<_, LeaveWithOwner>(&sql)
        .bind(manager_id)
        .fetch_all(ex)
        .await
}

pub async fn list_for_owner(
    ex: impl MySqlExecutor<'_>,
    owner_id: u64,
) -> Result<Vec<LeaveWithOwner>, sqlx::Error> {
    let sql = format!("{LEAVE_WITH_OWNER} WHERE l.user_id = ? ORDER BY l.created_at DESC");
    sqlx::query_as::<_, LeaveWithOwner>(&sql)
        .bind(owner_id)
        .fetch_all(ex)
        .await
}

/// One request, but only if `owner_id` owns it.
pub async fn find_own(
    ex: impl MySqlExecutor<'_>,
    id: u64,
    owner_id: u64,
) -> Result<Option<LeaveRecord>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRecord>(
        r#"
        SELECT id, user_id, start_date, end_date, reason, status, leave_type,
               created_at, updated_at
        FROM leave_requests
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(ex)
    .await
}

pub async fn insert(ex: impl MySqlExecutor<'_>, leave: &NewLeave) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (user_id, start_date, end_date, reason, status, leave_type,
             created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, NOW(), NOW())
        "#,
    )
    .bind(leave.user_id)
    .bind(leave.start_date)
    .bind(leave.end_date)
    .bind(&leave.reason)
    .bind(&leave.status)
    .bind(&leave.leave_type)
    .execute(ex)
    .await?;

    Ok(result.last_insert_id())
}

pub async fn update_status(
    ex: impl MySqlExecutor<'_>,
    id: u64,
    status: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE leave_requests SET status = ?, updated_at = NOW() WHERE id = ?")
        .bind(status)
        .bind(id)
        .execute(ex)
        .await?;

    Ok(result.rows_affected())
}

pub async fn update_dates(
    ex: impl MySqlExecutor<'_>,
    id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE leave_requests SET start_date = ?, end_date = ?, updated_at = NOW() WHERE id = ?",
    )
    .bind(start_date)
    .bind(end_date)
    .bind(id)
    .execute(ex)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete(ex: impl MySqlExecutor<'_>, id: u64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM leave_requests WHERE id = ?")
        .bind(id)
        .execute(ex)
        .await?;

    Ok(result.rows_affected())
}
