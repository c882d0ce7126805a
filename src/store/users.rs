use sqlx::MySqlExecutor;

use crate::model::user::{UserRecord, UserWithRole};

const USER_COLUMNS: &str = "id, firstname, surname, email, password_hash, role_id, manager_id, \
                            initial_al_total, remaining_al";

// Role-joined selection, deliberately without the password column.
const USER_WITH_ROLE_COLUMNS: &str =
    "u.id, u.firstname, u.surname, u.email, u.role_id, r.name AS role_name, u.manager_id, \
     u.initial_al_total, u.remaining_al";

/// Insert payload for a new user row.
pub struct NewUser {
    pub firstname: String,
    pub surname: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: u8,
    pub manager_id: Option<u64>,
    pub initial_al_total: i32,
    pub remaining_al: i32,
}

pub async fn find_by_id(
    ex: impl MySqlExecutor<'_>,
    id: u64,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    sqlx::query_as::<_, UserRecord>(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await
}

/// Same as `find_by_id` but takes a row lock. Must run inside a transaction;
/// every balance mutation goes through this to serialize concurrent writers
/// per user.
pub async fn find_by_id_for_update(
    ex: impl MySqlExecutor<'_>,
    id: u64,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ? FOR UPDATE");
    sqlx::query_as::<_, UserRecord>(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await
}

pub async fn find_by_email(
    ex: impl MySqlExecutor<'_>,
    email: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
    sqlx::query_as::<_, UserRecord>(&sql)
        .bind(email)
        .fetch_optional(ex)
        .await
}

pub async fn find_by_id_with_role(
    ex: impl MySqlExecutor<'_>,
    id: u64,
) -> Result<Option<UserWithRole>, sqlx::Error> {
    let sql = format!(
        "SELECT {USER_WITH_ROLE_COLUMNS} FROM users u \
         INNER JOIN roles r ON r.id = u.role_id WHERE u.id = ?"
    );
    sqlx::query_as::<_, UserWithRole>(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await
}

pub async fn find_by_email_with_role(
    ex: impl MySqlExecutor<'_>,
    email: &str,
) -> Result<Option<UserWithRole>, sqlx::Error> {
    let sql = format!(
        "SELECT {USER_WITH_ROLE_COLUMNS} FROM users u \
         INNER JOIN roles r ON r.id = u.role_id WHERE u.email = ?"
    );
    sqlx::query_as::<_, UserWithRole>(&sql)
        .bind(email)
        .fetch_optional(ex)
        .await
}

pub async fn list_all_with_role(
    ex: impl MySqlExecutor<'_>,
) -> Result<Vec<UserWithRole>, sqlx::Error> {
    let sql = format!(
        "SELECT {USER_WITH_ROLE_COLUMNS} FROM users u \
         INNER JOIN roles r ON r.id = u.role_id ORDER BY u.id"
    );
    sqlx::query_as::<_, UserWithRole>(&sql).fetch_all(ex).await
}

pub async fn insert(ex: impl MySqlExecutor<'_>, user: &NewUser) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO users
            (firstname, surname, email, password_hash, role_id, manager_id,
             initial_al_total, remaining_al)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.firstname)
    .bind(&user.surname)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role_id)
    .bind(user.manager_id)
    .bind(user.initial_al_total)
    .bind(user.remaining_al)
    .execute(ex)
    .await?;

    Ok(result.last_insert_id())
}

/// Writes every mutable column of the row back. Returns rows affected.
pub async fn save(ex: impl MySqlExecutor<'_>, user: &UserRecord) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET firstname = ?, surname = ?, email = ?, password_hash = ?,
            role_id = ?, manager_id = ?, initial_al_total = ?, remaining_al = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.firstname)
    .bind(&user.surname)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role_id)
    .bind(user.manager_id)
    .bind(user.initial_al_total)
    .bind(user.remaining_al)
    .bind(user.id)
    .execute(ex)
    .await?;

    Ok(result.rows_affected())
}

pub async fn update_balance(
    ex: impl MySqlExecutor<'_>,
    id: u64,
    remaining_al: i32,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET remaining_al = ? WHERE id = ?")
        .bind(remaining_al)
        .bind(id)
        .execute(ex)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete(ex: impl MySqlExecutor<'_>, id: u64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(ex)
        .await?;

    Ok(result.rows_affected())
}

/// Every (user id, manager id) edge, for reporting-cycle checks.
pub async fn manager_edges(
    ex: impl MySqlExecutor<'_>,
) -> Result<Vec<(u64, Option<u64>)>, sqlx::Error> {
    sqlx::query_as::<_, (u64, Option<u64>)>("SELECT id, manager_id FROM users")
        .fetch_all(ex)
        .await
}
