use sqlx::{MySqlExecutor, MySqlPool};
use tracing::info;

use crate::model::role::RoleRecord;

pub async fn find_by_id(
    ex: impl MySqlExecutor<'_>,
    id: u8,
) -> Result<Option<RoleRecord>, sqlx::Error> {
    sqlx::query_as::<_, RoleRecord>("SELECT id, name FROM roles WHERE id = ?")
        .bind(id)
        .fetch_optional(ex)
        .await
}

pub async fn list_all(ex: impl MySqlExecutor<'_>) -> Result<Vec<RoleRecord>, sqlx::Error> {
    sqlx::query_as::<_, RoleRecord>("SELECT id, name FROM roles ORDER BY id")
        .fetch_all(ex)
        .await
}

pub async fn insert(ex: impl MySqlExecutor<'_>, name: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO roles (name) VALUES (?)")
        .bind(name)
        .execute(ex)
        .await?;

    Ok(result.last_insert_id())
}

pub async fn update_name(
    ex: impl MySqlExecutor<'_>,
    id: u8,
    name: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE roles SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(ex)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete(ex: impl MySqlExecutor<'_>, id: u8) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM roles WHERE id = ?")
        .bind(id)
        .execute(ex)
        .await?;

    Ok(result.rows_affected())
}

/// Seeds the convention roles (admin=1, manager=2, staff=3) if missing.
/// Runs at startup; existing rows are left untouched.
pub async fn ensure_default_roles(pool: &MySqlPool) -> anyhow::Result<()> {
    let result = sqlx::query(
        "INSERT IGNORE INTO roles (id, name) VALUES (1, 'admin'), (2, 'manager'), (3, 'staff')",
    )
    .execute(pool)
    .await?;

    info!(
        inserted = result.rows_affected(),
        "Default roles ensured"
    );
    Ok(())
}
