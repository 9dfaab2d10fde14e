//! Schema creation and in-place migration.
//!
//! New installations get the full schema on first connect. Databases
//! created by an older build are missing `locked_by`/`locked_at`/
//! `next_retry_at` and `priority`; those columns are added in place,
//! tolerating NULL on existing rows.

use sqlx::{Row, SqlitePool};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            command TEXT NOT NULL,
            state TEXT NOT NULL,
            attempts INTEGER NOT NULL DEFAULT 0,
            max_retries INTEGER NOT NULL DEFAULT 3,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS config (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_state ON jobs(state)")
        .execute(pool)
        .await?;

    add_column_if_missing(pool, "priority", "TEXT NOT NULL DEFAULT 'medium'").await?;
    add_column_if_missing(pool, "next_retry_at", "TEXT").await?;
    add_column_if_missing(pool, "locked_by", "TEXT").await?;
    add_column_if_missing(pool, "locked_at", "TEXT").await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_claim ON jobs(state, locked_by, next_retry_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn add_column_if_missing(pool: &SqlitePool, column: &str, ddl: &str) -> Result<(), sqlx::Error> {
    let rows = sqlx::query("PRAGMA table_info(jobs)").fetch_all(pool).await?;
    let has_column = rows.iter().any(|row| {
        let name: String = row.get("name");
        name == column
    });

    if !has_column {
        let sql = format!("ALTER TABLE jobs ADD COLUMN {column} {ddl}");
        sqlx::query(&sql).execute(pool).await?;
    }

    Ok(())
}
