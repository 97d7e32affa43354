//! Database migrations

use libsql::Connection;

use crate::error::Result;

use super::classify_store_error;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }

    Ok(())
}

async fn get_version(conn: &Connection) -> Result<i32> {
    let exists = query_i32(
        conn,
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
    )
    .await?
        != 0;

    if !exists {
        return Ok(0);
    }

    query_i32(conn, "SELECT COALESCE(MAX(version), 0) FROM schema_version").await
}

async fn query_i32(conn: &Connection, sql: &str) -> Result<i32> {
    let mut rows = conn
        .query(sql, ())
        .await
        .map_err(|error| classify_store_error(&error))?;
    let Some(row) = rows
        .next()
        .await
        .map_err(|error| classify_store_error(&error))?
    else {
        return Ok(0);
    };
    row.get::<i32>(0)
        .map_err(|error| classify_store_error(&error))
}

/// Migration to version 1: journal entries collection
async fn migrate_v1(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            "CREATE TABLE IF NOT EXISTS journal_entries (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                thoughts TEXT NOT NULL,
                image_url TEXT NOT NULL DEFAULT '',
                owner_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                owner_display_name TEXT NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_journal_entries_owner ON journal_entries(owner_id)",
            "INSERT INTO schema_version (version) VALUES (1)",
        ],
    )
    .await?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}

/// Run `statements` in one transaction, rolling back on the first failure.
async fn apply(conn: &Connection, statements: &[&str]) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ())
        .await
        .map_err(|error| classify_store_error(&error))?;

    for stmt in statements {
        if let Err(error) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(classify_store_error(&error));
        }
    }

    if let Err(error) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(classify_store_error(&error));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use libsql::Builder;

    use super::*;

    async fn setup() -> Connection {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        db.connect().unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        assert_eq!(get_version(&conn).await.unwrap(), CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations_idempotent() {
        let conn = setup().await;
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        assert_eq!(get_version(&conn).await.unwrap(), CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migration_creates_entries_table_and_owner_index() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        let tables = query_i32(
            &conn,
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'journal_entries'",
        )
        .await
        .unwrap();
        let indexes = query_i32(
            &conn,
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_journal_entries_owner'",
        )
        .await
        .unwrap();

        assert_eq!(tables, 1);
        assert_eq!(indexes, 1);
    }
}
