// ABOUTME: SQLite connection pool setup and schema migrations
// ABOUTME: Applies WAL, foreign keys, and busy timeout before running embedded migrations

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::{StorageError, StorageResult};

/// Schema migrations compiled into the binary
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open (creating if needed) the database file and bring its schema up to date
pub async fn init_pool(database_path: &Path) -> StorageResult<SqlitePool> {
    if let Some(parent) = database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }
    }

    let database_url = format!("sqlite:{}", database_path.display());
    debug!("Connecting to database: {}", database_url);

    let options = SqliteConnectOptions::from_str(&database_url)
        .map_err(StorageError::Sqlx)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await
        .map_err(StorageError::Sqlx)?;

    info!("Database connection established");

    MIGRATOR.run(&pool).await.map_err(StorageError::Migration)?;

    debug!("Database migrations completed");

    Ok(pool)
}

/// Single-connection in-memory database with the full schema.
///
/// Every pooled connection to `:memory:` is its own database, so the pool is
/// capped at one connection.
#[cfg(any(test, feature = "test-utils"))]
pub async fn connect_in_memory() -> StorageResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(":memory:")
        .map_err(StorageError::Sqlx)?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(StorageError::Sqlx)?;

    MIGRATOR.run(&pool).await.map_err(StorageError::Migration)?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_pool_creates_file_and_schema() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("revv.db");

        let pool = init_pool(&db_path).await.unwrap();
        assert!(db_path.exists());

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('repair_orders', 'repair_order_log', 'parts') ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(tables, vec!["parts", "repair_order_log", "repair_orders"]);
    }

    #[tokio::test]
    async fn test_log_rows_cannot_be_rewritten() {
        let pool = connect_in_memory().await.unwrap();

        sqlx::query(
            "INSERT INTO repair_orders (id, shop_id, customer_name, status, intake_date, billing_month, payment_type, created_at, updated_at)
             VALUES ('ro-1', 'shop-1', 'Dana', 'intake', '2026-01-05', '2026-01', 'cash', datetime('now'), datetime('now'))",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO repair_order_log (ro_id, seq, to_status, created_at) VALUES ('ro-1', 1, 'estimate', datetime('now'))",
        )
        .execute(&pool)
        .await
        .unwrap();

        let update = sqlx::query("UPDATE repair_order_log SET to_status = 'closed'")
            .execute(&pool)
            .await;
        assert!(update.is_err());

        let delete = sqlx::query("DELETE FROM repair_order_log").execute(&pool).await;
        assert!(delete.is_err());
    }

    #[tokio::test]
    async fn test_received_date_check_constraint() {
        let pool = connect_in_memory().await.unwrap();

        sqlx::query(
            "INSERT INTO repair_orders (id, shop_id, customer_name, status, intake_date, billing_month, payment_type, created_at, updated_at)
             VALUES ('ro-1', 'shop-1', 'Dana', 'intake', '2026-01-05', '2026-01', 'cash', datetime('now'), datetime('now'))",
        )
        .execute(&pool)
        .await
        .unwrap();

        let result = sqlx::query(
            "INSERT INTO parts (id, shop_id, ro_id, part_name, quantity, status, created_at, updated_at)
             VALUES ('part-1', 'shop-1', 'ro-1', 'Bumper', 1, 'received', datetime('now'), datetime('now'))",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err(), "received part without a received_date must be rejected");
    }
}
