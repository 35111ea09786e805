// ABOUTME: Part storage layer using SQLite
// ABOUTME: Shop-scoped CRUD plus the guarded tracking update used for auto-receipt

use chrono::{DateTime, NaiveDate, Utc};
use revv_storage::{StorageError, StorageResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::types::{Part, PartStatus, TrackingStatus};

pub struct PartStorage {
    pool: SqlitePool,
}

impl PartStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Whether the shop owns a repair order with this id
    pub async fn repair_order_exists(&self, shop_id: &str, ro_id: &str) -> StorageResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM repair_orders WHERE id = ? AND shop_id = ?")
                .bind(ro_id)
                .bind(shop_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;
        Ok(found.is_some())
    }

    pub async fn create(&self, part: &Part) -> StorageResult<()> {
        debug!("Creating part: {} for repair order: {}", part.id, part.ro_id);

        sqlx::query(
            r#"
            INSERT INTO parts (
                id, shop_id, ro_id, part_name, part_number, vendor, quantity, unit_cost, status,
                tracking_number, carrier, tracking_status, tracking_detail, tracking_updated_at,
                expected_date, received_date, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&part.id)
        .bind(&part.shop_id)
        .bind(&part.ro_id)
        .bind(&part.part_name)
        .bind(&part.part_number)
        .bind(&part.vendor)
        .bind(part.quantity)
        .bind(part.unit_cost)
        .bind(part.status)
        .bind(&part.tracking_number)
        .bind(part.carrier)
        .bind(part.tracking_status)
        .bind(&part.tracking_detail)
        .bind(part.tracking_updated_at)
        .bind(part.expected_date)
        .bind(part.received_date)
        .bind(part.created_at)
        .bind(part.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    pub async fn get(&self, shop_id: &str, id: &str) -> StorageResult<Part> {
        debug!("Fetching part: {} for shop: {}", id, shop_id);

        let row = sqlx::query("SELECT * FROM parts WHERE id = ? AND shop_id = ?")
            .bind(id)
            .bind(shop_id)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from_fetch)?;

        self.row_to_part(&row)
    }

    pub async fn list_for_repair_order(&self, shop_id: &str, ro_id: &str) -> StorageResult<Vec<Part>> {
        debug!("Listing parts for repair order: {}", ro_id);

        let rows = sqlx::query(
            "SELECT * FROM parts WHERE shop_id = ? AND ro_id = ? ORDER BY created_at, part_name",
        )
        .bind(shop_id)
        .bind(ro_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(|row| self.row_to_part(row)).collect()
    }

    /// Write the editable columns. Status, receipt, and tracking state belong
    /// to the status path and the reconciler and are left alone.
    ///
    /// With `number_changed`, the new tracking number and carrier are written
    /// and the old provider state cleared, but only while the stored number is
    /// still `previous_number`. Returns `false` when that guard misses; nothing
    /// is written in that case.
    pub async fn save_details(
        &self,
        part: &Part,
        previous_number: Option<&str>,
        number_changed: bool,
    ) -> StorageResult<bool> {
        debug!("Saving details for part: {}", part.id);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let result = sqlx::query(
            r#"
            UPDATE parts SET
                part_name = ?,
                part_number = ?,
                vendor = ?,
                quantity = ?,
                unit_cost = ?,
                expected_date = ?,
                updated_at = ?
            WHERE id = ? AND shop_id = ?
            "#,
        )
        .bind(&part.part_name)
        .bind(&part.part_number)
        .bind(&part.vendor)
        .bind(part.quantity)
        .bind(part.unit_cost)
        .bind(part.expected_date)
        .bind(part.updated_at)
        .bind(&part.id)
        .bind(&part.shop_id)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        if number_changed {
            let result = sqlx::query(
                r#"
                UPDATE parts SET
                    tracking_number = ?,
                    carrier = ?,
                    tracking_status = NULL,
                    tracking_detail = NULL,
                    tracking_updated_at = NULL
                WHERE id = ? AND shop_id = ? AND tracking_number IS ?
                "#,
            )
            .bind(&part.tracking_number)
            .bind(part.carrier)
            .bind(&part.id)
            .bind(&part.shop_id)
            .bind(previous_number)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

            if result.rows_affected() == 0 {
                tx.rollback().await.map_err(StorageError::Sqlx)?;
                debug!("Tracking number of part {} changed underneath us", part.id);
                return Ok(false);
            }
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(true)
    }

    /// Move the part to `part.status` if it is still `expected`. Returns
    /// `false` when another writer changed the status first.
    pub async fn save_status(&self, part: &Part, expected: PartStatus) -> StorageResult<bool> {
        debug!(
            "Saving status for part: {} ({} -> {})",
            part.id, expected, part.status
        );

        let result = sqlx::query(
            r#"
            UPDATE parts SET
                status = ?,
                received_date = ?,
                updated_at = ?
            WHERE id = ? AND shop_id = ? AND status = ?
            "#,
        )
        .bind(part.status)
        .bind(part.received_date)
        .bind(part.updated_at)
        .bind(&part.id)
        .bind(&part.shop_id)
        .bind(expected)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a provider poll. When `receive_on` is set the part flips to
    /// `received` in the same statement, but only if it is still ordered or
    /// backordered. The write is skipped if the tracking number changed since
    /// the poll started.
    ///
    /// Returns whether a row was written.
    pub async fn save_tracking_result(
        &self,
        part: &Part,
        polled_number: &str,
        status: TrackingStatus,
        detail: Option<&str>,
        at: DateTime<Utc>,
        receive_on: Option<NaiveDate>,
    ) -> StorageResult<bool> {
        debug!(
            "Saving tracking result for part: {} ({})",
            part.id, status
        );

        let result = sqlx::query(
            r#"
            UPDATE parts SET
                tracking_status = ?,
                tracking_detail = ?,
                tracking_updated_at = ?,
                updated_at = ?,
                status = CASE
                    WHEN ? IS NOT NULL AND status IN ('ordered', 'backordered') THEN 'received'
                    ELSE status
                END,
                received_date = CASE
                    WHEN ? IS NOT NULL AND status IN ('ordered', 'backordered') THEN ?
                    ELSE received_date
                END
            WHERE id = ? AND shop_id = ? AND tracking_number = ?
            "#,
        )
        .bind(status)
        .bind(detail)
        .bind(at)
        .bind(at)
        .bind(receive_on)
        .bind(receive_on)
        .bind(receive_on)
        .bind(&part.id)
        .bind(&part.shop_id)
        .bind(polled_number)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_part(&self, row: &SqliteRow) -> StorageResult<Part> {
        Ok(Part {
            id: row.try_get("id")?,
            shop_id: row.try_get("shop_id")?,
            ro_id: row.try_get("ro_id")?,
            part_name: row.try_get("part_name")?,
            part_number: row.try_get("part_number")?,
            vendor: row.try_get("vendor")?,
            quantity: row.try_get("quantity")?,
            unit_cost: row.try_get("unit_cost")?,
            status: row.try_get("status")?,
            tracking_number: row.try_get("tracking_number")?,
            carrier: row.try_get("carrier")?,
            tracking_status: row.try_get("tracking_status")?,
            tracking_detail: row.try_get("tracking_detail")?,
            tracking_updated_at: row.try_get("tracking_updated_at")?,
            expected_date: row.try_get("expected_date")?,
            received_date: row.try_get("received_date")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
