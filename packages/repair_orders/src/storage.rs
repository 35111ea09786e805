// ABOUTME: Repair order storage layer using SQLite
// ABOUTME: Shop-scoped reads, version-guarded writes, and the append-only transition log

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use revv_core::BillingMonth;
use revv_storage::{StorageError, StorageResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;

use crate::stages::Stage;
use crate::types::{LogEntry, RepairOrder, RepairOrderFilter, RoStatus};

const RO_COLUMNS: &str = r#"
    id, shop_id, ro_number,
    customer_name, customer_email, customer_phone,
    vehicle_year, vehicle_make, vehicle_model, vehicle_vin,
    status, resume_stage, claim_status, insurer, claim_number,
    intake_date, estimated_delivery, actual_delivery,
    billing_month, revenue_period, revenue_month, payment_type,
    parts_cost, labor_cost, sublet_cost, deductible, deductible_waived,
    referral_fee, goodwill_repair_cost,
    version, created_at, updated_at
"#;

pub struct RepairOrderStorage {
    pool: SqlitePool,
}

impl RepairOrderStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a freshly built RO. The log must be empty.
    pub async fn create(&self, ro: &RepairOrder) -> StorageResult<()> {
        debug!("Creating repair order: {} for shop: {}", ro.id, ro.shop_id);

        if !ro.log.is_empty() {
            return Err(StorageError::InvalidInput(
                "A new repair order cannot carry log entries".to_string(),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO repair_orders (
                id, shop_id, ro_number,
                customer_name, customer_email, customer_phone,
                vehicle_year, vehicle_make, vehicle_model, vehicle_vin,
                status, resume_stage, claim_status, insurer, claim_number,
                intake_date, estimated_delivery, actual_delivery,
                billing_month, revenue_period, revenue_month, payment_type,
                parts_cost, labor_cost, sublet_cost, deductible, deductible_waived,
                referral_fee, goodwill_repair_cost,
                version, created_at, updated_at
            ) VALUES (
                ?, ?, ?,
                ?, ?, ?,
                ?, ?, ?, ?,
                ?, ?, ?, ?, ?,
                ?, ?, ?,
                ?, ?, ?, ?,
                ?, ?, ?, ?, ?,
                ?, ?,
                ?, ?, ?
            )
            "#,
        )
        .bind(&ro.id)
        .bind(&ro.shop_id)
        .bind(&ro.ro_number)
        .bind(&ro.customer_name)
        .bind(&ro.customer_email)
        .bind(&ro.customer_phone)
        .bind(ro.vehicle_year)
        .bind(&ro.vehicle_make)
        .bind(&ro.vehicle_model)
        .bind(&ro.vehicle_vin)
        .bind(ro.status.as_str())
        .bind(ro.resume_stage)
        .bind(ro.claim_status)
        .bind(&ro.insurer)
        .bind(&ro.claim_number)
        .bind(ro.intake_date)
        .bind(ro.estimated_delivery)
        .bind(ro.actual_delivery)
        .bind(ro.billing_month.to_string())
        .bind(ro.revenue_period)
        .bind(ro.revenue_month.map(|m| m.to_string()))
        .bind(ro.payment_type)
        .bind(ro.parts_cost)
        .bind(ro.labor_cost)
        .bind(ro.sublet_cost)
        .bind(ro.deductible)
        .bind(ro.deductible_waived)
        .bind(ro.referral_fee)
        .bind(ro.goodwill_repair_cost)
        .bind(ro.version)
        .bind(ro.created_at)
        .bind(ro.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    /// Load one RO with its full log. Rows owned by another shop are reported
    /// as not found.
    pub async fn get(&self, shop_id: &str, id: &str) -> StorageResult<RepairOrder> {
        debug!("Fetching repair order: {} for shop: {}", id, shop_id);

        let sql = format!(
            "SELECT {} FROM repair_orders WHERE id = ? AND shop_id = ?",
            RO_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(shop_id)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from_fetch)?;

        let mut ro = self.row_to_repair_order(&row)?;
        ro.log = self.get_log(&ro.id).await?;
        Ok(ro)
    }

    pub async fn list(
        &self,
        shop_id: &str,
        filter: &RepairOrderFilter,
    ) -> StorageResult<Vec<RepairOrder>> {
        debug!("Listing repair orders for shop: {} ({:?})", shop_id, filter);

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        builder.push(RO_COLUMNS);
        builder.push(" FROM repair_orders WHERE shop_id = ");
        builder.push_bind(shop_id);

        if let Some(status) = &filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status.clone());
        }
        if let Some(month) = filter.billing_month {
            builder.push(" AND billing_month = ");
            builder.push_bind(month.to_string());
        }
        if filter.open_only {
            builder.push(" AND status != 'closed'");
        }

        builder.push(" ORDER BY intake_date DESC, created_at DESC");

        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
            if let Some(offset) = filter.offset {
                builder.push(" OFFSET ");
                builder.push_bind(offset);
            }
        }

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        self.hydrate(rows).await
    }

    /// Open ROs from months before `as_of` that have no revenue decision yet
    pub async fn list_carryover_candidates(
        &self,
        shop_id: &str,
        as_of: BillingMonth,
    ) -> StorageResult<Vec<RepairOrder>> {
        debug!(
            "Listing carryover candidates for shop: {} as of {}",
            shop_id, as_of
        );

        // YYYY-MM strings sort chronologically
        let sql = format!(
            r#"
            SELECT {} FROM repair_orders
            WHERE shop_id = ?
              AND billing_month < ?
              AND revenue_period IS NULL
              AND status != 'closed'
            ORDER BY billing_month, intake_date, created_at
            "#,
            RO_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(shop_id)
            .bind(as_of.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        self.hydrate(rows).await
    }

    /// ROs whose revenue lands in `month`: explicitly attributed to it, or
    /// undecided and billed in it.
    pub async fn list_attributed_to(
        &self,
        shop_id: &str,
        month: BillingMonth,
    ) -> StorageResult<Vec<RepairOrder>> {
        debug!("Listing ROs attributed to {} for shop: {}", month, shop_id);

        let month = month.to_string();
        let sql = format!(
            r#"
            SELECT {} FROM repair_orders
            WHERE shop_id = ?
              AND (revenue_month = ? OR (revenue_period IS NULL AND billing_month = ?))
            ORDER BY intake_date, created_at
            "#,
            RO_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(shop_id)
            .bind(&month)
            .bind(&month)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(|row| self.row_to_repair_order(row)).collect()
    }

    /// Persist a transition: write the RO row if its version still matches and
    /// append the new log entries in the same transaction. Detail columns are
    /// written too, so an edit made alongside the transition commits with it.
    ///
    /// Returns `false` when another writer got there first; nothing is written
    /// in that case.
    pub async fn save_transition(
        &self,
        ro: &RepairOrder,
        expected_version: i64,
        new_entries: &[LogEntry],
    ) -> StorageResult<bool> {
        debug!(
            "Saving transition for repair order: {} (version {})",
            ro.id, expected_version
        );

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let result = sqlx::query(
            r#"
            UPDATE repair_orders SET
                status = ?,
                resume_stage = ?,
                claim_status = ?,
                actual_delivery = ?,
                revenue_period = ?,
                revenue_month = ?,
                ro_number = ?,
                customer_name = ?,
                customer_email = ?,
                customer_phone = ?,
                vehicle_year = ?,
                vehicle_make = ?,
                vehicle_model = ?,
                vehicle_vin = ?,
                insurer = ?,
                claim_number = ?,
                payment_type = ?,
                estimated_delivery = ?,
                parts_cost = ?,
                labor_cost = ?,
                sublet_cost = ?,
                deductible = ?,
                deductible_waived = ?,
                referral_fee = ?,
                goodwill_repair_cost = ?,
                version = version + 1,
                updated_at = ?
            WHERE id = ? AND shop_id = ? AND version = ?
            "#,
        )
        .bind(ro.status.as_str())
        .bind(ro.resume_stage)
        .bind(ro.claim_status)
        .bind(ro.actual_delivery)
        .bind(ro.revenue_period)
        .bind(ro.revenue_month.map(|m| m.to_string()))
        .bind(&ro.ro_number)
        .bind(&ro.customer_name)
        .bind(&ro.customer_email)
        .bind(&ro.customer_phone)
        .bind(ro.vehicle_year)
        .bind(&ro.vehicle_make)
        .bind(&ro.vehicle_model)
        .bind(&ro.vehicle_vin)
        .bind(&ro.insurer)
        .bind(&ro.claim_number)
        .bind(ro.payment_type)
        .bind(ro.estimated_delivery)
        .bind(ro.parts_cost)
        .bind(ro.labor_cost)
        .bind(ro.sublet_cost)
        .bind(ro.deductible)
        .bind(ro.deductible_waived)
        .bind(ro.referral_fee)
        .bind(ro.goodwill_repair_cost)
        .bind(ro.updated_at)
        .bind(&ro.id)
        .bind(&ro.shop_id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(StorageError::Sqlx)?;
            debug!("Version conflict on repair order: {}", ro.id);
            return Ok(false);
        }

        for entry in new_entries {
            sqlx::query(
                r#"
                INSERT INTO repair_order_log (ro_id, seq, to_status, note, created_by, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&ro.id)
            .bind(entry.seq)
            .bind(&entry.to_status)
            .bind(&entry.note)
            .bind(&entry.created_by)
            .bind(entry.created_at)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(true)
    }

    /// Persist edited non-pipeline fields under the same version guard
    pub async fn save_details(&self, ro: &RepairOrder, expected_version: i64) -> StorageResult<bool> {
        debug!(
            "Saving details for repair order: {} (version {})",
            ro.id, expected_version
        );

        let result = sqlx::query(
            r#"
            UPDATE repair_orders SET
                ro_number = ?,
                customer_name = ?,
                customer_email = ?,
                customer_phone = ?,
                vehicle_year = ?,
                vehicle_make = ?,
                vehicle_model = ?,
                vehicle_vin = ?,
                insurer = ?,
                claim_number = ?,
                payment_type = ?,
                estimated_delivery = ?,
                parts_cost = ?,
                labor_cost = ?,
                sublet_cost = ?,
                deductible = ?,
                deductible_waived = ?,
                referral_fee = ?,
                goodwill_repair_cost = ?,
                version = version + 1,
                updated_at = ?
            WHERE id = ? AND shop_id = ? AND version = ?
            "#,
        )
        .bind(&ro.ro_number)
        .bind(&ro.customer_name)
        .bind(&ro.customer_email)
        .bind(&ro.customer_phone)
        .bind(ro.vehicle_year)
        .bind(&ro.vehicle_make)
        .bind(&ro.vehicle_model)
        .bind(&ro.vehicle_vin)
        .bind(&ro.insurer)
        .bind(&ro.claim_number)
        .bind(ro.payment_type)
        .bind(ro.estimated_delivery)
        .bind(ro.parts_cost)
        .bind(ro.labor_cost)
        .bind(ro.sublet_cost)
        .bind(ro.deductible)
        .bind(ro.deductible_waived)
        .bind(ro.referral_fee)
        .bind(ro.goodwill_repair_cost)
        .bind(ro.updated_at)
        .bind(&ro.id)
        .bind(&ro.shop_id)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_log(&self, ro_id: &str) -> StorageResult<Vec<LogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT seq, to_status, note, created_by, created_at
            FROM repair_order_log
            WHERE ro_id = ?
            ORDER BY seq
            "#,
        )
        .bind(ro_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_log_entry).collect()
    }

    /// Attach logs to a batch of rows with one extra query
    async fn hydrate(&self, rows: Vec<SqliteRow>) -> StorageResult<Vec<RepairOrder>> {
        let mut orders = rows
            .iter()
            .map(|row| self.row_to_repair_order(row))
            .collect::<StorageResult<Vec<_>>>()?;

        if orders.is_empty() {
            return Ok(orders);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT ro_id, seq, to_status, note, created_by, created_at FROM repair_order_log WHERE ro_id IN (",
        );
        let mut separated = builder.separated(", ");
        for ro in &orders {
            separated.push_bind(ro.id.clone());
        }
        separated.push_unseparated(") ORDER BY ro_id, seq");

        let log_rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let mut logs: HashMap<String, Vec<LogEntry>> = HashMap::new();
        for row in &log_rows {
            let ro_id: String = row.try_get("ro_id")?;
            logs.entry(ro_id).or_default().push(row_to_log_entry(row)?);
        }

        for ro in &mut orders {
            ro.log = logs.remove(&ro.id).unwrap_or_default();
        }

        Ok(orders)
    }

    fn row_to_repair_order(&self, row: &SqliteRow) -> StorageResult<RepairOrder> {
        let status_raw: String = row.try_get("status")?;
        let resume_stage: Option<Stage> = row.try_get("resume_stage")?;
        let status =
            RoStatus::from_columns(&status_raw, resume_stage).ok_or(StorageError::Corrupt {
                column: "status",
                value: status_raw.clone(),
            })?;

        let billing_month = parse_month("billing_month", row.try_get("billing_month")?)?;
        let revenue_month = row
            .try_get::<Option<String>, _>("revenue_month")?
            .map(|raw| parse_month("revenue_month", raw))
            .transpose()?;

        Ok(RepairOrder {
            id: row.try_get("id")?,
            shop_id: row.try_get("shop_id")?,
            ro_number: row.try_get("ro_number")?,
            customer_name: row.try_get("customer_name")?,
            customer_email: row.try_get("customer_email")?,
            customer_phone: row.try_get("customer_phone")?,
            vehicle_year: row.try_get("vehicle_year")?,
            vehicle_make: row.try_get("vehicle_make")?,
            vehicle_model: row.try_get("vehicle_model")?,
            vehicle_vin: row.try_get("vehicle_vin")?,
            status,
            resume_stage: status.resume_stage(),
            claim_status: row.try_get("claim_status")?,
            insurer: row.try_get("insurer")?,
            claim_number: row.try_get("claim_number")?,
            intake_date: row.try_get("intake_date")?,
            estimated_delivery: row.try_get("estimated_delivery")?,
            actual_delivery: row.try_get("actual_delivery")?,
            billing_month,
            revenue_period: row.try_get("revenue_period")?,
            revenue_month,
            payment_type: row.try_get("payment_type")?,
            parts_cost: row.try_get("parts_cost")?,
            labor_cost: row.try_get("labor_cost")?,
            sublet_cost: row.try_get("sublet_cost")?,
            deductible: row.try_get("deductible")?,
            deductible_waived: row.try_get("deductible_waived")?,
            referral_fee: row.try_get("referral_fee")?,
            goodwill_repair_cost: row.try_get("goodwill_repair_cost")?,
            log: Vec::new(),
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn row_to_log_entry(row: &SqliteRow) -> StorageResult<LogEntry> {
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    Ok(LogEntry {
        seq: row.try_get("seq")?,
        to_status: row.try_get("to_status")?,
        note: row.try_get("note")?,
        created_by: row.try_get("created_by")?,
        created_at,
    })
}

fn parse_month(column: &'static str, raw: String) -> StorageResult<BillingMonth> {
    raw.parse()
        .map_err(|_| StorageError::Corrupt { column, value: raw })
}
