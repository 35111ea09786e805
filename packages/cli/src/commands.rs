// ABOUTME: Shop administration commands run from the terminal
// ABOUTME: Carryover listing, revenue report, carrier lookup, and migrations

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::*;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use revv_core::{Actor, BillingMonth, Role};
use revv_parts::{describe_tracking_number, Carrier};
use revv_repair_orders::{CarryoverAssigner, RepairOrder, RepairOrderService, RevenueReport};
use sqlx::SqlitePool;

/// Commands act as the shop owner
fn owner(shop_id: &str) -> Actor {
    Actor::new("revv-cli", shop_id, Role::Owner)
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

async fn open_pool(database_path: &Path) -> anyhow::Result<SqlitePool> {
    revv_storage::init_pool(database_path)
        .await
        .with_context(|| format!("Failed to open database at {}", database_path.display()))
}

/// Apply pending migrations and report the database location
pub async fn migrate(database_path: &Path) -> anyhow::Result<()> {
    open_pool(database_path).await?;
    println!(
        "{} {}",
        "Database is up to date:".green(),
        database_path.display()
    );
    Ok(())
}

pub fn carryover_table(candidates: &[RepairOrder]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["ID", "RO #", "Customer", "Status", "Billing Month", "Gross"]);

    for ro in candidates {
        table.add_row(vec![
            ro.id.clone(),
            ro.ro_number.clone().unwrap_or_else(|| "-".to_string()),
            ro.customer_name.clone(),
            ro.status.to_string(),
            ro.billing_month.to_string(),
            money(ro.gross()),
        ]);
    }
    table
}

pub async fn list_carryover(
    database_path: &Path,
    shop_id: &str,
    as_of: Option<BillingMonth>,
) -> anyhow::Result<()> {
    let pool = open_pool(database_path).await?;
    let assigner = CarryoverAssigner::new(Arc::new(RepairOrderService::new(pool)));
    let candidates = assigner
        .list_carryover_candidates(&owner(shop_id), as_of)
        .await?;

    if candidates.is_empty() {
        println!("{}", "No carryover decisions pending".yellow());
        return Ok(());
    }

    println!("{}", "Carryover candidates".blue().bold());
    println!("{}", carryover_table(&candidates));
    println!(
        "Total: {} awaiting a revenue period",
        candidates.len().to_string().cyan()
    );
    Ok(())
}

pub fn report_table(report: &RevenueReport) -> Table {
    let totals = &report.totals;
    let mut table = new_table();
    table.set_header(vec!["Line", "Amount"]);

    for (line, amount) in [
        ("Parts", totals.parts),
        ("Labor", totals.labor),
        ("Sublet", totals.sublet),
        ("Gross", totals.gross),
        ("Deductibles", totals.deductibles),
        ("Deductibles waived", totals.deductibles_waived),
        ("Referral fees", totals.referral_fees),
        ("Goodwill", totals.goodwill),
    ] {
        table.add_row(vec![line.to_string(), money(amount)]);
    }
    table
}

pub async fn revenue_report(
    database_path: &Path,
    shop_id: &str,
    month: BillingMonth,
) -> anyhow::Result<()> {
    let pool = open_pool(database_path).await?;
    let assigner = CarryoverAssigner::new(Arc::new(RepairOrderService::new(pool)));
    let report = assigner.revenue_report(&owner(shop_id), month).await?;

    println!(
        "{}",
        format!("Revenue for {} ({} ROs)", report.month, report.ro_count)
            .blue()
            .bold()
    );
    println!("{}", report_table(&report));

    if report.pending_carryovers > 0 {
        println!(
            "{}",
            format!(
                "{} carryover(s) still need a revenue period: {}",
                report.pending_carryovers,
                report.pending_carryover_ids.join(", ")
            )
            .yellow()
        );
    }
    Ok(())
}

pub fn detect_carrier(raw: &str) {
    let (number, carrier, url) = describe_tracking_number(raw);

    if carrier == Carrier::Unknown {
        println!("{} {}", number.bold(), "carrier not recognized".yellow());
    } else {
        println!("{} {}", number.bold(), carrier.display_name().green());
    }
    println!("{}", url.dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use revv_repair_orders::RevenueTotals;

    #[test]
    fn test_report_table_lists_every_line() {
        let report = RevenueReport {
            month: "2026-01".parse().unwrap(),
            ro_count: 2,
            totals: RevenueTotals {
                parts: 400.0,
                labor: 600.0,
                gross: 1000.0,
                ..Default::default()
            },
            pending_carryovers: 0,
            pending_carryover_ids: Vec::new(),
        };

        let rendered = report_table(&report).to_string();
        assert!(rendered.contains("Gross"));
        assert!(rendered.contains("$1000.00"));
        assert!(rendered.contains("Goodwill"));
    }

    #[test]
    fn test_money_format() {
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(1234.5), "$1234.50");
    }

    #[tokio::test]
    async fn test_migrate_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("revv.db");

        migrate(&path).await.unwrap();
        assert!(path.exists());
    }
}
