// ABOUTME: Shared application state handed to every handler
// ABOUTME: Holds the repair order, carryover, parts, and tracking services

use std::sync::Arc;

use revv_parts::{PartService, PartsTrackingReconciler};
use revv_repair_orders::{CarryoverAssigner, RepairOrderService};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub repair_orders: Arc<RepairOrderService>,
    pub carryover: CarryoverAssigner,
    pub parts: Arc<PartService>,
    pub tracking: Arc<PartsTrackingReconciler>,
}

impl AppState {
    pub fn new(
        repair_orders: Arc<RepairOrderService>,
        parts: Arc<PartService>,
        tracking: Arc<PartsTrackingReconciler>,
    ) -> Self {
        Self {
            carryover: CarryoverAssigner::new(repair_orders.clone()),
            repair_orders,
            parts,
            tracking,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        self.repair_orders.storage().pool()
    }
}
