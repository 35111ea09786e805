// ABOUTME: Month-end carryover of repair orders still open from earlier billing months
// ABOUTME: Lists undecided ROs, records revenue period decisions, and builds the monthly report

use std::sync::Arc;

use revv_core::{Actor, BillingMonth};
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};
use crate::report::RevenueReport;
use crate::service::RepairOrderService;
use crate::types::{RepairOrder, RevenuePeriod};

#[derive(Clone)]
pub struct CarryoverAssigner {
    service: Arc<RepairOrderService>,
}

impl CarryoverAssigner {
    pub fn new(service: Arc<RepairOrderService>) -> Self {
        Self { service }
    }

    /// Open ROs billed before `as_of` with no revenue period. Defaults to the
    /// current month.
    pub async fn list_carryover_candidates(
        &self,
        actor: &Actor,
        as_of: Option<BillingMonth>,
    ) -> PipelineResult<Vec<RepairOrder>> {
        let as_of = as_of.unwrap_or_else(|| self.service.clock().current_month());
        let candidates = self
            .service
            .storage()
            .list_carryover_candidates(&actor.shop_id, as_of)
            .await?;

        debug!(
            "Found {} carryover candidates for shop {} as of {}",
            candidates.len(),
            actor.shop_id,
            as_of
        );
        Ok(candidates)
    }

    pub async fn assign_revenue_period(
        &self,
        actor: &Actor,
        ro_id: &str,
        period: RevenuePeriod,
    ) -> PipelineResult<RepairOrder> {
        let ro = self
            .service
            .assign_revenue_period(actor, ro_id, period)
            .await?;

        info!(
            "Revenue for repair order {} assigned to {} ({})",
            ro.id,
            period,
            ro.revenue_month
                .map(|m| m.to_string())
                .unwrap_or_default()
        );
        Ok(ro)
    }

    /// Revenue attributed to `month`. Once `month` has ended, its open ROs
    /// without a decision are reported as pending rather than summed.
    pub async fn revenue_report(
        &self,
        actor: &Actor,
        month: BillingMonth,
    ) -> PipelineResult<RevenueReport> {
        if !actor.is_admin() {
            return Err(PipelineError::Forbidden(
                "Only owners and admins can view revenue reports".to_string(),
            ));
        }

        let storage = self.service.storage();
        let attributed = storage.list_attributed_to(&actor.shop_id, month).await?;

        let pending = if month < self.service.clock().current_month() {
            storage
                .list_carryover_candidates(&actor.shop_id, month.next())
                .await?
                .into_iter()
                .filter(|ro| ro.billing_month == month)
                .collect()
        } else {
            Vec::new()
        };

        Ok(RevenueReport::build(month, &attributed, &pending))
    }
}
