// ABOUTME: Monthly revenue report over attributed repair orders
// ABOUTME: Sums money fields for a month and counts carryovers still awaiting a decision

use revv_core::BillingMonth;
use serde::Serialize;

use crate::types::RepairOrder;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RevenueTotals {
    pub parts: f64,
    pub labor: f64,
    pub sublet: f64,
    pub gross: f64,
    pub deductibles: f64,
    pub deductibles_waived: f64,
    pub referral_fees: f64,
    pub goodwill: f64,
}

impl RevenueTotals {
    fn add(&mut self, ro: &RepairOrder) {
        self.parts += ro.parts_cost;
        self.labor += ro.labor_cost;
        self.sublet += ro.sublet_cost;
        self.gross += ro.gross();
        self.deductibles += ro.deductible;
        self.deductibles_waived += ro.deductible_waived;
        self.referral_fees += ro.referral_fee;
        self.goodwill += ro.goodwill_repair_cost;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueReport {
    pub month: BillingMonth,
    pub ro_count: usize,
    pub totals: RevenueTotals,
    /// Open ROs from earlier months with no revenue decision yet. Excluded
    /// from the totals until someone assigns them.
    pub pending_carryovers: usize,
    pub pending_carryover_ids: Vec<String>,
}

impl RevenueReport {
    /// Build from ROs attributed to `month` and the undecided carryovers seen
    /// from it.
    ///
    /// An undecided RO billed in `month` is attributed to it only once the
    /// month is over or the RO is closed; while it is still a carryover
    /// candidate for the following month it counts as pending instead.
    pub fn build(month: BillingMonth, attributed: &[RepairOrder], pending: &[RepairOrder]) -> Self {
        let mut totals = RevenueTotals::default();
        let mut ro_count = 0;

        for ro in attributed {
            if pending.iter().any(|p| p.id == ro.id) {
                continue;
            }
            totals.add(ro);
            ro_count += 1;
        }

        Self {
            month,
            ro_count,
            totals,
            pending_carryovers: pending.len(),
            pending_carryover_ids: pending.iter().map(|ro| ro.id.clone()).collect(),
        }
    }
}
