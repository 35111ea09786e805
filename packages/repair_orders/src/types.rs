// ABOUTME: Repair order type definitions
// ABOUTME: Tagged pipeline status, claim and revenue enums, the RO record, and its inputs

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use revv_core::BillingMonth;
use serde::{Deserialize, Serialize, Serializer};

use crate::stages::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Approved,
    TotalLoss,
    Siu,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Approved => "approved",
            ClaimStatus::TotalLoss => "total_loss",
            ClaimStatus::Siu => "siu",
        }
    }

    /// SIU and total-loss claims freeze repair work
    pub fn blocks_pipeline(&self) -> bool {
        matches!(self, ClaimStatus::TotalLoss | ClaimStatus::Siu)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RevenuePeriod {
    Current,
    Previous,
}

impl fmt::Display for RevenuePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevenuePeriod::Current => f.write_str("current"),
            RevenuePeriod::Previous => f.write_str("previous"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Insurance,
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    Approve,
    Decline,
}

/// Why normal progression is paused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoldReason {
    Siu,
    TotalLoss,
}

impl HoldReason {
    pub fn claim_status(&self) -> ClaimStatus {
        match self {
            HoldReason::Siu => ClaimStatus::Siu,
            HoldReason::TotalLoss => ClaimStatus::TotalLoss,
        }
    }
}

/// Where a repair order sits: on the ordered pipeline, waiting on the
/// customer's estimate approval, or held by an unresolved claim.
///
/// Persisted and serialized as a flat status string plus `resume_stage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoStatus {
    Stage(Stage),
    AwaitingApproval,
    Hold {
        reason: HoldReason,
        resume_stage: Stage,
    },
}

impl RoStatus {
    pub const ESTIMATE_SENT: &'static str = "estimate_sent";
    pub const SIU_HOLD: &'static str = "siu_hold";
    pub const TOTAL_LOSS: &'static str = "total_loss";

    pub fn as_str(&self) -> &'static str {
        match self {
            RoStatus::Stage(stage) => stage.as_str(),
            RoStatus::AwaitingApproval => Self::ESTIMATE_SENT,
            RoStatus::Hold {
                reason: HoldReason::Siu,
                ..
            } => Self::SIU_HOLD,
            RoStatus::Hold {
                reason: HoldReason::TotalLoss,
                ..
            } => Self::TOTAL_LOSS,
        }
    }

    /// The ordered stage, when not on a branch state
    pub fn stage(&self) -> Option<Stage> {
        match self {
            RoStatus::Stage(stage) => Some(*stage),
            _ => None,
        }
    }

    pub fn resume_stage(&self) -> Option<Stage> {
        match self {
            RoStatus::Hold { resume_stage, .. } => Some(*resume_stage),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, RoStatus::Stage(Stage::Closed))
    }

    pub fn is_held(&self) -> bool {
        matches!(self, RoStatus::Hold { .. })
    }

    /// Rebuild from the persisted status column and resume stage column.
    ///
    /// Returns `None` when the pair is not a state the pipeline can produce.
    pub fn from_columns(status: &str, resume_stage: Option<Stage>) -> Option<Self> {
        match status {
            Self::ESTIMATE_SENT => Some(RoStatus::AwaitingApproval),
            Self::SIU_HOLD => Some(RoStatus::Hold {
                reason: HoldReason::Siu,
                resume_stage: resume_stage.unwrap_or(Stage::Intake),
            }),
            Self::TOTAL_LOSS => Some(RoStatus::Hold {
                reason: HoldReason::TotalLoss,
                resume_stage: resume_stage.unwrap_or(Stage::Intake),
            }),
            other => other.parse::<Stage>().ok().map(RoStatus::Stage),
        }
    }
}

impl fmt::Display for RoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RoStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One append-only transition record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub seq: i64,
    pub to_status: String,
    pub note: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    /// The ordered stage this entry moved to, if it was one
    pub fn stage(&self) -> Option<Stage> {
        self.to_status.parse().ok()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RepairOrder {
    pub id: String,
    pub shop_id: String,
    pub ro_number: Option<String>,

    // Customer and vehicle snapshot
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub vehicle_year: Option<i32>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_vin: Option<String>,

    // Pipeline
    pub status: RoStatus,
    pub resume_stage: Option<Stage>,
    pub claim_status: Option<ClaimStatus>,
    pub insurer: Option<String>,
    pub claim_number: Option<String>,

    // Dates
    pub intake_date: NaiveDate,
    pub estimated_delivery: Option<NaiveDate>,
    pub actual_delivery: Option<NaiveDate>,

    // Revenue attribution
    pub billing_month: BillingMonth,
    pub revenue_period: Option<RevenuePeriod>,
    pub revenue_month: Option<BillingMonth>,
    pub payment_type: PaymentType,

    // Money
    pub parts_cost: f64,
    pub labor_cost: f64,
    pub sublet_cost: f64,
    pub deductible: f64,
    pub deductible_waived: f64,
    pub referral_fee: f64,
    pub goodwill_repair_cost: f64,

    pub log: Vec<LogEntry>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RepairOrder {
    /// Billable total across parts, labor, and sublet work
    pub fn gross(&self) -> f64 {
        self.parts_cost + self.labor_cost + self.sublet_cost
    }

    /// Sequence number the next log entry will receive
    pub fn next_log_seq(&self) -> i64 {
        self.log.last().map(|entry| entry.seq + 1).unwrap_or(1)
    }

    pub fn is_open(&self) -> bool {
        !self.status.is_closed()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairOrderCreateInput {
    pub ro_number: Option<String>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub vehicle_year: Option<i32>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_vin: Option<String>,
    pub insurer: Option<String>,
    pub claim_number: Option<String>,
    pub payment_type: Option<PaymentType>,
    /// Defaults to today; also fixes the billing month
    pub intake_date: Option<NaiveDate>,
    pub estimated_delivery: Option<NaiveDate>,
    pub parts_cost: Option<f64>,
    pub labor_cost: Option<f64>,
    pub sublet_cost: Option<f64>,
    pub deductible: Option<f64>,
    pub deductible_waived: Option<f64>,
    pub referral_fee: Option<f64>,
    pub goodwill_repair_cost: Option<f64>,
}

/// Editable non-pipeline fields. Status, claim, and revenue fields change
/// only through the state machine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairOrderUpdateInput {
    pub ro_number: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub vehicle_year: Option<i32>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_vin: Option<String>,
    pub insurer: Option<String>,
    pub claim_number: Option<String>,
    pub payment_type: Option<PaymentType>,
    pub estimated_delivery: Option<NaiveDate>,
    pub parts_cost: Option<f64>,
    pub labor_cost: Option<f64>,
    pub sublet_cost: Option<f64>,
    pub deductible: Option<f64>,
    pub deductible_waived: Option<f64>,
    pub referral_fee: Option<f64>,
    pub goodwill_repair_cost: Option<f64>,
}

impl RepairOrderUpdateInput {
    pub fn is_empty(&self) -> bool {
        self.ro_number.is_none()
            && self.customer_name.is_none()
            && self.customer_email.is_none()
            && self.customer_phone.is_none()
            && self.vehicle_year.is_none()
            && self.vehicle_make.is_none()
            && self.vehicle_model.is_none()
            && self.vehicle_vin.is_none()
            && self.insurer.is_none()
            && self.claim_number.is_none()
            && self.payment_type.is_none()
            && self.estimated_delivery.is_none()
            && self.parts_cost.is_none()
            && self.labor_cost.is_none()
            && self.sublet_cost.is_none()
            && self.deductible.is_none()
            && self.deductible_waived.is_none()
            && self.referral_fee.is_none()
            && self.goodwill_repair_cost.is_none()
    }
}

/// Filter for listing repair orders within a shop
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepairOrderFilter {
    /// Flat status string, e.g. `repair` or `siu_hold`
    pub status: Option<String>,
    pub billing_month: Option<BillingMonth>,
    #[serde(default)]
    pub open_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_columns_round_trip() {
        let statuses = [
            RoStatus::Stage(Stage::Intake),
            RoStatus::Stage(Stage::Closed),
            RoStatus::AwaitingApproval,
            RoStatus::Hold {
                reason: HoldReason::Siu,
                resume_stage: Stage::Repair,
            },
            RoStatus::Hold {
                reason: HoldReason::TotalLoss,
                resume_stage: Stage::Parts,
            },
        ];

        for status in statuses {
            let rebuilt = RoStatus::from_columns(status.as_str(), status.resume_stage());
            assert_eq!(rebuilt, Some(status));
        }
    }

    #[test]
    fn test_unknown_status_column_is_rejected() {
        assert_eq!(RoStatus::from_columns("archived", None), None);
    }

    #[test]
    fn test_status_serializes_flat() {
        let held = RoStatus::Hold {
            reason: HoldReason::Siu,
            resume_stage: Stage::Repair,
        };
        assert_eq!(serde_json::to_string(&held).unwrap(), "\"siu_hold\"");
        assert_eq!(
            serde_json::to_string(&RoStatus::AwaitingApproval).unwrap(),
            "\"estimate_sent\""
        );
    }

    #[test]
    fn test_blocking_claims() {
        assert!(ClaimStatus::Siu.blocks_pipeline());
        assert!(ClaimStatus::TotalLoss.blocks_pipeline());
        assert!(!ClaimStatus::Approved.blocks_pipeline());
    }
}
