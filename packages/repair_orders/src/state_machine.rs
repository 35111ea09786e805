// ABOUTME: Repair order state machine
// ABOUTME: Pure transition rules over an in-memory RO; every success appends exactly one log entry

use chrono::{DateTime, Utc};
use revv_core::BillingMonth;
use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};
use crate::stages::Stage;
use crate::types::{
    ApprovalDecision, ClaimStatus, HoldReason, LogEntry, RepairOrder, RevenuePeriod, RoStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TransitionKind {
    Advance,
    ClaimUpdate(ClaimStatus),
    SentForApproval,
    ApprovalResponse(ApprovalDecision),
    RevenueAssigned(RevenuePeriod),
}

/// What a successful operation did to a repair order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub ro_id: String,
    pub kind: TransitionKind,
    pub from: RoStatus,
    pub to: RoStatus,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

impl Transition {
    pub fn status_changed(&self) -> bool {
        self.from != self.to
    }
}

/// Move to the next ordered stage.
pub fn advance(ro: &mut RepairOrder, at: DateTime<Utc>, by: &str) -> PipelineResult<Transition> {
    let current = match ro.status {
        RoStatus::Stage(stage) => stage,
        RoStatus::Hold { reason, .. } => {
            return Err(PipelineError::BlockedByClaim {
                claim: ro.claim_status.unwrap_or_else(|| reason.claim_status()),
            })
        }
        RoStatus::AwaitingApproval => {
            return Err(PipelineError::InvalidTransition {
                action: "advance",
                from: ro.status.to_string(),
            })
        }
    };

    let next = current.next().ok_or_else(|| PipelineError::TerminalState {
        ro_id: ro.id.clone(),
    })?;

    if let Some(claim) = ro.claim_status.filter(|c| c.blocks_pipeline()) {
        if next > Stage::Approval {
            return Err(PipelineError::BlockedByClaim { claim });
        }
    }

    if next == Stage::Delivery && ro.actual_delivery.is_none() {
        ro.actual_delivery = Some(at.date_naive());
    }

    Ok(record(
        ro,
        TransitionKind::Advance,
        RoStatus::Stage(next),
        None,
        at,
        by,
    ))
}

/// Record an insurer claim decision. SIU and total loss override whatever
/// stage the RO is on; approval releases a hold back to the last ordered
/// stage in the log.
pub fn set_claim_status(
    ro: &mut RepairOrder,
    claim: ClaimStatus,
    at: DateTime<Utc>,
    by: &str,
) -> PipelineResult<Transition> {
    if ro.claim_status == Some(claim) {
        return Err(PipelineError::InvalidClaimTransition { claim });
    }

    let to = match claim {
        ClaimStatus::TotalLoss => RoStatus::Hold {
            reason: HoldReason::TotalLoss,
            resume_stage: hold_resume_stage(ro),
        },
        ClaimStatus::Siu => RoStatus::Hold {
            reason: HoldReason::Siu,
            resume_stage: hold_resume_stage(ro),
        },
        ClaimStatus::Approved => match ro.status {
            RoStatus::Hold { resume_stage, .. } => {
                RoStatus::Stage(resume_point(&ro.log).unwrap_or(resume_stage))
            }
            other => other,
        },
    };

    ro.claim_status = Some(claim);
    let note = format!("Claim status set to {}", claim);

    Ok(record(
        ro,
        TransitionKind::ClaimUpdate(claim),
        to,
        Some(note),
        at,
        by,
    ))
}

/// Send the estimate to the customer or insurer for sign-off.
pub fn send_for_approval(
    ro: &mut RepairOrder,
    at: DateTime<Utc>,
    by: &str,
) -> PipelineResult<Transition> {
    if ro.status != RoStatus::Stage(Stage::Estimate) {
        return Err(PipelineError::InvalidTransition {
            action: "send for approval",
            from: ro.status.to_string(),
        });
    }

    Ok(record(
        ro,
        TransitionKind::SentForApproval,
        RoStatus::AwaitingApproval,
        Some("Estimate sent for approval".to_string()),
        at,
        by,
    ))
}

/// Apply the approver's answer. A decline returns the RO to `estimate` and
/// keeps the reason in the log.
pub fn respond_to_approval(
    ro: &mut RepairOrder,
    decision: ApprovalDecision,
    reason: Option<String>,
    at: DateTime<Utc>,
    by: &str,
) -> PipelineResult<Transition> {
    if ro.status != RoStatus::AwaitingApproval {
        return Err(PipelineError::InvalidTransition {
            action: "respond to approval",
            from: ro.status.to_string(),
        });
    }

    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    let (to, note) = match decision {
        ApprovalDecision::Approve => (
            RoStatus::Stage(Stage::Approval),
            Some(match reason {
                Some(r) => format!("Estimate approved: {}", r),
                None => "Estimate approved".to_string(),
            }),
        ),
        ApprovalDecision::Decline => (
            RoStatus::Stage(Stage::Estimate),
            Some(match reason {
                Some(r) => format!("Estimate declined: {}", r),
                None => "Estimate declined".to_string(),
            }),
        ),
    };

    Ok(record(
        ro,
        TransitionKind::ApprovalResponse(decision),
        to,
        note,
        at,
        by,
    ))
}

/// Finalize which month's report this RO's revenue lands in. Write-once.
pub fn assign_revenue_period(
    ro: &mut RepairOrder,
    period: RevenuePeriod,
    current_month: BillingMonth,
    at: DateTime<Utc>,
    by: &str,
) -> PipelineResult<Transition> {
    if let Some(existing) = ro.revenue_period {
        return Err(PipelineError::AlreadyAssigned { period: existing });
    }

    let month = match period {
        RevenuePeriod::Previous => ro.billing_month,
        RevenuePeriod::Current => current_month,
    };

    ro.revenue_period = Some(period);
    ro.revenue_month = Some(month);

    let note = format!("Revenue assigned to {} period ({})", period, month);
    let status = ro.status;

    Ok(record(
        ro,
        TransitionKind::RevenueAssigned(period),
        status,
        Some(note),
        at,
        by,
    ))
}

/// Most recent ordered stage recorded in the log
pub fn resume_point(log: &[LogEntry]) -> Option<Stage> {
    log.iter().rev().find_map(LogEntry::stage)
}

fn hold_resume_stage(ro: &RepairOrder) -> Stage {
    match ro.status {
        RoStatus::Hold { resume_stage, .. } => resume_stage,
        RoStatus::Stage(stage) => stage,
        RoStatus::AwaitingApproval => resume_point(&ro.log).unwrap_or(Stage::Estimate),
    }
}

fn record(
    ro: &mut RepairOrder,
    kind: TransitionKind,
    to: RoStatus,
    note: Option<String>,
    at: DateTime<Utc>,
    by: &str,
) -> Transition {
    let from = ro.status;

    ro.log.push(LogEntry {
        seq: ro.next_log_seq(),
        to_status: to.as_str().to_string(),
        note: note.clone(),
        created_by: Some(by.to_string()),
        created_at: at,
    });
    ro.status = to;
    ro.resume_stage = to.resume_stage();
    ro.updated_at = at;

    Transition {
        ro_id: ro.id.clone(),
        kind,
        from,
        to,
        note,
        at,
    }
}
