// ABOUTME: Repair order pipeline with claim holds and revenue carryover
// ABOUTME: Typed stage machine, CAS-guarded storage, and the service that serializes per-RO writes

pub mod carryover;
pub mod error;
pub mod locks;
pub mod report;
pub mod service;
pub mod stages;
pub mod state_machine;
pub mod storage;
pub mod types;

pub use carryover::CarryoverAssigner;
pub use error::{PipelineError, PipelineResult};
pub use locks::RoLocks;
pub use report::{RevenueReport, RevenueTotals};
pub use service::{RepairOrderService, TransitionObserver};
pub use stages::{label, next_stage, stages, Stage, StageParseError};
pub use state_machine::{Transition, TransitionKind};
pub use storage::RepairOrderStorage;
pub use types::{
    ApprovalDecision, ClaimStatus, HoldReason, LogEntry, PaymentType, RepairOrder,
    RepairOrderCreateInput, RepairOrderFilter, RepairOrderUpdateInput, RevenuePeriod, RoStatus,
};
