// ABOUTME: Error taxonomy for repair order operations
// ABOUTME: Domain rejections are distinct from dependency failures so callers know when to retry

use revv_storage::StorageError;
use thiserror::Error;

use crate::types::{ClaimStatus, RevenuePeriod};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("This RO is closed and cannot be advanced")]
    TerminalState { ro_id: String },

    #[error("Cannot {action} while the RO is '{from}'")]
    InvalidTransition { action: &'static str, from: String },

    #[error("The insurance claim is under {claim} review; resolve the claim before moving this RO forward")]
    BlockedByClaim { claim: ClaimStatus },

    #[error("Claim status is already '{claim}'")]
    InvalidClaimTransition { claim: ClaimStatus },

    #[error("Revenue for this RO was already assigned to the {period} period")]
    AlreadyAssigned { period: RevenuePeriod },

    #[error("This RO was changed by someone else; reload and try again")]
    ConcurrentModification { ro_id: String },

    #[error("Repair order not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("A dependency failed")]
    Dependency(#[source] StorageError),
}

impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidInput(msg) => PipelineError::Validation(msg),
            StorageError::NotFound => PipelineError::NotFound("record".to_string()),
            other => PipelineError::Dependency(other),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
