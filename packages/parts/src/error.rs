// ABOUTME: Error types for parts and tracking operations
// ABOUTME: Provider failures are kept separate so callers can retry them

use revv_storage::StorageError;
use thiserror::Error;

use crate::types::PartStatus;

/// Failures talking to the external tracking provider
#[derive(Debug, Error)]
pub enum TrackingProviderError {
    #[error("Tracking provider did not answer within {0} seconds")]
    Timeout(u64),

    #[error("Tracking provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Tracking provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Tracking provider response could not be read: {0}")]
    Parse(String),

    #[error("Tracking provider has no record of {0}")]
    UnknownNumber(String),
}

#[derive(Debug, Error)]
pub enum PartsError {
    #[error("Part {part_id} has no tracking number to check")]
    NoTrackingNumber { part_id: String },

    #[error("Carrier tracking is unavailable right now")]
    TrackingProvider(#[from] TrackingProviderError),

    #[error("A {from} part cannot be marked {to}")]
    InvalidTransition { from: PartStatus, to: PartStatus },

    #[error("Part {part_id} was changed by someone else; reload and try again")]
    ConcurrentModification { part_id: String },

    #[error("Part not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("A dependency failed")]
    Dependency(#[source] StorageError),
}

impl From<StorageError> for PartsError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidInput(msg) => PartsError::Validation(msg),
            StorageError::NotFound => PartsError::NotFound("record".to_string()),
            other => PartsError::Dependency(other),
        }
    }
}

pub type PartsResult<T> = Result<T, PartsError>;
