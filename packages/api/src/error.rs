// ABOUTME: API error type mapping domain failures to HTTP responses
// ABOUTME: Machine-readable codes, sanitized messages, and a request id on every error body

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use revv_parts::PartsError;
use revv_repair_orders::PipelineError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing or invalid identity headers")]
    Unauthorized,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Parts(#[from] PartsError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorDetail,
    request_id: String,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

const DEPENDENCY_MESSAGE: &str = "A backing service is unavailable; please try again shortly";

impl ApiError {
    pub fn to_status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Pipeline(err) => match err {
                PipelineError::TerminalState { .. } => (StatusCode::CONFLICT, "TERMINAL_STATE"),
                PipelineError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "INVALID_TRANSITION")
                }
                PipelineError::BlockedByClaim { .. } => (StatusCode::CONFLICT, "BLOCKED_BY_CLAIM"),
                PipelineError::InvalidClaimTransition { .. } => {
                    (StatusCode::CONFLICT, "INVALID_CLAIM_TRANSITION")
                }
                PipelineError::AlreadyAssigned { .. } => (StatusCode::CONFLICT, "ALREADY_ASSIGNED"),
                PipelineError::ConcurrentModification { .. } => {
                    (StatusCode::CONFLICT, "CONCURRENT_MODIFICATION")
                }
                PipelineError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                PipelineError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                PipelineError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                PipelineError::Dependency(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "DEPENDENCY_ERROR")
                }
            },
            ApiError::Parts(err) => match err {
                PartsError::NoTrackingNumber { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "NO_TRACKING_NUMBER")
                }
                PartsError::TrackingProvider(_) => {
                    (StatusCode::BAD_GATEWAY, "TRACKING_PROVIDER_ERROR")
                }
                PartsError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "INVALID_TRANSITION")
                }
                PartsError::ConcurrentModification { .. } => {
                    (StatusCode::CONFLICT, "CONCURRENT_MODIFICATION")
                }
                PartsError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                PartsError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                PartsError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                PartsError::Dependency(_) => (StatusCode::SERVICE_UNAVAILABLE, "DEPENDENCY_ERROR"),
            },
        }
    }

    /// Message safe to show a client. Dependency failures never echo the
    /// underlying error.
    pub fn to_user_message(&self) -> String {
        match self {
            ApiError::Validation(msg) => format!("Validation failed: {}", msg),
            ApiError::Unauthorized => "Authentication required".to_string(),
            ApiError::Pipeline(PipelineError::Dependency(_))
            | ApiError::Parts(PartsError::Dependency(_)) => DEPENDENCY_MESSAGE.to_string(),
            ApiError::Pipeline(err) => err.to_string(),
            ApiError::Parts(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let (status, code) = self.to_status_and_code();

        match &self {
            ApiError::Pipeline(PipelineError::Dependency(source))
            | ApiError::Parts(PartsError::Dependency(source)) => {
                error!(request_id = %request_id, error = %source, "Dependency failure");
            }
            ApiError::Parts(PartsError::TrackingProvider(source)) => {
                warn!(request_id = %request_id, error = %source, "Tracking provider failure");
            }
            _ => {}
        }

        let body = ErrorResponse {
            success: false,
            error: ErrorDetail {
                code,
                message: self.to_user_message(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revv_parts::{PartStatus, TrackingProviderError};
    use revv_repair_orders::ClaimStatus;
    use revv_storage::StorageError;

    #[test]
    fn test_domain_errors_map_to_conflict_codes() {
        let cases = [
            (
                ApiError::from(PipelineError::TerminalState {
                    ro_id: "ro-1".to_string(),
                }),
                "TERMINAL_STATE",
            ),
            (
                ApiError::from(PipelineError::BlockedByClaim {
                    claim: ClaimStatus::Siu,
                }),
                "BLOCKED_BY_CLAIM",
            ),
            (
                ApiError::from(PartsError::InvalidTransition {
                    from: PartStatus::Cancelled,
                    to: PartStatus::Received,
                }),
                "INVALID_TRANSITION",
            ),
            (
                ApiError::from(PartsError::ConcurrentModification {
                    part_id: "part-1".to_string(),
                }),
                "CONCURRENT_MODIFICATION",
            ),
        ];

        for (err, expected) in cases {
            let (status, code) = err.to_status_and_code();
            assert_eq!(status, StatusCode::CONFLICT);
            assert_eq!(code, expected);
        }
    }

    #[test]
    fn test_tracking_errors() {
        let missing = ApiError::from(PartsError::NoTrackingNumber {
            part_id: "part-1".to_string(),
        });
        assert_eq!(
            missing.to_status_and_code(),
            (StatusCode::UNPROCESSABLE_ENTITY, "NO_TRACKING_NUMBER")
        );

        let provider = ApiError::from(PartsError::from(TrackingProviderError::Timeout(10)));
        assert_eq!(
            provider.to_status_and_code(),
            (StatusCode::BAD_GATEWAY, "TRACKING_PROVIDER_ERROR")
        );
    }

    #[test]
    fn test_dependency_message_is_generic() {
        let err = ApiError::from(PipelineError::Dependency(StorageError::Database(
            "disk I/O error at /var/lib/revv.db".to_string(),
        )));

        assert_eq!(
            err.to_status_and_code(),
            (StatusCode::SERVICE_UNAVAILABLE, "DEPENDENCY_ERROR")
        );
        assert!(!err.to_user_message().contains("/var/lib"));
    }

    #[test]
    fn test_terminal_message_is_actionable() {
        let err = ApiError::from(PipelineError::TerminalState {
            ro_id: "ro-1".to_string(),
        });
        assert_eq!(
            err.to_user_message(),
            "This RO is closed and cannot be advanced"
        );
    }
}
