// ABOUTME: Parts ordering and carrier tracking for REVV
// ABOUTME: Carrier detection, tracking provider adapter, reconciler, and part storage

pub mod carrier;
pub mod error;
pub mod provider;
pub mod reconciler;
pub mod service;
pub mod storage;
pub mod types;

pub use carrier::{detect_carrier, normalize_tracking_number};
pub use error::{PartsError, PartsResult, TrackingProviderError};
pub use provider::{map_provider_status, HttpTrackingProvider, ProviderStatus, TrackingProvider};
pub use reconciler::{auto_receipt_date, describe_tracking_number, PartsTrackingReconciler};
pub use service::PartService;
pub use storage::PartStorage;
pub use types::{
    Carrier, Part, PartCreateInput, PartStatus, PartUpdateInput, TrackingCheck, TrackingStatus,
};
