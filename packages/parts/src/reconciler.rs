// ABOUTME: Parts tracking reconciler
// ABOUTME: Polls the tracking provider for a part, records the mapped status, and auto-receives deliveries

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use revv_core::{Actor, Clock, SystemClock};
use tracing::{debug, info, warn};

use crate::error::{PartsError, PartsResult, TrackingProviderError};
use crate::provider::{map_provider_status, TrackingProvider};
use crate::service::{not_found, require_member};
use crate::storage::PartStorage;
use crate::types::{Carrier, Part, PartStatus, TrackingCheck, TrackingStatus};

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Receipt date to stamp when a poll says `delivered`, or `None` when the
/// part must not change. Cancelled and already received parts never move.
pub fn auto_receipt_date(
    current: PartStatus,
    tracking: TrackingStatus,
    today: NaiveDate,
) -> Option<NaiveDate> {
    (tracking == TrackingStatus::Delivered && current.is_awaiting_delivery()).then_some(today)
}

pub struct PartsTrackingReconciler {
    storage: Arc<PartStorage>,
    provider: Option<Arc<dyn TrackingProvider>>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl PartsTrackingReconciler {
    /// `provider` is `None` when no tracking API key is configured
    pub fn new(storage: Arc<PartStorage>, provider: Option<Arc<dyn TrackingProvider>>) -> Self {
        Self {
            storage,
            provider,
            clock: Arc::new(SystemClock),
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_live(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn refresh_tracking(&self, actor: &Actor, part_id: &str) -> PartsResult<TrackingCheck> {
        require_member(actor)?;

        let part = self
            .storage
            .get(&actor.shop_id, part_id)
            .await
            .map_err(|err| not_found(err, part_id))?;

        let Some(number) = part.tracking_number.clone().filter(|n| !n.trim().is_empty()) else {
            return Err(PartsError::NoTrackingNumber {
                part_id: part.id.clone(),
            });
        };
        let carrier = part.carrier.unwrap_or(Carrier::Unknown);

        let Some(provider) = &self.provider else {
            debug!(
                "Manual tracking for part {} ({} via {})",
                part.id, number, carrier
            );
            let tracking_url = carrier.tracking_url(&number);
            return Ok(TrackingCheck::Manual {
                part,
                carrier,
                tracking_url,
            });
        };

        let result = tokio::time::timeout(self.timeout, provider.query(&number, carrier))
            .await
            .map_err(|_| TrackingProviderError::Timeout(self.timeout.as_secs()))
            .and_then(|inner| inner);

        let answer = match result {
            Ok(answer) => answer,
            Err(err) => {
                warn!("Tracking refresh failed for part {}: {}", part.id, err);
                return Err(err.into());
            }
        };

        let mapped = map_provider_status(&answer.provider_status);
        let receive_on = auto_receipt_date(part.status, mapped, self.clock.today());

        let written = self
            .storage
            .save_tracking_result(
                &part,
                &number,
                mapped,
                answer.detail.as_deref(),
                self.clock.now(),
                receive_on,
            )
            .await?;
        if !written {
            debug!(
                "Tracking number for part {} changed during refresh; result dropped",
                part.id
            );
        }

        let refreshed = self
            .storage
            .get(&actor.shop_id, part_id)
            .await
            .map_err(|err| not_found(err, part_id))?;
        let auto_received =
            part.status != PartStatus::Received && refreshed.status == PartStatus::Received;

        if auto_received {
            info!("Part {} auto-received on delivery scan", refreshed.id);
        }

        Ok(TrackingCheck::Live {
            part: refreshed,
            provider_status: answer.provider_status,
            auto_received,
        })
    }
}

/// Carrier lookup helper for callers that only have a number
pub fn describe_tracking_number(raw: &str) -> (String, Carrier, String) {
    let number = crate::carrier::normalize_tracking_number(raw);
    let carrier = crate::carrier::detect_carrier(&number);
    let url = carrier.tracking_url(&number);
    (number, carrier, url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    #[test]
    fn test_delivered_receives_awaiting_parts() {
        assert_eq!(
            auto_receipt_date(PartStatus::Ordered, TrackingStatus::Delivered, today()),
            Some(today())
        );
        assert_eq!(
            auto_receipt_date(PartStatus::Backordered, TrackingStatus::Delivered, today()),
            Some(today())
        );
    }

    #[test]
    fn test_cancelled_and_received_parts_are_sticky() {
        for status in [PartStatus::Cancelled, PartStatus::Received] {
            assert_eq!(
                auto_receipt_date(status, TrackingStatus::Delivered, today()),
                None
            );
        }
    }

    #[test]
    fn test_only_delivered_triggers_receipt() {
        for tracking in [
            TrackingStatus::Pending,
            TrackingStatus::InTransit,
            TrackingStatus::OutForDelivery,
            TrackingStatus::Exception,
            TrackingStatus::Expired,
        ] {
            assert_eq!(auto_receipt_date(PartStatus::Ordered, tracking, today()), None);
        }
    }

    #[test]
    fn test_describe_tracking_number() {
        let (number, carrier, url) = describe_tracking_number("1z 999aa1 0123456784");
        assert_eq!(number, "1Z999AA10123456784");
        assert_eq!(carrier, Carrier::Ups);
        assert!(url.contains("1Z999AA10123456784"));
    }
}
