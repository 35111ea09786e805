// ABOUTME: Integration tests for part ordering and tracking reconciliation
// ABOUTME: Uses a scripted fake provider and a wiremock-backed HTTP provider against in-memory SQLite

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use revv_core::{Actor, Clock, FixedClock, Role};
use revv_parts::{
    Carrier, HttpTrackingProvider, PartCreateInput, PartService, PartStatus, PartUpdateInput,
    PartsError, PartsTrackingReconciler, ProviderStatus, TrackingCheck, TrackingProvider,
    TrackingProviderError, TrackingStatus,
};
use revv_storage::connect_in_memory;
use sqlx::SqlitePool;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UPS_NUMBER: &str = "1Z999AA10123456784";

/// Answers every query with the same scripted result
struct ScriptedProvider {
    answer: Result<&'static str, ()>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn answering(tag: &'static str) -> Self {
        Self {
            answer: Ok(tag),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            answer: Err(()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn hanging() -> Self {
        Self {
            answer: Ok("Delivered"),
            delay: Some(Duration::from_secs(5)),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TrackingProvider for ScriptedProvider {
    async fn query(
        &self,
        _tracking_number: &str,
        _carrier: Carrier,
    ) -> Result<ProviderStatus, TrackingProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.answer {
            Ok(tag) => Ok(ProviderStatus {
                provider_status: tag.to_string(),
                detail: Some("Front porch".to_string()),
            }),
            Err(()) => Err(TrackingProviderError::Status {
                status: 503,
                body: "down".to_string(),
            }),
        }
    }
}

fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()))
}

fn staff() -> Actor {
    Actor::new("user-staff", "shop-1", Role::Staff)
}

async fn setup() -> (SqlitePool, PartService) {
    let pool = connect_in_memory().await.unwrap();
    sqlx::query(
        "INSERT INTO repair_orders (id, shop_id, customer_name, status, intake_date, billing_month, payment_type, created_at, updated_at)
         VALUES ('ro-1', 'shop-1', 'Dana Reyes', 'parts', '2026-01-05', '2026-01', 'insurance', datetime('now'), datetime('now'))",
    )
    .execute(&pool)
    .await
    .unwrap();

    let service = PartService::with_clock(pool.clone(), clock());
    (pool, service)
}

fn bumper(tracking_number: Option<&str>) -> PartCreateInput {
    PartCreateInput {
        part_name: "Front bumper cover".to_string(),
        part_number: Some("04711-TBA-A00".to_string()),
        vendor: Some("Honda OEM".to_string()),
        quantity: Some(1),
        unit_cost: Some(312.5),
        tracking_number: tracking_number.map(str::to_string),
        ..Default::default()
    }
}

fn reconciler(service: &PartService, provider: Arc<dyn TrackingProvider>) -> PartsTrackingReconciler {
    PartsTrackingReconciler::new(service.storage(), Some(provider)).with_clock(clock())
}

#[tokio::test]
async fn test_create_derives_carrier_and_validates() {
    let (_pool, service) = setup().await;

    let part = service
        .create(&staff(), "ro-1", bumper(Some("1z 999 aa1 0123 456 784")))
        .await
        .unwrap();
    assert_eq!(part.tracking_number.as_deref(), Some(UPS_NUMBER));
    assert_eq!(part.carrier, Some(Carrier::Ups));
    assert_eq!(part.status, PartStatus::Ordered);
    assert_eq!(part.tracking_status, None);

    let zero = PartCreateInput {
        quantity: Some(0),
        ..bumper(None)
    };
    assert!(matches!(
        service.create(&staff(), "ro-1", zero).await,
        Err(PartsError::Validation(_))
    ));

    let negative = PartCreateInput {
        unit_cost: Some(-3.0),
        ..bumper(None)
    };
    assert!(matches!(
        service.create(&staff(), "ro-1", negative).await,
        Err(PartsError::Validation(_))
    ));

    assert!(matches!(
        service.create(&staff(), "ro-missing", bumper(None)).await,
        Err(PartsError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_delivered_scan_auto_receives_ordered_part() {
    let (_pool, service) = setup().await;
    let part = service
        .create(&staff(), "ro-1", bumper(Some(UPS_NUMBER)))
        .await
        .unwrap();

    let reconciler = reconciler(&service, Arc::new(ScriptedProvider::answering("Delivered")));
    let check = reconciler.refresh_tracking(&staff(), &part.id).await.unwrap();

    match check {
        TrackingCheck::Live {
            part,
            auto_received,
            provider_status,
        } => {
            assert!(auto_received);
            assert_eq!(provider_status, "Delivered");
            assert_eq!(part.status, PartStatus::Received);
            assert_eq!(part.received_date, NaiveDate::from_ymd_opt(2026, 1, 15));
            assert_eq!(part.tracking_status, Some(TrackingStatus::Delivered));
            assert_eq!(part.tracking_detail.as_deref(), Some("Front porch"));
            assert!(part.tracking_updated_at.is_some());
        }
        other => panic!("expected a live check, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cancelled_part_is_never_auto_received() {
    let (_pool, service) = setup().await;
    let part = service
        .create(&staff(), "ro-1", bumper(Some(UPS_NUMBER)))
        .await
        .unwrap();
    service
        .set_status(&staff(), &part.id, PartStatus::Cancelled)
        .await
        .unwrap();

    let reconciler = reconciler(&service, Arc::new(ScriptedProvider::answering("Delivered")));
    let check = reconciler.refresh_tracking(&staff(), &part.id).await.unwrap();

    let refreshed = check.part();
    assert_eq!(refreshed.status, PartStatus::Cancelled);
    assert_eq!(refreshed.received_date, None);
    assert_eq!(refreshed.tracking_status, Some(TrackingStatus::Delivered));

    let err = service
        .set_status(&staff(), &part.id, PartStatus::Received)
        .await
        .unwrap_err();
    assert!(matches!(err, PartsError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_provider_failure_leaves_tracking_status_untouched() {
    let (_pool, service) = setup().await;
    let part = service
        .create(&staff(), "ro-1", bumper(Some(UPS_NUMBER)))
        .await
        .unwrap();

    let in_transit = reconciler(&service, Arc::new(ScriptedProvider::answering("InTransit")));
    in_transit.refresh_tracking(&staff(), &part.id).await.unwrap();

    let failing = reconciler(&service, Arc::new(ScriptedProvider::failing()));
    let err = failing.refresh_tracking(&staff(), &part.id).await.unwrap_err();
    assert!(matches!(err, PartsError::TrackingProvider(_)));

    let reloaded = service.get(&staff(), &part.id).await.unwrap();
    assert_eq!(reloaded.tracking_status, Some(TrackingStatus::InTransit));
    assert_eq!(reloaded.status, PartStatus::Ordered);
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let (_pool, service) = setup().await;
    let part = service
        .create(&staff(), "ro-1", bumper(Some(UPS_NUMBER)))
        .await
        .unwrap();

    let provider = Arc::new(ScriptedProvider::hanging());
    let reconciler = PartsTrackingReconciler::new(service.storage(), Some(provider.clone()))
        .with_clock(clock())
        .with_timeout(Duration::from_millis(50));

    let err = reconciler.refresh_tracking(&staff(), &part.id).await.unwrap_err();
    assert!(matches!(
        err,
        PartsError::TrackingProvider(TrackingProviderError::Timeout(_))
    ));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    let reloaded = service.get(&staff(), &part.id).await.unwrap();
    assert_eq!(reloaded.tracking_status, None);
}

#[tokio::test]
async fn test_missing_tracking_number_is_rejected() {
    let (_pool, service) = setup().await;
    let part = service.create(&staff(), "ro-1", bumper(None)).await.unwrap();

    let provider = Arc::new(ScriptedProvider::answering("Delivered"));
    let reconciler = reconciler(&service, provider.clone());
    let err = reconciler.refresh_tracking(&staff(), &part.id).await.unwrap_err();

    assert!(matches!(err, PartsError::NoTrackingNumber { .. }));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_without_api_key_returns_manual_link() {
    let (_pool, service) = setup().await;
    let part = service
        .create(&staff(), "ro-1", bumper(Some(UPS_NUMBER)))
        .await
        .unwrap();

    let reconciler = PartsTrackingReconciler::new(service.storage(), None).with_clock(clock());
    assert!(!reconciler.is_live());

    match reconciler.refresh_tracking(&staff(), &part.id).await.unwrap() {
        TrackingCheck::Manual {
            part,
            carrier,
            tracking_url,
        } => {
            assert_eq!(carrier, Carrier::Ups);
            assert!(tracking_url.starts_with("https://www.ups.com/"));
            assert_eq!(part.tracking_status, None);
        }
        other => panic!("expected a manual check, got {other:?}"),
    }
}

#[tokio::test]
async fn test_changing_tracking_number_resets_tracking_state() {
    let (_pool, service) = setup().await;
    let part = service
        .create(&staff(), "ro-1", bumper(Some(UPS_NUMBER)))
        .await
        .unwrap();
    reconciler(&service, Arc::new(ScriptedProvider::answering("InTransit")))
        .refresh_tracking(&staff(), &part.id)
        .await
        .unwrap();

    let updated = service
        .update(
            &staff(),
            &part.id,
            PartUpdateInput {
                tracking_number: Some("9400 1118 9922 3856 9274 92".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.carrier, Some(Carrier::Usps));
    assert_eq!(updated.tracking_status, None);
    assert_eq!(updated.tracking_detail, None);
    assert_eq!(updated.tracking_updated_at, None);

    let cleared = service
        .update(
            &staff(),
            &part.id,
            PartUpdateInput {
                tracking_number: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.tracking_number, None);
    assert_eq!(cleared.carrier, None);
}

#[tokio::test]
async fn test_manual_status_keeps_received_date_in_step() {
    let (_pool, service) = setup().await;
    let part = service.create(&staff(), "ro-1", bumper(None)).await.unwrap();

    let received = service
        .set_status(&staff(), &part.id, PartStatus::Received)
        .await
        .unwrap();
    assert_eq!(received.received_date, NaiveDate::from_ymd_opt(2026, 1, 15));

    let backordered = service
        .set_status(&staff(), &part.id, PartStatus::Backordered)
        .await
        .unwrap();
    assert_eq!(backordered.received_date, None);

    let customer = Actor::new("user-c", "shop-1", Role::Customer);
    assert!(matches!(
        service
            .set_status(&customer, &part.id, PartStatus::Received)
            .await,
        Err(PartsError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_unknown_carrier_still_asks_the_provider() {
    let (_pool, service) = setup().await;
    let part = service
        .create(&staff(), "ro-1", bumper(Some("ABC123XYZ")))
        .await
        .unwrap();
    assert_eq!(part.carrier, Some(Carrier::Unknown));

    let provider = Arc::new(ScriptedProvider::answering("Delivered"));
    let check = reconciler(&service, provider.clone())
        .refresh_tracking(&staff(), &part.id)
        .await
        .unwrap();

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    match check {
        TrackingCheck::Live {
            part,
            auto_received,
            ..
        } => {
            assert!(auto_received);
            assert_eq!(part.status, PartStatus::Received);
            assert_eq!(part.tracking_status, Some(TrackingStatus::Delivered));
        }
        other => panic!("expected a live check, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_carrier_failure_leaves_tracking_status_untouched() {
    let (_pool, service) = setup().await;
    let part = service
        .create(&staff(), "ro-1", bumper(Some("ABC123XYZ")))
        .await
        .unwrap();

    let provider = Arc::new(ScriptedProvider::failing());
    let err = reconciler(&service, provider.clone())
        .refresh_tracking(&staff(), &part.id)
        .await
        .unwrap_err();
    assert!(matches!(err, PartsError::TrackingProvider(_)));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    let reloaded = service.get(&staff(), &part.id).await.unwrap();
    assert_eq!(reloaded.tracking_status, None);
    assert_eq!(reloaded.status, PartStatus::Ordered);
}

#[tokio::test]
async fn test_resending_same_number_keeps_tracking_state() {
    let (_pool, service) = setup().await;
    let part = service
        .create(&staff(), "ro-1", bumper(Some(UPS_NUMBER)))
        .await
        .unwrap();
    reconciler(&service, Arc::new(ScriptedProvider::answering("InTransit")))
        .refresh_tracking(&staff(), &part.id)
        .await
        .unwrap();

    let updated = service
        .update(
            &staff(),
            &part.id,
            PartUpdateInput {
                tracking_number: Some("1z 999 aa1 0123 456 784".to_string()),
                vendor: Some("LKQ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.tracking_number.as_deref(), Some(UPS_NUMBER));
    assert_eq!(updated.tracking_status, Some(TrackingStatus::InTransit));
    assert_eq!(updated.tracking_detail.as_deref(), Some("Front porch"));
    assert!(updated.tracking_updated_at.is_some());
    assert_eq!(updated.vendor.as_deref(), Some("LKQ"));
}

#[tokio::test]
async fn test_stale_edit_does_not_undo_auto_receipt() {
    let (_pool, service) = setup().await;
    let part = service
        .create(&staff(), "ro-1", bumper(Some(UPS_NUMBER)))
        .await
        .unwrap();

    // Loaded before the delivery scan lands
    let mut stale = service.get(&staff(), &part.id).await.unwrap();
    reconciler(&service, Arc::new(ScriptedProvider::answering("Delivered")))
        .refresh_tracking(&staff(), &part.id)
        .await
        .unwrap();

    stale.vendor = Some("LKQ".to_string());
    let saved = service
        .storage()
        .save_details(&stale, stale.tracking_number.as_deref(), false)
        .await
        .unwrap();
    assert!(saved);

    let reloaded = service.get(&staff(), &part.id).await.unwrap();
    assert_eq!(reloaded.vendor.as_deref(), Some("LKQ"));
    assert_eq!(reloaded.status, PartStatus::Received);
    assert_eq!(reloaded.received_date, NaiveDate::from_ymd_opt(2026, 1, 15));
    assert_eq!(reloaded.tracking_status, Some(TrackingStatus::Delivered));
}

#[tokio::test]
async fn test_stale_status_change_is_refused() {
    let (_pool, service) = setup().await;
    let part = service
        .create(&staff(), "ro-1", bumper(Some(UPS_NUMBER)))
        .await
        .unwrap();

    let mut stale = service.get(&staff(), &part.id).await.unwrap();
    reconciler(&service, Arc::new(ScriptedProvider::answering("Delivered")))
        .refresh_tracking(&staff(), &part.id)
        .await
        .unwrap();

    stale.status = PartStatus::Backordered;
    let saved = service
        .storage()
        .save_status(&stale, PartStatus::Ordered)
        .await
        .unwrap();
    assert!(!saved);

    let reloaded = service.get(&staff(), &part.id).await.unwrap();
    assert_eq!(reloaded.status, PartStatus::Received);
    assert_eq!(reloaded.received_date, NaiveDate::from_ymd_opt(2026, 1, 15));
}

#[tokio::test]
async fn test_stale_tracking_number_swap_is_refused() {
    let (_pool, service) = setup().await;
    let part = service
        .create(&staff(), "ro-1", bumper(Some(UPS_NUMBER)))
        .await
        .unwrap();

    let mut stale = service.get(&staff(), &part.id).await.unwrap();
    service
        .update(
            &staff(),
            &part.id,
            PartUpdateInput {
                tracking_number: Some("9400 1118 9922 3856 9274 92".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let previous = stale.tracking_number.clone();
    assert!(stale.set_tracking_number(Some("ABC123XYZ".to_string())));
    let saved = service
        .storage()
        .save_details(&stale, previous.as_deref(), true)
        .await
        .unwrap();
    assert!(!saved);

    let reloaded = service.get(&staff(), &part.id).await.unwrap();
    assert_eq!(reloaded.tracking_number.as_deref(), Some("9400111899223856927492"));
    assert_eq!(reloaded.carrier, Some(Carrier::Usps));
}

#[tokio::test]
async fn test_http_provider_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/trackings/ups/{}", UPS_NUMBER)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "tracking": { "tag": "Delivered", "checkpoints": [] } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_pool, service) = setup().await;
    let part = service
        .create(&staff(), "ro-1", bumper(Some(UPS_NUMBER)))
        .await
        .unwrap();

    let provider = HttpTrackingProvider::new(server.uri(), "key", Duration::from_secs(5)).unwrap();
    let check = reconciler(&service, Arc::new(provider))
        .refresh_tracking(&staff(), &part.id)
        .await
        .unwrap();

    assert_eq!(check.part().status, PartStatus::Received);
}
