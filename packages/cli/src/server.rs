// ABOUTME: Wires configuration into services and runs the HTTP server
// ABOUTME: Chooses live or stand-in adapters for tracking, SMS, and email

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use revv_api::{create_router, AppState};
use revv_notifications::{
    HttpEmailTransport, LogTransport, NotificationDispatcher, NotificationTransport,
    TwilioSmsTransport,
};
use revv_parts::{HttpTrackingProvider, PartService, PartsTrackingReconciler, TrackingProvider};
use revv_repair_orders::RepairOrderService;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;

fn email_transport(config: &Config) -> anyhow::Result<Arc<dyn NotificationTransport>> {
    let transport: Arc<dyn NotificationTransport> = match &config.email {
        Some(email) => Arc::new(
            HttpEmailTransport::new(
                &email.api_url,
                &email.api_key,
                &email.from_address,
                config.http_timeout,
            )
            .context("Failed to build email client")?,
        ),
        None => {
            info!("Email is not configured; email notifications will only be logged");
            Arc::new(LogTransport::new("email"))
        }
    };
    Ok(transport)
}

fn sms_transport(config: &Config) -> anyhow::Result<Arc<dyn NotificationTransport>> {
    let transport: Arc<dyn NotificationTransport> = match &config.sms {
        Some(sms) => Arc::new(
            TwilioSmsTransport::new(
                &sms.api_url,
                &sms.account_sid,
                &sms.auth_token,
                &sms.from_number,
                config.http_timeout,
            )
            .context("Failed to build SMS client")?,
        ),
        None => {
            info!("Twilio is not configured; SMS notifications will only be logged");
            Arc::new(LogTransport::new("sms"))
        }
    };
    Ok(transport)
}

fn tracking_provider(config: &Config) -> anyhow::Result<Option<Arc<dyn TrackingProvider>>> {
    match &config.tracking {
        Some(tracking) => {
            let provider =
                HttpTrackingProvider::new(&tracking.api_url, &tracking.api_key, config.http_timeout)
                    .context("Failed to build tracking client")?;
            let provider: Arc<dyn TrackingProvider> = Arc::new(provider);
            Ok(Some(provider))
        }
        None => {
            info!("No tracking API key; parts tracking runs in manual-link mode");
            Ok(None)
        }
    }
}

/// Services over `pool`, with adapters chosen from `config`
pub fn build_state(config: &Config, pool: SqlitePool) -> anyhow::Result<AppState> {
    let dispatcher = NotificationDispatcher::new(
        email_transport(config)?,
        sms_transport(config)?,
        config.shop_name.clone(),
    );

    let repair_orders =
        Arc::new(RepairOrderService::new(pool.clone()).with_observer(Arc::new(dispatcher)));
    let parts = Arc::new(PartService::new(pool));
    let tracking = Arc::new(
        PartsTrackingReconciler::new(parts.storage(), tracking_provider(config)?)
            .with_timeout(config.http_timeout),
    );

    Ok(AppState::new(repair_orders, parts, tracking))
}

pub fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin = origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
        .allow_headers(Any))
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = revv_storage::init_pool(&config.database_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open database at {}",
                config.database_path.display()
            )
        })?;

    let state = build_state(&config, pool)?;
    let app = create_router(state).layer(cors_layer(&config.cors_origin)?);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    info!("REVV API listening on http://{}", addr);
    info!("CORS origin: {}", config.cors_origin);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
