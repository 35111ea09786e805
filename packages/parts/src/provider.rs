// ABOUTME: Tracking provider seam and its HTTP adapter
// ABOUTME: Queries an AfterShip-style tracking API and maps its tags onto TrackingStatus

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::TrackingProviderError;
use crate::types::{Carrier, TrackingStatus};

/// Raw answer from a tracking provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub provider_status: String,
    pub detail: Option<String>,
}

#[async_trait]
pub trait TrackingProvider: Send + Sync {
    async fn query(
        &self,
        tracking_number: &str,
        carrier: Carrier,
    ) -> Result<ProviderStatus, TrackingProviderError>;
}

/// Translate a provider tag into REVV's vocabulary. Anything unrecognized is
/// treated as an exception so a human looks at it.
pub fn map_provider_status(raw: &str) -> TrackingStatus {
    let key: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    match key.as_str() {
        "pending" | "inforeceived" => TrackingStatus::Pending,
        "intransit" => TrackingStatus::InTransit,
        "outfordelivery" | "availableforpickup" => TrackingStatus::OutForDelivery,
        "delivered" => TrackingStatus::Delivered,
        "exception" | "attemptfail" => TrackingStatus::Exception,
        "expired" => TrackingStatus::Expired,
        _ => TrackingStatus::Exception,
    }
}

fn carrier_slug(carrier: Carrier) -> Option<&'static str> {
    match carrier {
        Carrier::Ups => Some("ups"),
        Carrier::Fedex => Some("fedex"),
        Carrier::Usps => Some("usps"),
        Carrier::Dhl => Some("dhl"),
        Carrier::Unknown => None,
    }
}

#[derive(Debug, Deserialize)]
struct TrackingEnvelope {
    data: TrackingData,
}

#[derive(Debug, Deserialize)]
struct TrackingData {
    tracking: TrackingBody,
}

/// Answer to a slug-less search by number
#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    data: SearchData,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    trackings: Vec<TrackingBody>,
}

#[derive(Debug, Deserialize)]
struct TrackingBody {
    tag: String,
    #[serde(default)]
    subtag_message: Option<String>,
    #[serde(default)]
    checkpoints: Vec<Checkpoint>,
}

#[derive(Debug, Deserialize)]
struct Checkpoint {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

impl TrackingBody {
    fn into_status(self) -> ProviderStatus {
        let latest = self.checkpoints.last().and_then(|checkpoint| {
            match (&checkpoint.message, &checkpoint.location) {
                (Some(message), Some(location)) => Some(format!("{} ({})", message, location)),
                (Some(message), None) => Some(message.clone()),
                _ => None,
            }
        });

        ProviderStatus {
            provider_status: self.tag,
            detail: latest.or(self.subtag_message),
        }
    }
}

/// AfterShip-style REST adapter: `GET {base}/trackings/{slug}/{number}`, or
/// `GET {base}/trackings?tracking_numbers={number}` when the carrier is unknown
pub struct HttpTrackingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpTrackingProvider {
    pub const API_KEY_HEADER: &'static str = "as-api-key";

    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TrackingProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TrackingProviderError> {
        let response = request
            .header(Self::API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    TrackingProviderError::Timeout(self.timeout.as_secs())
                } else {
                    TrackingProviderError::Http(err)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackingProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|err| TrackingProviderError::Parse(err.to_string()))
    }
}

#[async_trait]
impl TrackingProvider for HttpTrackingProvider {
    async fn query(
        &self,
        tracking_number: &str,
        carrier: Carrier,
    ) -> Result<ProviderStatus, TrackingProviderError> {
        let tracking = match carrier_slug(carrier) {
            Some(slug) => {
                let url = format!("{}/trackings/{}/{}", self.base_url, slug, tracking_number);
                debug!("Querying tracking provider: {}", url);

                let envelope: TrackingEnvelope = self.fetch(self.client.get(&url)).await?;
                envelope.data.tracking
            }
            None => {
                let url = format!("{}/trackings", self.base_url);
                debug!(
                    "Searching tracking provider for {} without a carrier",
                    tracking_number
                );

                let request = self
                    .client
                    .get(&url)
                    .query(&[("tracking_numbers", tracking_number)]);
                let envelope: SearchEnvelope = self.fetch(request).await?;
                envelope.data.trackings.into_iter().next().ok_or_else(|| {
                    TrackingProviderError::UnknownNumber(tracking_number.to_string())
                })?
            }
        };

        Ok(tracking.into_status())
    }
}
