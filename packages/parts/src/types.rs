// ABOUTME: Part type definitions
// ABOUTME: Order status, carrier, normalized tracking status, and the part record with its inputs

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PartStatus {
    Ordered,
    Backordered,
    Received,
    Cancelled,
}

impl PartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartStatus::Ordered => "ordered",
            PartStatus::Backordered => "backordered",
            PartStatus::Received => "received",
            PartStatus::Cancelled => "cancelled",
        }
    }

    /// Parts still on their way from the vendor
    pub fn is_awaiting_delivery(&self) -> bool {
        matches!(self, PartStatus::Ordered | PartStatus::Backordered)
    }
}

impl fmt::Display for PartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shipment status in REVV's own vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    Pending,
    InTransit,
    OutForDelivery,
    Delivered,
    Exception,
    Expired,
}

impl TrackingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingStatus::Pending => "pending",
            TrackingStatus::InTransit => "in_transit",
            TrackingStatus::OutForDelivery => "out_for_delivery",
            TrackingStatus::Delivered => "delivered",
            TrackingStatus::Exception => "exception",
            TrackingStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Carrier {
    Ups,
    Fedex,
    Usps,
    Dhl,
    Unknown,
}

impl Carrier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Carrier::Ups => "ups",
            Carrier::Fedex => "fedex",
            Carrier::Usps => "usps",
            Carrier::Dhl => "dhl",
            Carrier::Unknown => "unknown",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Carrier::Ups => "UPS",
            Carrier::Fedex => "FedEx",
            Carrier::Usps => "USPS",
            Carrier::Dhl => "DHL",
            Carrier::Unknown => "Unknown carrier",
        }
    }

    /// Public tracking page for a normalized tracking number
    pub fn tracking_url(&self, tracking_number: &str) -> String {
        match self {
            Carrier::Ups => format!("https://www.ups.com/track?tracknum={}", tracking_number),
            Carrier::Fedex => format!(
                "https://www.fedex.com/fedextrack/?trknbr={}",
                tracking_number
            ),
            Carrier::Usps => format!(
                "https://tools.usps.com/go/TrackConfirmAction?tLabels={}",
                tracking_number
            ),
            Carrier::Dhl => format!(
                "https://www.dhl.com/us-en/home/tracking.html?tracking-id={}",
                tracking_number
            ),
            Carrier::Unknown => format!("https://parcelsapp.com/en/tracking/{}", tracking_number),
        }
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Part {
    pub id: String,
    pub shop_id: String,
    pub ro_id: String,
    pub part_name: String,
    pub part_number: Option<String>,
    pub vendor: Option<String>,
    pub quantity: i64,
    pub unit_cost: f64,
    pub status: PartStatus,

    pub tracking_number: Option<String>,
    pub carrier: Option<Carrier>,
    pub tracking_status: Option<TrackingStatus>,
    pub tracking_detail: Option<String>,
    pub tracking_updated_at: Option<DateTime<Utc>>,

    pub expected_date: Option<NaiveDate>,
    pub received_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Part {
    pub fn total_cost(&self) -> f64 {
        self.unit_cost * self.quantity as f64
    }

    pub fn tracking_url(&self) -> Option<String> {
        let number = self.tracking_number.as_deref()?;
        Some(self.carrier.unwrap_or(Carrier::Unknown).tracking_url(number))
    }

    /// Replace the tracking number, re-deriving the carrier and dropping any
    /// provider state tied to the old number. Re-sending the current number
    /// keeps everything. Returns whether the number changed.
    pub fn set_tracking_number(&mut self, tracking_number: Option<String>) -> bool {
        let normalized = tracking_number
            .map(|n| crate::carrier::normalize_tracking_number(&n))
            .filter(|n| !n.is_empty());
        if normalized == self.tracking_number {
            return false;
        }

        self.carrier = normalized.as_deref().map(crate::carrier::detect_carrier);
        self.tracking_number = normalized;
        self.tracking_status = None;
        self.tracking_detail = None;
        self.tracking_updated_at = None;
        true
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartCreateInput {
    pub part_name: String,
    pub part_number: Option<String>,
    pub vendor: Option<String>,
    /// Defaults to 1
    pub quantity: Option<i64>,
    pub unit_cost: Option<f64>,
    /// `ordered` (default) or `backordered`
    pub status: Option<PartStatus>,
    pub tracking_number: Option<String>,
    pub expected_date: Option<NaiveDate>,
}

/// Editable part fields. Status changes go through the status endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartUpdateInput {
    pub part_name: Option<String>,
    pub part_number: Option<String>,
    pub vendor: Option<String>,
    pub quantity: Option<i64>,
    pub unit_cost: Option<f64>,
    /// An empty string removes the tracking number
    pub tracking_number: Option<String>,
    pub expected_date: Option<NaiveDate>,
}

impl PartUpdateInput {
    pub fn is_empty(&self) -> bool {
        self.part_name.is_none()
            && self.part_number.is_none()
            && self.vendor.is_none()
            && self.quantity.is_none()
            && self.unit_cost.is_none()
            && self.tracking_number.is_none()
            && self.expected_date.is_none()
    }
}

/// Outcome of a tracking refresh
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TrackingCheck {
    /// The provider was queried and the part updated
    Live {
        part: Part,
        provider_status: String,
        auto_received: bool,
    },
    /// No provider is available; the caller gets the carrier's own page
    Manual {
        part: Part,
        carrier: Carrier,
        tracking_url: String,
    },
}

impl TrackingCheck {
    pub fn part(&self) -> &Part {
        match self {
            TrackingCheck::Live { part, .. } | TrackingCheck::Manual { part, .. } => part,
        }
    }
}
