// ABOUTME: HTTP request handlers for carrier tracking
// ABOUTME: On-demand tracking refresh for a part and carrier detection for a raw number

use axum::{
    extract::{Path, State},
    response::Response,
};
use revv_parts::{describe_tracking_number, Carrier};
use serde::Serialize;
use tracing::info;

use crate::auth::CurrentActor;
use crate::error::ApiResult;
use crate::response::ok;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CarrierLookup {
    pub tracking_number: String,
    pub carrier: Carrier,
    pub carrier_name: &'static str,
    pub tracking_url: String,
}

pub async fn check_tracking(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(part_id): Path<String>,
) -> ApiResult<Response> {
    info!("Checking tracking for part: {}", part_id);

    let check = state.tracking.refresh_tracking(&actor, &part_id).await?;
    Ok(ok(check))
}

pub async fn detect_carrier(Path(number): Path<String>) -> Response {
    let (tracking_number, carrier, tracking_url) = describe_tracking_number(&number);

    ok(CarrierLookup {
        tracking_number,
        carrier,
        carrier_name: carrier.display_name(),
        tracking_url,
    })
}
