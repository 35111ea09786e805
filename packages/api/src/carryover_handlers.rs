// ABOUTME: HTTP request handlers for month-end carryover and revenue reporting
// ABOUTME: Candidate listing, write-once revenue period assignment, and the monthly report

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::Response,
    Json,
};
use revv_core::BillingMonth;
use revv_repair_orders::RevenuePeriod;
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentActor;
use crate::error::ApiResult;
use crate::response::ok;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CarryoverQuery {
    #[serde(rename = "asOf")]
    pub as_of: Option<BillingMonth>,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub month: BillingMonth,
}

#[derive(Debug, Deserialize)]
pub struct RevenuePeriodRequest {
    pub period: RevenuePeriod,
}

pub async fn list_carryover(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    query: Result<Query<CarryoverQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    info!("Listing carryover candidates for shop: {}", actor.shop_id);

    let candidates = state
        .carryover
        .list_carryover_candidates(&actor, query.as_of)
        .await?;
    Ok(ok(candidates))
}

pub async fn assign_revenue_period(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    payload: Result<Json<RevenuePeriodRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    info!(
        "Assigning revenue period {} to repair order: {}",
        request.period, id
    );

    let ro = state
        .carryover
        .assign_revenue_period(&actor, &id, request.period)
        .await?;
    Ok(ok(ro))
}

pub async fn revenue_report(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    info!("Building revenue report for {}", query.month);

    let report = state.carryover.revenue_report(&actor, query.month).await?;
    Ok(ok(report))
}
