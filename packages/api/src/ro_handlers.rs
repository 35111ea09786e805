// ABOUTME: HTTP request handlers for repair orders
// ABOUTME: CRUD plus the pipeline actions: advance, claim status, and estimate approval

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::Response,
    Json,
};
use revv_repair_orders::{
    ApprovalDecision, ClaimStatus, RepairOrderCreateInput, RepairOrderFilter,
    RepairOrderUpdateInput,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentActor;
use crate::error::{ApiError, ApiResult};
use crate::response::{created, ok};
use crate::state::AppState;

/// Body of `PATCH /api/ros/{id}`. `claim_status` is applied through the
/// pipeline; every other field is a plain edit.
#[derive(Debug, Default, Deserialize)]
pub struct RepairOrderPatch {
    pub claim_status: Option<ClaimStatus>,
    #[serde(flatten)]
    pub fields: RepairOrderUpdateInput,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub decision: ApprovalDecision,
    pub reason: Option<String>,
}

pub async fn list_repair_orders(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    filter: Result<Query<RepairOrderFilter>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(filter) = filter?;
    info!("Listing repair orders for shop: {}", actor.shop_id);

    let ros = state.repair_orders.list(&actor, &filter).await?;
    Ok(ok(ros))
}

pub async fn create_repair_order(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<RepairOrderCreateInput>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(input) = payload?;
    info!("Creating repair order for shop: {}", actor.shop_id);

    let ro = state.repair_orders.create(&actor, input).await?;
    Ok(created(ro))
}

pub async fn get_repair_order(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    info!("Getting repair order: {}", id);

    let ro = state.repair_orders.get(&actor, &id).await?;
    Ok(ok(ro))
}

pub async fn update_repair_order(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    payload: Result<Json<RepairOrderPatch>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(patch) = payload?;
    info!("Updating repair order: {}", id);

    if patch.claim_status.is_none() && patch.fields.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }

    let repair_orders = &state.repair_orders;
    let ro = match (patch.claim_status, patch.fields.is_empty()) {
        (Some(claim), true) => repair_orders.set_claim_status(&actor, &id, claim).await?,
        (Some(claim), false) => {
            repair_orders
                .update_with_claim(&actor, &id, claim, patch.fields)
                .await?
        }
        (None, _) => repair_orders.update(&actor, &id, patch.fields).await?,
    };

    Ok(ok(ro))
}

/// Move to the next pipeline stage
pub async fn advance_repair_order(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    info!("Advancing repair order: {}", id);

    let ro = state.repair_orders.advance(&actor, &id).await?;
    Ok(ok(ro))
}

pub async fn send_for_approval(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    info!("Sending estimate for approval: {}", id);

    let ro = state.repair_orders.send_for_approval(&actor, &id).await?;
    Ok(ok(ro))
}

pub async fn respond_to_approval(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    payload: Result<Json<ApprovalRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    info!(
        "Recording approval decision {:?} for repair order: {}",
        request.decision, id
    );

    let ro = state
        .repair_orders
        .respond_to_approval(&actor, &id, request.decision, request.reason)
        .await?;
    Ok(ok(ro))
}
