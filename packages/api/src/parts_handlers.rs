// ABOUTME: HTTP request handlers for parts on a repair order
// ABOUTME: Create, list, edit, and manual status changes

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Response,
    Json,
};
use revv_parts::{PartCreateInput, PartStatus, PartUpdateInput};
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentActor;
use crate::error::ApiResult;
use crate::response::{created, ok};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PartStatusRequest {
    pub status: PartStatus,
}

pub async fn list_parts(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(ro_id): Path<String>,
) -> ApiResult<Response> {
    info!("Listing parts for repair order: {}", ro_id);

    let parts = state.parts.list_for_repair_order(&actor, &ro_id).await?;
    Ok(ok(parts))
}

pub async fn create_part(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(ro_id): Path<String>,
    payload: Result<Json<PartCreateInput>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(input) = payload?;
    info!("Adding part to repair order: {}", ro_id);

    let part = state.parts.create(&actor, &ro_id, input).await?;
    Ok(created(part))
}

pub async fn get_part(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    info!("Getting part: {}", id);

    let part = state.parts.get(&actor, &id).await?;
    Ok(ok(part))
}

pub async fn update_part(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    payload: Result<Json<PartUpdateInput>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(input) = payload?;
    info!("Updating part: {}", id);

    let part = state.parts.update(&actor, &id, input).await?;
    Ok(ok(part))
}

pub async fn set_part_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    payload: Result<Json<PartStatusRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    info!("Setting part {} status to {:?}", id, request.status);

    let part = state.parts.set_status(&actor, &id, request.status).await?;
    Ok(ok(part))
}
