// ABOUTME: Liveness and reference-data endpoints
// ABOUTME: Health check with a database ping, and the ordered stage list for clients

use axum::{extract::State, response::Response, Json};
use chrono::Utc;
use revv_repair_orders::stages;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::response::ok;
use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => "ok",
        Err(err) => {
            warn!("Health check database ping failed: {}", err);
            "unavailable"
        }
    };

    Json(json!({
        "status": if database == "ok" { "healthy" } else { "degraded" },
        "database": database,
        "timestamp": Utc::now().timestamp(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "revv-api"
    }))
}

#[derive(Debug, Serialize)]
pub struct StageInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub position: usize,
    pub customer_message: &'static str,
}

/// Pipeline stages in order, with display metadata
pub async fn list_stages() -> Response {
    let stages: Vec<StageInfo> = stages()
        .iter()
        .map(|stage| StageInfo {
            id: stage.as_str(),
            label: stage.label(),
            color: stage.color(),
            position: stage.position(),
            customer_message: stage.customer_message(),
        })
        .collect();

    ok(stages)
}
