// ABOUTME: HTTP API layer for REVV providing REST endpoints and routing
// ABOUTME: Integration layer over the repair order, carryover, parts, and tracking services

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod carryover_handlers;
pub mod error;
pub mod health;
pub mod parts_handlers;
pub mod response;
pub mod ro_handlers;
pub mod state;
pub mod tracking_handlers;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Creates the repair orders router (nested under /api/ros)
pub fn create_repair_orders_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(ro_handlers::list_repair_orders).post(ro_handlers::create_repair_order),
        )
        .route(
            "/{id}",
            get(ro_handlers::get_repair_order).patch(ro_handlers::update_repair_order),
        )
        // Pipeline actions
        .route("/{id}/status", put(ro_handlers::advance_repair_order))
        .route(
            "/{id}/send-for-approval",
            post(ro_handlers::send_for_approval),
        )
        .route("/{id}/approval", post(ro_handlers::respond_to_approval))
        .route(
            "/{id}/revenue-period",
            put(carryover_handlers::assign_revenue_period),
        )
        // Parts ordered for this RO
        .route(
            "/{id}/parts",
            get(parts_handlers::list_parts).post(parts_handlers::create_part),
        )
}

/// Creates the parts router (nested under /api/parts)
pub fn create_parts_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(parts_handlers::get_part).patch(parts_handlers::update_part),
        )
        .route("/{id}/status", put(parts_handlers::set_part_status))
}

/// Creates the tracking router (nested under /api/tracking)
pub fn create_tracking_router() -> Router<AppState> {
    Router::new()
        .route("/check/{part_id}", post(tracking_handlers::check_tracking))
        .route("/carrier/{number}", get(tracking_handlers::detect_carrier))
}

/// Full API with state applied
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/stages", get(health::list_stages))
        .route("/api/carryover", get(carryover_handlers::list_carryover))
        .route(
            "/api/reports/revenue",
            get(carryover_handlers::revenue_report),
        )
        .nest("/api/ros", create_repair_orders_router())
        .nest("/api/parts", create_parts_router())
        .nest("/api/tracking", create_tracking_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
