//! Router configuration.

use super::health::health_check;
use super::state::AppState;
use crate::api::{availability, checkout, orders, webhooks};
use axum::{
    routing::{get, post},
    Router,
};

/// Builds the complete Axum router.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/availability", get(availability::get_week_availability))
        .route("/checkout", post(checkout::create_checkout))
        .route("/webhooks/payment", post(webhooks::handle_payment_webhook))
        .route("/orders/events", post(orders::ingest_order_event))
        .route("/orders/cleanup", post(orders::cleanup_orders));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .with_state(state)
}
