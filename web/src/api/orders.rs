//! Order-event ingestion and stale-order cleanup endpoints.

use crate::error::AppError;
use crate::server::state::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use booking_core::lifecycle::{LifecycleOutcome, OrderStatusEvent};
use booking_orders::{purge_stale, CleanupOutcome, DEFAULT_STATUSES};
use serde::{Deserialize, Serialize};

/// Header carrying the cleanup token.
pub const CLEANUP_TOKEN_HEADER: &str = "x-cleanup-token";

/// Order-event ingestion response.
#[derive(Debug, Serialize)]
pub struct OrderEventResponse {
    /// What the lifecycle manager did with the event.
    pub outcome: &'static str,
    /// Reservation rows written or released.
    pub affected: u64,
}

/// Applies one order status event to the reservation ledger.
///
/// POST /api/orders/events, fired by the order backend on status
/// transitions. The same transition may also arrive through the payment
/// webhook; both paths are idempotent at the ledger.
pub async fn ingest_order_event(
    State(state): State<AppState>,
    Json(event): Json<OrderStatusEvent>,
) -> Result<Json<OrderEventResponse>, AppError> {
    let outcome = state.lifecycle.apply(&event).await?;

    let response = match outcome {
        LifecycleOutcome::Upserted(lines) => OrderEventResponse {
            outcome: "committed",
            affected: lines as u64,
        },
        LifecycleOutcome::Released(rows) => OrderEventResponse {
            outcome: "released",
            affected: rows,
        },
        LifecycleOutcome::SkippedNoScheduleData => OrderEventResponse {
            outcome: "skipped_no_schedule_data",
            affected: 0,
        },
        LifecycleOutcome::NoOp => OrderEventResponse {
            outcome: "noop",
            affected: 0,
        },
    };
    Ok(Json(response))
}

/// Cleanup request body; all fields optional.
#[derive(Debug, Default, Deserialize)]
pub struct CleanupRequest {
    /// Age cutoff in days; defaults to the configured value.
    #[serde(default)]
    pub days: Option<i64>,
    /// Statuses eligible for purging; defaults to cancelled/failed/pending.
    #[serde(default)]
    pub statuses: Option<Vec<String>>,
}

/// Cleanup response body.
#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    /// Always true when the purge ran.
    pub ok: bool,
    /// Purge outcome.
    #[serde(flatten)]
    pub outcome: CleanupOutcome,
}

/// Deletes stale gateway-tagged orders.
///
/// POST /api/orders/cleanup, guarded by a shared token. An empty configured
/// token disables the endpoint entirely.
pub async fn cleanup_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<CleanupRequest>>,
) -> Result<Json<CleanupResponse>, AppError> {
    let expected = state.config.cleanup.token.as_str();
    let presented = headers
        .get(CLEANUP_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if expected.is_empty() || presented != expected {
        return Err(AppError::unauthorized("invalid cleanup token"));
    }

    let request = body.map(|Json(request)| request).unwrap_or_default();
    let days = request.days.unwrap_or(state.config.cleanup.days);
    let statuses = request.statuses.unwrap_or_else(|| {
        DEFAULT_STATUSES
            .iter()
            .map(ToString::to_string)
            .collect()
    });
    let status_refs: Vec<&str> = statuses.iter().map(String::as_str).collect();

    let outcome = purge_stale(&state.orders, days, &status_refs).await?;
    Ok(Json(CleanupResponse { ok: true, outcome }))
}
