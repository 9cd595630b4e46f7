//! Payment webhook endpoint.
//!
//! POST /api/webhooks/payment receives provider events. The raw body is
//! signature-checked before anything else happens; a verification failure
//! rejects the request with no state change. A verified event whose merchant
//! reference matches no order is acknowledged and logged, since the provider
//! would otherwise retry it forever.

use crate::error::AppError;
use crate::server::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use booking_core::payment::map_provider_status;
use booking_gateway::{KEY_ID_HEADER, SIGNATURE_HEADER};
use booking_orders::{MetaDatum, OrderUpdate};
use serde::Serialize;

/// Webhook acknowledgement body.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    /// Always true when the webhook was accepted.
    pub received: bool,
}

/// Verifies and applies one provider event.
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let key_id = header_text(&headers, KEY_ID_HEADER)
        .ok_or_else(|| AppError::bad_request("missing signature key header"))?;
    let signature = header_text(&headers, SIGNATURE_HEADER)
        .ok_or_else(|| AppError::bad_request("missing signature header"))?;

    let event = state.verifier.verify(&body, key_id, signature)?;
    metrics::counter!("payment_webhooks_verified_total").increment(1);

    let Some(order_id) = event.order_id else {
        tracing::info!(
            event_type = %event.event_type,
            merchant_reference = event.merchant_reference.as_deref().unwrap_or(""),
            "webhook carries no parsable merchant reference, ignoring"
        );
        return Ok(Json(WebhookAck { received: true }));
    };

    let status = map_provider_status(&event.payment_status);
    tracing::info!(
        order_id = order_id.value(),
        event_type = %event.event_type,
        payment_status = %event.payment_status,
        order_status = %status,
        "payment webhook received"
    );

    let order = state.orders.get_order(order_id).await?;
    state
        .orders
        .update_order(
            order_id,
            &OrderUpdate {
                status: Some(status),
                meta_data: vec![
                    MetaDatum::text("payment_last_event", event.event_type.clone()),
                    MetaDatum::text("payment_last_status", event.payment_status.clone()),
                ],
            },
        )
        .await?;

    state.lifecycle.apply(&order.status_event(status)).await?;

    Ok(Json(WebhookAck { received: true }))
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
