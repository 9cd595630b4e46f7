//! Checkout endpoint.
//!
//! POST /api/checkout creates a pending order in the order backend, opens a
//! hosted payment session for it and returns the redirect URL. Payment
//! confirmation arrives later through the webhook; nothing is reserved here.

use crate::error::AppError;
use crate::server::state::AppState;
use axum::extract::State;
use axum::Json;
use booking_core::lifecycle::OrderStatus;
use booking_core::types::OrderId;
use booking_gateway::{GatewayError, SessionRequest};
use booking_orders::{
    Billing, MetaDatum, NewOrder, OrderLineItem, OrderUpdate, META_ITEM_TYPE,
    META_PAYMENT_PROVIDER, META_SCHEDULED_DATE, META_SERVICE_SLUG, META_SUBSCRIPTION_SLUG,
    META_TIME_SLOT, PROVIDER_TAG,
};
use serde::{Deserialize, Serialize};

/// Checkout request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Display name of the booked service.
    pub service_name: Option<String>,
    /// Service slug.
    #[serde(default)]
    pub service_slug: Option<String>,
    /// Subscription slug.
    #[serde(default)]
    pub subscription_slug: Option<String>,
    /// `"service"` (default) or `"subscription"`.
    #[serde(default)]
    pub item_type: Option<String>,
    /// Amount in major units; number or string with `,` or `.` separator.
    #[serde(default)]
    pub amount: Option<AmountMajor>,
    /// Amount in minor units; wins over `amount` when present.
    #[serde(default)]
    pub amount_minor: Option<i64>,
    /// ISO 4217 currency, default EUR.
    #[serde(default)]
    pub currency: Option<String>,
    /// Customer email.
    pub customer_email: Option<String>,
    /// Customer first name.
    #[serde(default)]
    pub customer_first_name: Option<String>,
    /// Customer last name.
    #[serde(default)]
    pub customer_last_name: Option<String>,
    /// Customer phone.
    #[serde(default)]
    pub customer_phone: Option<String>,
    /// Booked date, ISO `YYYY-MM-DD`.
    pub scheduled_date: Option<String>,
    /// Booked slot label.
    #[serde(default)]
    pub time_slot: Option<String>,
}

/// Major-unit amounts arrive as numbers or locale-formatted strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AmountMajor {
    /// Plain JSON number.
    Number(f64),
    /// String form, possibly with a comma decimal separator.
    Text(String),
}

impl AmountMajor {
    /// Normalizes to minor units. `None` for unparsable input.
    #[must_use]
    pub fn to_minor(&self) -> Option<i64> {
        let major = match self {
            Self::Number(n) => *n,
            Self::Text(raw) => raw.trim().replace(',', ".").parse::<f64>().ok()?,
        };
        if !major.is_finite() {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        Some((major * 100.0).round() as i64)
    }
}

/// Checkout response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    /// Created order id.
    pub order_id: OrderId,
    /// Hosted payment page URL.
    pub redirect_url: String,
    /// Provider session id.
    pub session_id: String,
}

/// Creates an order and its hosted payment session.
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    if !state.config.payments.enabled {
        return Err(AppError::forbidden("payments are currently disabled"));
    }
    let Some(gateway) = state.gateway.as_ref() else {
        return Err(AppError::unavailable("payment gateway not configured"));
    };

    // Boundary validation, before any external call.
    let service_name = required_text(request.service_name.as_deref(), "serviceName")?;
    let customer_email = required_text(request.customer_email.as_deref(), "customerEmail")?;
    let scheduled_date = required_text(request.scheduled_date.as_deref(), "scheduledDate")?;
    let amount_minor = request
        .amount_minor
        .or_else(|| request.amount.as_ref().and_then(AmountMajor::to_minor))
        .filter(|minor| *minor > 0)
        .ok_or_else(|| AppError::bad_request("missing or invalid amount"))?;
    if state.config.orders.default_product_id == 0 {
        return Err(AppError::unavailable("checkout product is not configured"));
    }

    let currency = request
        .currency
        .clone()
        .unwrap_or_else(|| "EUR".to_string());
    let item_type = request
        .item_type
        .clone()
        .unwrap_or_else(|| "service".to_string());

    #[allow(clippy::cast_precision_loss)]
    let total_major = format!("{:.2}", amount_minor as f64 / 100.0);
    let order = state
        .orders
        .create_order(&NewOrder {
            status: OrderStatus::Pending,
            currency: currency.clone(),
            set_paid: false,
            billing: Billing {
                first_name: request.customer_first_name.clone().unwrap_or_default(),
                last_name: request.customer_last_name.clone().unwrap_or_default(),
                email: customer_email.to_string(),
                phone: request.customer_phone.clone().unwrap_or_default(),
            },
            line_items: vec![OrderLineItem {
                id: None,
                product_id: Some(state.config.orders.default_product_id),
                quantity: 1,
                name: service_name.to_string(),
                total: Some(total_major),
            }],
            meta_data: vec![
                MetaDatum::text(META_SERVICE_SLUG, request.service_slug.clone().unwrap_or_default()),
                MetaDatum::text(
                    META_SUBSCRIPTION_SLUG,
                    request.subscription_slug.clone().unwrap_or_default(),
                ),
                MetaDatum::text(META_ITEM_TYPE, item_type),
                MetaDatum::text(META_SCHEDULED_DATE, scheduled_date),
                MetaDatum::text(META_TIME_SLOT, request.time_slot.clone().unwrap_or_default()),
                MetaDatum::text(META_PAYMENT_PROVIDER, PROVIDER_TAG),
            ],
        })
        .await?;

    tracing::info!(order_id = order.id.value(), "checkout order created");
    metrics::counter!("checkout_orders_created_total").increment(1);

    let return_url = format!(
        "{}/payment/return?orderId={}",
        state.config.server.public_base_url.trim_end_matches('/'),
        order.id.value()
    );

    let session = gateway
        .create_hosted_session(&SessionRequest {
            order_id: order.id,
            amount_minor: amount_minor.unsigned_abs(),
            currency,
            customer_email: customer_email.to_string(),
            customer_phone: request.customer_phone.clone().filter(|p| !p.is_empty()),
            return_url,
            webhook_url: state.config.payments.webhook_url.clone(),
        })
        .await;

    let session = match session {
        Ok(session) => session,
        Err(error) => return Err(fail_order(&state, order.id, error).await),
    };

    // Best effort; the session already exists and the webhook will still
    // land if this write is lost.
    let recorded = state
        .orders
        .update_order(
            order.id,
            &OrderUpdate {
                status: None,
                meta_data: vec![
                    MetaDatum::text("payment_session_id", session.session_id.clone()),
                    MetaDatum::text("payment_redirect_url", session.redirect_url.clone()),
                ],
            },
        )
        .await;
    if let Err(error) = recorded {
        tracing::warn!(order_id = order.id.value(), %error, "failed to record session on order");
    }

    Ok(Json(CheckoutResponse {
        order_id: order.id,
        redirect_url: session.redirect_url,
        session_id: session.session_id,
    }))
}

fn required_text<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request(format!("missing {field}")))
}

/// Marks the order failed after a gateway decline, retaining the raw
/// provider error on the order for diagnostics.
async fn fail_order(state: &AppState, order_id: OrderId, error: GatewayError) -> AppError {
    let (raw_status, raw_body) = match &error {
        GatewayError::Rejected { status, body } => (status.to_string(), body.clone()),
        other => (String::new(), other.to_string()),
    };

    let marked = state
        .orders
        .update_order(
            order_id,
            &OrderUpdate {
                status: Some(OrderStatus::Failed),
                meta_data: vec![
                    MetaDatum::text("payment_last_error", raw_body.clone()),
                    MetaDatum::text("payment_last_status", raw_status),
                ],
            },
        )
        .await;
    if let Err(update_error) = marked {
        tracing::warn!(
            order_id = order_id.value(),
            %update_error,
            "failed to mark order failed after gateway decline"
        );
    }

    if state.config.payments.expose_debug {
        AppError::upstream(format!("payment session rejected: {raw_body}"))
            .with_source(anyhow::Error::new(error))
    } else {
        AppError::from(error)
    }
}
