//! Provider webhook event decoding.
//!
//! Provider payloads are loosely shaped: the payment status and merchant
//! reference appear at different nesting depths depending on the event type.
//! Decoding probes the known locations in order and keeps the first hit.

use crate::error::GatewayError;
use crate::reference::parse_reference;
use booking_core::types::OrderId;
use serde::Deserialize;

/// A verified, decoded provider event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookEvent {
    /// Provider event type, `"unknown"` when absent.
    pub event_type: String,
    /// Raw payment status, `"unknown"` when absent.
    pub payment_status: String,
    /// Merchant reference as received.
    pub merchant_reference: Option<String>,
    /// Order id extracted from the merchant reference, when parsable.
    pub order_id: Option<OrderId>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: Option<String>,
    status: Option<StatusValue>,
    #[serde(rename = "merchantReference")]
    merchant_reference: Option<String>,
    payment: Option<RawPayment>,
}

#[derive(Debug, Deserialize)]
struct RawPayment {
    status: Option<StatusValue>,
    #[serde(rename = "statusOutput")]
    status_output: Option<RawStatusOutput>,
    references: Option<RawReferences>,
    #[serde(rename = "paymentOutput")]
    payment_output: Option<RawPaymentOutput>,
}

#[derive(Debug, Deserialize)]
struct RawStatusOutput {
    #[serde(rename = "statusCode")]
    status_code: Option<StatusValue>,
}

#[derive(Debug, Deserialize)]
struct RawPaymentOutput {
    references: Option<RawReferences>,
}

#[derive(Debug, Deserialize)]
struct RawReferences {
    #[serde(rename = "merchantReference")]
    merchant_reference: Option<String>,
}

/// Status fields arrive as strings or bare numbers depending on depth.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatusValue {
    Text(String),
    Code(i64),
}

impl StatusValue {
    fn clone_string(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Code(n) => n.to_string(),
        }
    }
}

impl WebhookEvent {
    /// Decodes a raw provider payload.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Decode`] when the body is not JSON of the
    /// expected rough shape. Missing fields are not an error; an event with
    /// no parsable merchant reference simply carries no order id.
    pub fn decode(raw_body: &[u8]) -> Result<Self, GatewayError> {
        let raw: RawEvent = serde_json::from_slice(raw_body)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        let payment_status = raw
            .payment
            .as_ref()
            .and_then(|p| p.status.as_ref().map(|s| s.clone_string()))
            .or_else(|| {
                raw.payment
                    .as_ref()
                    .and_then(|p| p.status_output.as_ref())
                    .and_then(|o| o.status_code.as_ref().map(|s| s.clone_string()))
            })
            .or_else(|| raw.status.as_ref().map(|s| s.clone_string()))
            .unwrap_or_else(|| "unknown".to_string());

        let merchant_reference = raw
            .payment
            .as_ref()
            .and_then(|p| p.references.as_ref())
            .and_then(|r| r.merchant_reference.clone())
            .or_else(|| {
                raw.payment
                    .as_ref()
                    .and_then(|p| p.payment_output.as_ref())
                    .and_then(|o| o.references.as_ref())
                    .and_then(|r| r.merchant_reference.clone())
            })
            .or(raw.merchant_reference);

        let order_id = merchant_reference.as_deref().and_then(parse_reference);

        Ok(Self {
            event_type: raw.event_type.unwrap_or_else(|| "unknown".to_string()),
            payment_status,
            merchant_reference,
            order_id,
        })
    }
}
