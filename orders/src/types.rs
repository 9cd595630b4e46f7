//! Order backend wire types.
//!
//! Orders carry their booking attributes as a flat key/value metadata list.
//! The typed accessors below are the only place those keys are read; empty
//! string values mean the field is absent.

use booking_core::lifecycle::{OrderLine, OrderSchedule, OrderStatus, OrderStatusEvent};
use booking_core::types::{ItemSlug, ItemType, OrderId, OrderLineId, SlotLabel};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata key holding the service slug.
pub const META_SERVICE_SLUG: &str = "service_slug";
/// Metadata key holding the subscription slug.
pub const META_SUBSCRIPTION_SLUG: &str = "subscription_slug";
/// Metadata key holding the item type.
pub const META_ITEM_TYPE: &str = "item_type";
/// Metadata key holding the booked date.
pub const META_SCHEDULED_DATE: &str = "scheduled_date";
/// Metadata key holding the booked slot.
pub const META_TIME_SLOT: &str = "time_slot";
/// Metadata key tagging orders that pay through the hosted gateway.
pub const META_PAYMENT_PROVIDER: &str = "payment_provider";
/// Value of [`META_PAYMENT_PROVIDER`] written by the checkout flow.
pub const PROVIDER_TAG: &str = "CAWL";

/// One key/value metadata entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetaDatum {
    /// Metadata key.
    pub key: String,
    /// Metadata value. The backend stores strings but echoes other JSON
    /// types back, so the value stays loosely typed.
    #[serde(default)]
    pub value: serde_json::Value,
}

impl MetaDatum {
    /// Builds a string-valued entry.
    #[must_use]
    pub fn text(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: serde_json::Value::String(value.into()),
        }
    }
}

/// One order line as the backend reports it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderLineItem {
    /// Backend line item id.
    #[serde(default)]
    pub id: Option<i64>,
    /// Product id, required when creating.
    #[serde(default)]
    pub product_id: Option<i64>,
    /// Quantity.
    #[serde(default)]
    pub quantity: u32,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Line total in major units, as the backend's decimal string.
    #[serde(default)]
    pub total: Option<String>,
}

/// An order as the backend reports it.
#[derive(Clone, Debug, Deserialize)]
pub struct Order {
    /// Order id.
    pub id: OrderId,
    /// Current status.
    pub status: OrderStatus,
    /// Creation time (UTC), when reported.
    #[serde(default, deserialize_with = "deserialize_gmt")]
    pub date_created_gmt: Option<DateTime<Utc>>,
    /// Line items.
    #[serde(default)]
    pub line_items: Vec<OrderLineItem>,
    /// Metadata entries.
    #[serde(default)]
    pub meta_data: Vec<MetaDatum>,
}

// The backend reports GMT timestamps without a zone suffix.
fn deserialize_gmt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
    }))
}

impl Order {
    /// Reads a metadata value as a non-empty string.
    #[must_use]
    pub fn meta_text(&self, key: &str) -> Option<&str> {
        self.meta_data
            .iter()
            .find(|entry| entry.key == key)
            .and_then(|entry| entry.value.as_str())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// True when the checkout flow tagged this order with the hosted
    /// payment provider.
    #[must_use]
    pub fn is_gateway_order(&self) -> bool {
        self.meta_text(META_PAYMENT_PROVIDER)
            .is_some_and(|value| value.eq_ignore_ascii_case(PROVIDER_TAG))
    }

    /// Extracts the booking schedule from order metadata.
    ///
    /// The slug follows the item type: subscriptions read
    /// `subscription_slug`, everything else reads `service_slug`, falling
    /// back to the other key when the preferred one is empty. Without an
    /// explicit `item_type`, the key the slug resolved from decides it.
    #[must_use]
    pub fn schedule(&self) -> OrderSchedule {
        let explicit_type = self.meta_text(META_ITEM_TYPE).and_then(ItemType::parse);

        let service = self.meta_text(META_SERVICE_SLUG);
        let subscription = self.meta_text(META_SUBSCRIPTION_SLUG);
        let slug = match explicit_type {
            Some(ItemType::Subscription) => subscription.or(service),
            _ => service.or(subscription),
        };

        let item_type = explicit_type.or(match (service, subscription) {
            (Some(_), _) => Some(ItemType::Service),
            (None, Some(_)) => Some(ItemType::Subscription),
            (None, None) => None,
        });

        OrderSchedule {
            item_type,
            item_slug: slug.map(ItemSlug::from),
            scheduled_date: self
                .meta_text(META_SCHEDULED_DATE)
                .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()),
            time_slot: self.meta_text(META_TIME_SLOT).and_then(SlotLabel::parse),
        }
    }

    /// Builds the lifecycle event for this order at `status`.
    #[must_use]
    pub fn status_event(&self, status: OrderStatus) -> OrderStatusEvent {
        OrderStatusEvent {
            order_id: self.id,
            status,
            lines: self
                .line_items
                .iter()
                .map(|line| OrderLine {
                    line_id: line.id.map(OrderLineId::new),
                    quantity: line.quantity,
                })
                .collect(),
            schedule: self.schedule(),
        }
    }
}

/// Billing contact for a new order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Billing {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
}

/// Payload for creating an order.
#[derive(Clone, Debug, Serialize)]
pub struct NewOrder {
    /// Initial status, `pending` for checkout orders.
    pub status: OrderStatus,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Always false; payment is confirmed by webhook.
    pub set_paid: bool,
    /// Billing contact.
    pub billing: Billing,
    /// Line items.
    pub line_items: Vec<OrderLineItem>,
    /// Metadata entries.
    pub meta_data: Vec<MetaDatum>,
}

/// Partial update payload.
#[derive(Clone, Debug, Default, Serialize)]
pub struct OrderUpdate {
    /// New status, when changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    /// Metadata entries to merge.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub meta_data: Vec<MetaDatum>,
}
