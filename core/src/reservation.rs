//! Reservation ledger rows.

use crate::types::{ItemSlug, ItemType, OrderId, OrderLineId, SlotLabel};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Status of a ledger row.
///
/// Rows are never hard-deleted by the normal flow: a released row stays in
/// the ledger but no longer counts toward occupancy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Counts toward occupancy.
    Active,
    /// Freed by a cancelled/failed/refunded order.
    Released,
}

impl ReservationStatus {
    /// Database string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Released => "released",
        }
    }

    /// Parse from the database string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "released" => Some(Self::Released),
            _ => None,
        }
    }
}

/// The ledger's atomic unit: capacity consumed by one order line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Owning order, immutable once set.
    pub order_id: OrderId,
    /// Line within the order; `None` for single-line orders. Uniqueness key
    /// together with `order_id`.
    pub order_line_id: Option<OrderLineId>,
    /// Kind of the booked item.
    pub item_type: ItemType,
    /// Slug of the booked item.
    pub item_slug: ItemSlug,
    /// Calendar date of the booking (no time of day).
    pub scheduled_date: NaiveDate,
    /// Booked slot; `None` means whole day.
    pub time_slot: Option<SlotLabel>,
    /// Booked quantity, at least 1.
    pub quantity: u32,
    /// Whether the row currently counts toward occupancy.
    pub status: ReservationStatus,
    /// When the row was first created.
    pub created_at: DateTime<Utc>,
    /// When the row was last upserted or released.
    pub updated_at: DateTime<Utc>,
}

/// Input of an idempotent ledger upsert.
///
/// Applying the same draft twice leaves exactly one active row behind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservationDraft {
    /// Owning order.
    pub order_id: OrderId,
    /// Line within the order, `None` for single-line orders.
    pub order_line_id: Option<OrderLineId>,
    /// Kind of the booked item.
    pub item_type: ItemType,
    /// Slug of the booked item.
    pub item_slug: ItemSlug,
    /// Calendar date of the booking.
    pub scheduled_date: NaiveDate,
    /// Booked slot, `None` for whole day.
    pub time_slot: Option<SlotLabel>,
    /// Booked quantity, at least 1.
    pub quantity: u32,
}
