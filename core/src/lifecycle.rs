//! Order lifecycle to reservation ledger bridge.
//!
//! Order status changes arrive from two directions (the commerce backend's
//! own status hooks and payment provider webhooks) and both funnel through
//! [`LifecycleManager::apply`]. Replays and crossed wires are harmless
//! because ledger upserts and releases are idempotent.

use crate::error::LedgerError;
use crate::ledger::ReservationLedger;
use crate::reservation::ReservationDraft;
use crate::types::{ItemSlug, ItemType, OrderId, OrderLineId, SlotLabel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Order status
// ============================================================================

/// Commerce order status, in its canonical kebab-case spelling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    /// Awaiting payment.
    Pending,
    /// Paid, work not yet delivered.
    Processing,
    /// Needs manual review.
    OnHold,
    /// Delivered.
    Completed,
    /// Cancelled before fulfilment.
    Cancelled,
    /// Payment failed.
    Failed,
    /// Money returned.
    Refunded,
}

/// What a status means for the reservation ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusBucket {
    /// Capacity is held: upsert active reservations.
    Committed,
    /// Capacity is freed: release the order's reservations.
    Released,
    /// Not yet paid; the ledger is untouched.
    Pending,
    /// Under review; the ledger is untouched.
    OnHold,
}

impl OrderStatus {
    /// Canonical kebab-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::OnHold => "on-hold",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Parses the canonical kebab-case name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "on-hold" => Some(Self::OnHold),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Ledger effect of this status.
    #[must_use]
    pub const fn bucket(self) -> StatusBucket {
        match self {
            Self::Processing | Self::Completed => StatusBucket::Committed,
            Self::Cancelled | Self::Failed | Self::Refunded => StatusBucket::Released,
            Self::Pending => StatusBucket::Pending,
            Self::OnHold => StatusBucket::OnHold,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Status events
// ============================================================================

/// One order line carrying reservable quantity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Backend line item id, when the backend assigns one.
    pub line_id: Option<OrderLineId>,
    /// Reserved quantity. Zero is normalized to one at apply time.
    pub quantity: u32,
}

/// Scheduling attributes attached to an order.
///
/// All fields are optional because orders created outside the booking flow
/// carry none of them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSchedule {
    /// Service or subscription.
    pub item_type: Option<ItemType>,
    /// Booked item slug.
    pub item_slug: Option<ItemSlug>,
    /// Booked date.
    pub scheduled_date: Option<NaiveDate>,
    /// Booked slot; `None` means the whole day.
    pub time_slot: Option<SlotLabel>,
}

impl OrderSchedule {
    /// True when the event carries enough data to write reservations.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.item_slug.is_some() && self.scheduled_date.is_some()
    }
}

/// An order status change with its scheduling payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusEvent {
    /// Commerce order id.
    pub order_id: OrderId,
    /// New status.
    pub status: OrderStatus,
    /// Reservable lines. May be empty.
    pub lines: Vec<OrderLine>,
    /// Scheduling attributes.
    pub schedule: OrderSchedule,
}

/// What [`LifecycleManager::apply`] did with an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// Active reservations written, one per line.
    Upserted(usize),
    /// Reservations released; carries the number of rows flipped.
    Released(u64),
    /// Committed status without slug or date. Nothing written.
    SkippedNoScheduleData,
    /// Pending or on-hold status. Nothing written.
    NoOp,
}

// ============================================================================
// Manager
// ============================================================================

/// Applies order status events to the reservation ledger.
#[derive(Clone)]
pub struct LifecycleManager {
    ledger: Arc<dyn ReservationLedger>,
}

impl LifecycleManager {
    /// Creates a manager over the given ledger.
    #[must_use]
    pub fn new(ledger: Arc<dyn ReservationLedger>) -> Self {
        Self { ledger }
    }

    /// Applies one status event.
    ///
    /// Committed statuses upsert one active reservation per line (an order
    /// without explicit lines counts as a single implicit line of quantity
    /// one). Released statuses free every active reservation of the order,
    /// including for orders the ledger never saw. Pending and on-hold leave
    /// the ledger untouched.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when the ledger write fails.
    pub async fn apply(&self, event: &OrderStatusEvent) -> Result<LifecycleOutcome, LedgerError> {
        match event.status.bucket() {
            StatusBucket::Committed => self.commit(event).await,
            StatusBucket::Released => {
                let released = self.ledger.release_order(event.order_id).await?;
                tracing::info!(
                    order_id = event.order_id.value(),
                    status = %event.status,
                    released,
                    "reservations released"
                );
                Ok(LifecycleOutcome::Released(released))
            }
            StatusBucket::Pending | StatusBucket::OnHold => Ok(LifecycleOutcome::NoOp),
        }
    }

    async fn commit(&self, event: &OrderStatusEvent) -> Result<LifecycleOutcome, LedgerError> {
        let (Some(item_slug), Some(scheduled_date)) = (
            event.schedule.item_slug.clone(),
            event.schedule.scheduled_date,
        ) else {
            tracing::info!(
                order_id = event.order_id.value(),
                status = %event.status,
                "order has no scheduling data, nothing to reserve"
            );
            return Ok(LifecycleOutcome::SkippedNoScheduleData);
        };

        let item_type = event.schedule.item_type.unwrap_or(ItemType::Service);

        let implicit_line = [OrderLine {
            line_id: None,
            quantity: 1,
        }];
        let lines: &[OrderLine] = if event.lines.is_empty() {
            &implicit_line
        } else {
            &event.lines
        };

        for line in lines {
            let draft = ReservationDraft {
                order_id: event.order_id,
                order_line_id: line.line_id,
                item_type,
                item_slug: item_slug.clone(),
                scheduled_date,
                time_slot: event.schedule.time_slot.clone(),
                quantity: line.quantity.max(1),
            };
            self.ledger.upsert(draft).await?;
        }

        tracing::info!(
            order_id = event.order_id.value(),
            status = %event.status,
            lines = lines.len(),
            item_slug = %item_slug,
            "reservations committed"
        );
        Ok(LifecycleOutcome::Upserted(lines.len()))
    }
}
